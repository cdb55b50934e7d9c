//! Native WebSocket channel.
//!
//! Runs the socket on a background thread so the engines never block:
//! commands go in through one mpsc channel, events come back through
//! another and are drained with `poll_events`.

use crate::{ChannelEvent, ClientEnvelope, ConnectionState, EventChannel, ServerEnvelope, SyncError};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tungstenite::{connect, Message};
use url::Url;

enum WsCommand {
    Send(String),
    Close,
}

/// WebSocket-backed [`EventChannel`].
pub struct NativeSocket {
    url: String,
    state: ConnectionState,
    events: Vec<ChannelEvent>,
    cmd_tx: Option<Sender<WsCommand>>,
    event_rx: Option<Receiver<ChannelEvent>>,
    _thread: Option<JoinHandle<()>>,
}

impl NativeSocket {
    /// Connect to a `ws://` or `wss://` endpoint.
    pub fn connect(url: &str) -> Result<Self, SyncError> {
        let parsed = Url::parse(url).map_err(|e| SyncError::InvalidUrl(e.to_string()))?;
        if parsed.scheme() != "ws" && parsed.scheme() != "wss" {
            return Err(SyncError::InvalidUrl(format!(
                "unsupported scheme: {}",
                parsed.scheme()
            )));
        }

        let mut socket = Self {
            url: url.to_string(),
            state: ConnectionState::Disconnected,
            events: Vec::new(),
            cmd_tx: None,
            event_rx: None,
            _thread: None,
        };
        socket.spawn_thread();
        Ok(socket)
    }

    fn spawn_thread(&mut self) {
        let (cmd_tx, cmd_rx) = channel::<WsCommand>();
        let (event_tx, event_rx) = channel::<ChannelEvent>();
        let url = self.url.clone();

        let handle = thread::spawn(move || run_socket(&url, cmd_rx, event_tx));

        self.state = ConnectionState::Connecting;
        self.cmd_tx = Some(cmd_tx);
        self.event_rx = Some(event_rx);
        self._thread = Some(handle);
    }

    /// Close the connection and stop the background thread.
    pub fn disconnect(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(WsCommand::Close);
        }
        self.event_rx = None;
        self._thread = None;
        self.state = ConnectionState::Disconnected;
    }
}

impl EventChannel for NativeSocket {
    fn send(&mut self, envelope: &ClientEnvelope) -> Result<(), SyncError> {
        let json = serde_json::to_string(envelope).map_err(|e| SyncError::Send(e.to_string()))?;
        match &self.cmd_tx {
            Some(tx) => tx
                .send(WsCommand::Send(json))
                .map_err(|e| SyncError::Send(e.to_string())),
            None => Err(SyncError::NotConnected),
        }
    }

    fn poll_events(&mut self) -> Vec<ChannelEvent> {
        if let Some(rx) = &self.event_rx {
            loop {
                match rx.try_recv() {
                    Ok(event) => {
                        match &event {
                            ChannelEvent::Connected => self.state = ConnectionState::Connected,
                            ChannelEvent::Disconnected => {
                                self.state = ConnectionState::Disconnected
                            }
                            ChannelEvent::Error { .. } => self.state = ConnectionState::Error,
                            _ => {}
                        }
                        self.events.push(event);
                    }
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                }
            }
        }
        std::mem::take(&mut self.events)
    }

    fn reconnect(&mut self) -> Result<(), SyncError> {
        log::info!("reconnecting to {}", self.url);
        self.disconnect();
        self.spawn_thread();
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}

impl Drop for NativeSocket {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Background thread body: connect, then shuttle frames until closed.
fn run_socket(url: &str, cmd_rx: Receiver<WsCommand>, event_tx: Sender<ChannelEvent>) {
    let (mut socket, response) = match connect(url) {
        Ok(ok) => ok,
        Err(e) => {
            log::error!("websocket connect to {url} failed: {e}");
            let _ = event_tx.send(ChannelEvent::Error {
                message: format!("connect failed: {e}"),
            });
            return;
        }
    };
    log::info!("websocket connected, status {}", response.status());
    let _ = event_tx.send(ChannelEvent::Connected);

    // A short read timeout keeps the loop responsive to outbound commands.
    if let tungstenite::stream::MaybeTlsStream::Plain(tcp) = socket.get_mut() {
        let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
        let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
    }

    loop {
        match cmd_rx.try_recv() {
            Ok(WsCommand::Send(json)) => {
                if let Err(e) = socket.send(Message::Text(json)) {
                    log::error!("websocket send error: {e}");
                    break;
                }
            }
            Ok(WsCommand::Close) | Err(TryRecvError::Disconnected) => {
                let _ = socket.close(None);
                break;
            }
            Err(TryRecvError::Empty) => {}
        }

        match socket.read() {
            Ok(Message::Text(text)) => match serde_json::from_str::<ServerEnvelope>(&text) {
                Ok(envelope) => {
                    let _ = event_tx.send(ChannelEvent::Message(envelope));
                }
                Err(e) => log::warn!("unparseable server message ({e}): {text}"),
            },
            Ok(Message::Ping(data)) => {
                let _ = socket.send(Message::Pong(data));
                let _ = event_tx.send(ChannelEvent::Ping);
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(e) => {
                log::error!("websocket read error: {e}");
                break;
            }
        }
    }

    let _ = event_tx.send(ChannelEvent::Disconnected);
}
