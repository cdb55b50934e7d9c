//! Session wiring between a channel and the two engines.

use crate::{ChannelEvent, ClientEnvelope, EventChannel, ServerEnvelope, SyncError};
use coscribe_core::protocol::TextServerMessage;
use coscribe_core::text::TextEditor;
use coscribe_core::whiteboard::Whiteboard;

/// One open workspace: a text editor and a whiteboard sharing a channel.
///
/// `pump` is the only moving part: call it from the UI loop to route
/// inbound events into the engines and flush their outboxes back out.
pub struct Session<C: EventChannel> {
    channel: C,
    editor: TextEditor,
    board: Whiteboard,
    /// Set once a resync reconnect has been issued, so a frozen editor
    /// does not trigger one per pump.
    resync_requested: bool,
}

impl<C: EventChannel> Session<C> {
    pub fn new(channel: C, read_only: bool) -> Self {
        Self {
            channel,
            editor: TextEditor::new(read_only),
            board: Whiteboard::new(read_only),
            resync_requested: false,
        }
    }

    pub fn editor(&self) -> &TextEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut TextEditor {
        &mut self.editor
    }

    pub fn board(&self) -> &Whiteboard {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Whiteboard {
        &mut self.board
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Route inbound events and flush outbound messages once.
    pub fn pump(&mut self) -> Result<(), SyncError> {
        for event in self.channel.poll_events() {
            match event {
                ChannelEvent::Message(ServerEnvelope::Text(msg)) => {
                    self.editor.handle_message(msg)
                }
                ChannelEvent::Message(ServerEnvelope::Whiteboard(msg)) => {
                    self.board.handle_message(msg)
                }
                ChannelEvent::Ping => self.editor.handle_message(TextServerMessage::Ping),
                ChannelEvent::Connected | ChannelEvent::Disconnected => {}
                ChannelEvent::Error { message } => log::warn!("channel error: {message}"),
            }
        }

        // A frozen editor needs a fresh snapshot; the reconnect handshake
        // delivers one and reinitialises it.
        if self.editor.needs_resync() {
            if !self.resync_requested {
                self.resync_requested = true;
                self.channel.reconnect()?;
            }
        } else {
            self.resync_requested = false;
        }

        for msg in self.editor.take_outgoing() {
            self.channel.send(&ClientEnvelope::Text(msg))?;
        }
        for msg in self.board.take_outgoing() {
            self.channel.send(&ClientEnvelope::Whiteboard(msg))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConnectionState;
    use coscribe_core::protocol::{BoardMessage, TextClientMessage};
    use coscribe_core::whiteboard::{Modifiers, ToolKind};
    use kurbo::Point;
    use std::collections::VecDeque;

    /// In-memory channel for driving a session without a network.
    #[derive(Default)]
    struct FakeChannel {
        inbound: VecDeque<ChannelEvent>,
        sent: Vec<ClientEnvelope>,
        reconnects: usize,
    }

    impl EventChannel for FakeChannel {
        fn send(&mut self, envelope: &ClientEnvelope) -> Result<(), SyncError> {
            self.sent.push(envelope.clone());
            Ok(())
        }

        fn poll_events(&mut self) -> Vec<ChannelEvent> {
            self.inbound.drain(..).collect()
        }

        fn reconnect(&mut self) -> Result<(), SyncError> {
            self.reconnects += 1;
            Ok(())
        }

        fn state(&self) -> ConnectionState {
            ConnectionState::Connected
        }
    }

    fn connected_session() -> Session<FakeChannel> {
        let mut channel = FakeChannel::default();
        channel
            .inbound
            .push_back(ChannelEvent::Message(ServerEnvelope::Text(
                TextServerMessage::Connected {
                    userid: 0,
                    content: "abc".to_string(),
                    mod_id: 1,
                },
            )));
        let mut session = Session::new(channel, false);
        session.pump().unwrap();
        session.channel.sent.clear();
        session
    }

    #[test]
    fn test_handshake_initialises_editor() {
        let session = connected_session();
        assert_eq!(session.editor().user_id(), Some(0));
        assert_eq!(session.editor().content(), "abc");
    }

    #[test]
    fn test_local_edit_is_flushed() {
        let mut session = connected_session();
        session.editor_mut().insert("X", 0);
        session.pump().unwrap();

        assert_eq!(
            session.channel.sent,
            vec![ClientEnvelope::Text(TextClientMessage::Insert {
                text: "X".to_string(),
                position: 0,
                last_mod_id: 1,
            })]
        );
    }

    #[test]
    fn test_inbound_routing_by_namespace() {
        let mut session = connected_session();
        session
            .channel
            .inbound
            .push_back(ChannelEvent::Message(ServerEnvelope::Text(
                TextServerMessage::Insert {
                    text: "!".to_string(),
                    position: 3,
                    userid: 5,
                    mod_id: 2,
                },
            )));
        session
            .channel
            .inbound
            .push_back(ChannelEvent::Message(ServerEnvelope::Whiteboard(
                BoardMessage::Draw {
                    id: "draw-x-1".to_string(),
                    d: "M 0 0 L 1 1".to_string(),
                },
            )));
        session.pump().unwrap();

        assert_eq!(session.editor().content(), "abc!");
        assert!(session.board().scene().contains("draw-x-1"));
    }

    #[test]
    fn test_transport_ping_reaches_editor() {
        let mut session = connected_session();
        session
            .channel
            .inbound
            .push_back(ChannelEvent::Message(ServerEnvelope::Text(
                TextServerMessage::Insert {
                    text: "!".to_string(),
                    position: 3,
                    userid: 5,
                    mod_id: 2,
                },
            )));
        session.channel.inbound.push_back(ChannelEvent::Ping);
        session.pump().unwrap();

        assert_eq!(
            session.channel.sent,
            vec![ClientEnvelope::Text(TextClientMessage::UpdateLastModId {
                last_mod_id: 2
            })]
        );
    }

    #[test]
    fn test_board_events_are_flushed() {
        let mut session = connected_session();
        session.board_mut().set_tool(ToolKind::Pen);
        session
            .board_mut()
            .pointer_down(Point::new(0.0, 0.0), Modifiers::default());
        session.board_mut().pointer_up(Point::new(4.0, 4.0));
        session.pump().unwrap();

        assert_eq!(session.channel.sent.len(), 1);
        assert!(matches!(
            session.channel.sent[0],
            ClientEnvelope::Whiteboard(BoardMessage::Draw { .. })
        ));
    }

    #[test]
    fn test_echo_mismatch_reconnects_once() {
        let mut session = connected_session();
        session.editor_mut().insert("X", 0);
        session.pump().unwrap();

        session
            .channel
            .inbound
            .push_back(ChannelEvent::Message(ServerEnvelope::Text(
                TextServerMessage::Insert {
                    text: "WRONG".to_string(),
                    position: 0,
                    userid: 0,
                    mod_id: 2,
                },
            )));
        session.pump().unwrap();
        session.pump().unwrap();
        assert_eq!(session.channel.reconnects, 1);

        // The fresh snapshot clears the freeze.
        session
            .channel
            .inbound
            .push_back(ChannelEvent::Message(ServerEnvelope::Text(
                TextServerMessage::Connected {
                    userid: 0,
                    content: "fresh".to_string(),
                    mod_id: 9,
                },
            )));
        session.pump().unwrap();
        assert!(!session.editor().needs_resync());
        assert_eq!(session.editor().content(), "fresh");
    }
}
