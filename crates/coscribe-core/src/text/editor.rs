//! The dual-replica text editor engine.
//!
//! The editor keeps two full copies of the document: the live replica the
//! user sees (optimistic, includes unconfirmed local edits) and a shadow
//! replica that only ever reflects server-confirmed state. The two differ
//! exactly by the contents of the pending queue; whenever a remote
//! operation lands, the live replica is discarded, rebuilt from the shadow
//! and the pending queue is replayed with rebased coordinates.

use crate::protocol::{ModId, TextClientMessage, TextServerMessage, UserId};
use crate::text::buffer::Buffer;
use crate::text::cursors::CursorTable;
use crate::text::pending::PendingOp;
use crate::text::properties::PropertyTable;
use crate::text::render::render_markup;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One complete copy of the shared document state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replica {
    pub content: Buffer,
    pub cursors: CursorTable,
    pub properties: PropertyTable,
}

impl Replica {
    fn from_content(content: &str) -> Self {
        Self {
            content: Buffer::from_str(content),
            cursors: CursorTable::new(),
            properties: PropertyTable::new(),
        }
    }

    /// Splice text in, shifting every fixed point strictly after the
    /// insertion position.
    pub fn insert(&mut self, position: usize, text: &str) {
        let len = text.chars().count();
        self.cursors
            .shift_positions(|p| if p > position { p + len } else { p });
        self.properties
            .shift_positions(|p| if p > position { p + len } else { p });
        self.content.insert(position, text);
    }

    /// Splice a range out, pulling every fixed point after `start` back by
    /// the amount of removed text it trailed.
    pub fn remove(&mut self, start: usize, end: usize) {
        self.cursors
            .shift_positions(|p| if p > start { p - (end.min(p) - start) } else { p });
        self.properties
            .shift_positions(|p| if p > start { p - (end.min(p) - start) } else { p });
        self.properties.prune();
        self.content.remove(start, end);
    }
}

/// Snapshot of content plus styling, the unit the server persists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDocument {
    pub content: String,
    pub properties: PropertyTable,
}

impl TextDocument {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// The collaborative text editor engine.
pub struct TextEditor {
    live: Replica,
    shadow: Replica,
    pending: VecDeque<PendingOp>,
    outgoing: Vec<TextClientMessage>,
    /// Newest server-assigned sequence number observed.
    last_mod_id: ModId,
    /// Set when `last_mod_id` moved without us emitting a mutation; the
    /// next ping pays the debt with an `update_last_mod_id`.
    mod_id_dirty: bool,
    user_id: Option<UserId>,
    read_only: bool,
    /// Raised on echo mismatch: the engine stops mutating and waits for a
    /// reconnect to deliver a fresh snapshot.
    needs_resync: bool,
    needs_render: bool,
}

impl TextEditor {
    pub fn new(read_only: bool) -> Self {
        Self {
            live: Replica::default(),
            shadow: Replica::default(),
            pending: VecDeque::new(),
            outgoing: Vec::new(),
            last_mod_id: -1,
            mod_id_dirty: false,
            user_id: None,
            read_only,
            needs_resync: false,
            needs_render: false,
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn content(&self) -> &str {
        self.live.content.as_str()
    }

    pub fn server_content(&self) -> &str {
        self.shadow.content.as_str()
    }

    pub fn live(&self) -> &Replica {
        &self.live
    }

    pub fn shadow(&self) -> &Replica {
        &self.shadow
    }

    pub fn last_mod_id(&self) -> ModId {
        self.last_mod_id
    }

    pub fn pending_ops(&self) -> &VecDeque<PendingOp> {
        &self.pending
    }

    /// True when an echo mismatch froze the engine; the transport should
    /// reconnect for a fresh snapshot.
    pub fn needs_resync(&self) -> bool {
        self.needs_resync
    }

    /// Drain the outbound message queue.
    pub fn take_outgoing(&mut self) -> Vec<TextClientMessage> {
        std::mem::take(&mut self.outgoing)
    }

    /// Render the live replica if anything changed since the last call.
    pub fn take_render(&mut self) -> Option<String> {
        if self.needs_render {
            self.needs_render = false;
            Some(self.render())
        } else {
            None
        }
    }

    pub fn render(&self) -> String {
        render_markup(&self.live)
    }

    /// Snapshot the live content and styling.
    pub fn document(&self) -> TextDocument {
        TextDocument {
            content: self.live.content.as_str().to_string(),
            properties: self.live.properties.clone(),
        }
    }

    fn can_edit(&self) -> bool {
        !self.read_only && self.user_id.is_some() && !self.needs_resync
    }

    // --- Local operations ---

    /// Insert text at a char position, optimistically and on the wire.
    pub fn insert(&mut self, text: &str, position: usize) {
        if !self.can_edit() {
            return;
        }
        let len = self.live.content.len();
        debug_assert!(position <= len, "insert position {position} out of bounds");
        if position > len {
            log::warn!("ignoring insert at {position} beyond content length {len}");
            return;
        }

        let text = text.replace('\r', "");
        let text_len = text.chars().count();
        let cursor_before = self.user_id.and_then(|id| self.live.cursors.position(id));

        self.pending.push_back(PendingOp::Insert {
            position,
            text: text.clone(),
        });
        self.outgoing.push(TextClientMessage::Insert {
            text: text.clone(),
            position,
            last_mod_id: self.last_mod_id,
        });
        self.mod_id_dirty = false;
        self.live.insert(position, &text);

        // A cursor sitting exactly at the insertion point is not shifted by
        // the strict fixed-point rule; advancing it is its own cursor move.
        if cursor_before == Some(position) {
            self.move_cursor(position + text_len);
        } else {
            self.needs_render = true;
        }
    }

    /// Remove the half-open char range `[start, end)`.
    pub fn remove(&mut self, start: usize, end: usize) {
        if !self.can_edit() {
            return;
        }
        let len = self.live.content.len();
        debug_assert!(start <= end && end <= len, "remove range {start}..{end} out of bounds");
        if start > end || end > len {
            log::warn!("ignoring remove of invalid range {start}..{end}");
            return;
        }

        self.pending.push_back(PendingOp::Remove { start, end });
        self.outgoing.push(TextClientMessage::Remove {
            start,
            end,
            last_mod_id: self.last_mod_id,
        });
        self.mod_id_dirty = false;
        self.live.remove(start, end);
        self.needs_render = true;
    }

    /// Move the local cursor.
    pub fn move_cursor(&mut self, position: usize) {
        if !self.can_edit() {
            return;
        }
        let len = self.live.content.len();
        debug_assert!(position <= len, "cursor position {position} out of bounds");
        if position > len {
            log::warn!("ignoring cursor move to {position} beyond content length {len}");
            return;
        }

        self.pending.push_back(PendingOp::Cursor { position });
        if let Some(id) = self.user_id {
            self.live.cursors.set_local(id, position);
        }
        self.outgoing.push(TextClientMessage::CursorMoved {
            position,
            last_mod_id: self.last_mod_id,
        });
        self.mod_id_dirty = false;
        self.needs_render = true;
    }

    /// Toggle a property over `[start, end)`: if a single existing span of
    /// the same (property, flag) fully covers the range the property is
    /// removed there, otherwise it is applied.
    pub fn toggle_property(&mut self, start: usize, end: usize, property: &str, flag: Option<&str>) {
        if !self.can_edit() {
            return;
        }
        let len = self.live.content.len();
        debug_assert!(start <= end && end <= len, "property range {start}..{end} out of bounds");
        if start > end || end > len {
            log::warn!("ignoring property toggle on invalid range {start}..{end}");
            return;
        }

        if self.live.properties.is_covered(start, end, property, flag) {
            self.pending.push_back(PendingOp::RemoveProperty {
                start,
                end,
                property: property.to_string(),
            });
            self.outgoing.push(TextClientMessage::RemoveProperty {
                start,
                end,
                property: property.to_string(),
                last_mod_id: self.last_mod_id,
            });
            self.live.properties.remove(start, end, property);
        } else {
            self.pending.push_back(PendingOp::AddProperty {
                start,
                end,
                property: property.to_string(),
                flag: flag.map(str::to_string),
            });
            self.outgoing.push(TextClientMessage::AddProperty {
                start,
                end,
                property: property.to_string(),
                flag: flag.map(str::to_string),
                last_mod_id: self.last_mod_id,
            });
            self.live.properties.add(start, end, property, flag);
        }
        self.mod_id_dirty = false;
        self.needs_render = true;
    }

    // --- Inbound events ---

    pub fn handle_message(&mut self, msg: TextServerMessage) {
        match msg {
            TextServerMessage::Connected {
                userid,
                content,
                mod_id,
            } => self.initialise(userid, &content, mod_id),
            TextServerMessage::UserDisconnected { userid } => {
                self.live.cursors.remove(userid);
                self.shadow.cursors.remove(userid);
                self.needs_render = true;
            }
            TextServerMessage::Ping => {
                if self.mod_id_dirty {
                    self.outgoing.push(TextClientMessage::UpdateLastModId {
                        last_mod_id: self.last_mod_id,
                    });
                    self.mod_id_dirty = false;
                }
            }
            mutation => self.apply_mutation(mutation),
        }
    }

    fn initialise(&mut self, userid: UserId, content: &str, mod_id: ModId) {
        self.user_id = Some(userid);
        self.shadow = Replica::from_content(content);
        if !self.read_only {
            self.shadow.cursors.set_local(userid, 0);
        }
        self.live = self.shadow.clone();
        self.pending.clear();
        // Anything unacknowledged at reconnect time is lost; the snapshot
        // is the new truth.
        self.outgoing.clear();
        self.last_mod_id = mod_id;
        self.mod_id_dirty = false;
        self.needs_resync = false;
        self.needs_render = true;
        log::debug!("connected as user {userid}, snapshot at mod {mod_id}");
    }

    fn apply_mutation(&mut self, msg: TextServerMessage) {
        if self.needs_resync {
            return;
        }
        let Some(userid) = self.user_id else {
            log::warn!("dropping mutation received before the connect handshake");
            return;
        };
        let (mod_id, origin) = match (msg.mod_id(), msg.userid()) {
            (Some(m), Some(o)) => (m, o),
            _ => return,
        };

        self.last_mod_id = mod_id;
        self.mod_id_dirty = true;

        Self::apply_authoritative(&mut self.shadow, &msg, self.user_id);

        if origin == userid {
            // The server echoed one of our own operations back.
            match self.pending.pop_front() {
                Some(op) if op.matches_echo(&msg) => {}
                Some(op) => {
                    log::error!("echo mismatch: expected {op:?}, got {msg:?}");
                    self.needs_resync = true;
                }
                None => {
                    log::error!("echo {msg:?} arrived with an empty pending queue");
                    self.needs_resync = true;
                }
            }
        } else {
            // A remote operation: discard the optimistic state, rebase the
            // pending queue past the remote op and replay it.
            self.live = self.shadow.clone();
            match &msg {
                TextServerMessage::Insert { text, position, .. } => {
                    let len = text.chars().count();
                    for op in self.pending.iter_mut() {
                        op.rebase_insert(*position, len);
                    }
                }
                TextServerMessage::Remove { start, end, .. } => {
                    for op in self.pending.iter_mut() {
                        op.rebase_remove(*start, *end);
                    }
                }
                _ => {}
            }
            for op in self.pending.iter() {
                apply_pending(&mut self.live, op, userid);
            }
        }
        self.needs_render = true;
    }

    fn apply_authoritative(replica: &mut Replica, msg: &TextServerMessage, own_id: Option<UserId>) {
        match msg {
            TextServerMessage::Insert { text, position, .. } => replica.insert(*position, text),
            TextServerMessage::Remove { start, end, .. } => replica.remove(*start, *end),
            TextServerMessage::AddProperty {
                start,
                end,
                property,
                flag,
                ..
            } => replica.properties.add(*start, *end, property, flag.as_deref()),
            TextServerMessage::RemoveProperty {
                start,
                end,
                property,
                ..
            } => replica.properties.remove(*start, *end, property),
            TextServerMessage::CursorMoved {
                position,
                userid,
                username,
                ..
            } => {
                if Some(*userid) == own_id {
                    replica.cursors.set_local(*userid, *position);
                } else {
                    replica.cursors.set_remote(*userid, *position, username);
                }
            }
            _ => {}
        }
    }
}

/// Re-apply one pending op to the live replica after a rebuild.
fn apply_pending(replica: &mut Replica, op: &PendingOp, own_id: UserId) {
    match op {
        PendingOp::Insert { position, text } => replica.insert(*position, text),
        PendingOp::Remove { start, end } => replica.remove(*start, *end),
        PendingOp::AddProperty {
            start,
            end,
            property,
            flag,
        } => replica.properties.add(*start, *end, property, flag.as_deref()),
        PendingOp::RemoveProperty {
            start,
            end,
            property,
        } => replica.properties.remove(*start, *end, property),
        PendingOp::Cursor { position } => replica.cursors.set_local(own_id, *position),
    }
}
