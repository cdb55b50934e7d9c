//! Wire types for the two socket namespaces.
//!
//! The server totally orders every mutation to a text document and stamps
//! it with a strictly increasing `mod_id`. Whiteboard events carry no
//! sequence number: they are keyed by globally unique element ids and the
//! server relays them without echoing back to the sender.

use serde::{Deserialize, Serialize};

/// Server-assigned user identifier. The server uses `-1` as the origin of
/// events it synthesises itself (for example the property replay after
/// `connected`), which never collides with a real user.
pub type UserId = i64;

/// Server-assigned modification sequence number.
pub type ModId = i64;

/// Messages the text namespace delivers to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextServerMessage {
    /// Handshake: the assigned user id and a full snapshot of the content.
    Connected {
        userid: UserId,
        content: String,
        mod_id: ModId,
    },
    /// A participant left; their cursor should be dropped.
    UserDisconnected { userid: UserId },
    /// Transport keepalive; the client may piggyback its mod id reference.
    Ping,
    #[serde(rename = "add_region")]
    Insert {
        text: String,
        position: usize,
        userid: UserId,
        mod_id: ModId,
    },
    #[serde(rename = "remove_region")]
    Remove {
        start: usize,
        end: usize,
        userid: UserId,
        mod_id: ModId,
    },
    AddProperty {
        start: usize,
        end: usize,
        property: String,
        flag: Option<String>,
        userid: UserId,
        mod_id: ModId,
    },
    RemoveProperty {
        start: usize,
        end: usize,
        property: String,
        userid: UserId,
        mod_id: ModId,
    },
    CursorMoved {
        position: usize,
        userid: UserId,
        username: String,
        mod_id: ModId,
    },
}

impl TextServerMessage {
    /// The sequence number, for mutation events.
    pub fn mod_id(&self) -> Option<ModId> {
        match self {
            TextServerMessage::Insert { mod_id, .. }
            | TextServerMessage::Remove { mod_id, .. }
            | TextServerMessage::AddProperty { mod_id, .. }
            | TextServerMessage::RemoveProperty { mod_id, .. }
            | TextServerMessage::CursorMoved { mod_id, .. } => Some(*mod_id),
            _ => None,
        }
    }

    /// The originating user, for mutation events.
    pub fn userid(&self) -> Option<UserId> {
        match self {
            TextServerMessage::Insert { userid, .. }
            | TextServerMessage::Remove { userid, .. }
            | TextServerMessage::AddProperty { userid, .. }
            | TextServerMessage::RemoveProperty { userid, .. }
            | TextServerMessage::CursorMoved { userid, .. } => Some(*userid),
            _ => None,
        }
    }
}

/// Messages the client emits on the text namespace. Every mutation carries
/// the newest `mod_id` the client has observed; the server treats it as
/// advisory and keeps its own total order authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextClientMessage {
    #[serde(rename = "add_region")]
    Insert {
        text: String,
        position: usize,
        last_mod_id: ModId,
    },
    #[serde(rename = "remove_region")]
    Remove {
        start: usize,
        end: usize,
        last_mod_id: ModId,
    },
    AddProperty {
        start: usize,
        end: usize,
        property: String,
        flag: Option<String>,
        last_mod_id: ModId,
    },
    RemoveProperty {
        start: usize,
        end: usize,
        property: String,
        last_mod_id: ModId,
    },
    CursorMoved {
        position: usize,
        last_mod_id: ModId,
    },
    /// Heartbeat acknowledgement of the newest observed mod id, sent when a
    /// ping finds the reference dirty.
    UpdateLastModId { last_mod_id: ModId },
}

/// Whiteboard namespace messages, symmetric between client and server.
/// All five are idempotent and commute under the server's relay order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardMessage {
    /// Create a stroked polyline element.
    Draw { id: String, d: String },
    /// Remove an element (and, for groups, every descendant).
    Remove { id: String },
    /// Replace the vertex list of an existing path.
    Edit { id: String, d: String },
    /// Collect existing top-level elements into a new group.
    Group {
        group_id: String,
        #[serde(rename = "children_ids")]
        children: Vec<String>,
    },
    /// Dissolve a group back into top-level elements.
    Ungroup { group_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_roundtrip() {
        let msg = TextServerMessage::Insert {
            text: "hi".to_string(),
            position: 3,
            userid: 2,
            mod_id: 17,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"add_region\""));
        let back: TextServerMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_mutation_metadata() {
        let msg = TextServerMessage::CursorMoved {
            position: 0,
            userid: 4,
            username: "ada".to_string(),
            mod_id: 9,
        };
        assert_eq!(msg.mod_id(), Some(9));
        assert_eq!(msg.userid(), Some(4));
        assert_eq!(TextServerMessage::Ping.mod_id(), None);
    }

    #[test]
    fn test_flag_serializes_as_null() {
        let msg = TextClientMessage::AddProperty {
            start: 0,
            end: 2,
            property: "bold".to_string(),
            flag: None,
            last_mod_id: 1,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"flag\":null"));
    }

    #[test]
    fn test_board_message_roundtrip() {
        let msg = BoardMessage::Group {
            group_id: "draw-ab-3".to_string(),
            children: vec!["draw-ab-1".to_string(), "draw-ab-2".to_string()],
        };
        let json = serde_json::to_string(&msg).unwrap();
        let back: BoardMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
