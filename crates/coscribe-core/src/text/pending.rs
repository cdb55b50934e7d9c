//! The queue of local operations awaiting their server echo.

use crate::protocol::TextServerMessage;
use serde::{Deserialize, Serialize};

/// A local operation applied optimistically but not yet confirmed.
///
/// The queue is strictly FIFO: the server echoes a peer's own operations
/// in emission order, so only the head is ever popped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingOp {
    Insert { position: usize, text: String },
    Remove { start: usize, end: usize },
    AddProperty {
        start: usize,
        end: usize,
        property: String,
        flag: Option<String>,
    },
    RemoveProperty {
        start: usize,
        end: usize,
        property: String,
    },
    Cursor { position: usize },
}

/// The fixed-point rule for a removal of `[s, e)`.
fn shift_for_remove(p: usize, s: usize, e: usize) -> usize {
    if p > s {
        p - (e.min(p) - s)
    } else {
        p
    }
}

impl PendingOp {
    /// Rebase this op's coordinates as if a remote insertion of `len` chars
    /// at `at` had happened before it.
    ///
    /// Anchors (insert position, cursor) shift only when strictly after the
    /// insertion point; range right edges shift on equality too, so a
    /// property keeps its right edge when text lands exactly there.
    pub fn rebase_insert(&mut self, at: usize, len: usize) {
        match self {
            PendingOp::Insert { position, .. } | PendingOp::Cursor { position } => {
                if *position > at {
                    *position += len;
                }
            }
            PendingOp::Remove { start, end }
            | PendingOp::AddProperty { start, end, .. }
            | PendingOp::RemoveProperty { start, end, .. } => {
                if at < *start {
                    *start += len;
                }
                if at <= *end {
                    *end += len;
                }
            }
        }
    }

    /// Rebase this op's coordinates as if a remote removal of `[s, e)` had
    /// happened before it. Ranges may collapse to empty; they stay in the
    /// queue (the echo still has to be matched) and their application is a
    /// no-op.
    pub fn rebase_remove(&mut self, s: usize, e: usize) {
        match self {
            PendingOp::Insert { position, .. } | PendingOp::Cursor { position } => {
                *position = shift_for_remove(*position, s, e);
            }
            PendingOp::Remove { start, end }
            | PendingOp::AddProperty { start, end, .. }
            | PendingOp::RemoveProperty { start, end, .. } => {
                *start = shift_for_remove(*start, s, e);
                *end = shift_for_remove(*end, s, e);
            }
        }
    }

    /// Check that a server echo matches this op by kind and payload.
    pub fn matches_echo(&self, msg: &TextServerMessage) -> bool {
        match (self, msg) {
            (
                PendingOp::Insert { position, text },
                TextServerMessage::Insert {
                    text: e_text,
                    position: e_position,
                    ..
                },
            ) => position == e_position && text == e_text,
            (
                PendingOp::Remove { start, end },
                TextServerMessage::Remove {
                    start: e_start,
                    end: e_end,
                    ..
                },
            ) => start == e_start && end == e_end,
            (
                PendingOp::AddProperty {
                    start,
                    end,
                    property,
                    flag,
                },
                TextServerMessage::AddProperty {
                    start: e_start,
                    end: e_end,
                    property: e_property,
                    flag: e_flag,
                    ..
                },
            ) => start == e_start && end == e_end && property == e_property && flag == e_flag,
            (
                PendingOp::RemoveProperty {
                    start,
                    end,
                    property,
                },
                TextServerMessage::RemoveProperty {
                    start: e_start,
                    end: e_end,
                    property: e_property,
                    ..
                },
            ) => start == e_start && end == e_end && property == e_property,
            (
                PendingOp::Cursor { position },
                TextServerMessage::CursorMoved {
                    position: e_position,
                    ..
                },
            ) => position == e_position,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_anchor_shifts_strictly() {
        let mut op = PendingOp::Insert {
            position: 3,
            text: "X".to_string(),
        };
        op.rebase_insert(3, 2);
        assert_eq!(op, PendingOp::Insert { position: 3, text: "X".to_string() });
        op.rebase_insert(2, 2);
        assert_eq!(op, PendingOp::Insert { position: 5, text: "X".to_string() });
    }

    #[test]
    fn test_range_right_edge_shifts_on_equality() {
        let mut op = PendingOp::AddProperty {
            start: 2,
            end: 5,
            property: "bold".to_string(),
            flag: None,
        };
        op.rebase_insert(5, 3);
        match op {
            PendingOp::AddProperty { start, end, .. } => {
                assert_eq!(start, 2);
                assert_eq!(end, 8);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_range_left_edge_strict() {
        let mut op = PendingOp::Remove { start: 2, end: 5 };
        op.rebase_insert(2, 3);
        assert_eq!(op, PendingOp::Remove { start: 2, end: 8 });
    }

    #[test]
    fn test_rebase_against_remove() {
        let mut op = PendingOp::Cursor { position: 6 };
        op.rebase_remove(1, 4);
        assert_eq!(op, PendingOp::Cursor { position: 3 });

        // Position inside the removed range lands on its start.
        let mut op = PendingOp::Cursor { position: 2 };
        op.rebase_remove(1, 4);
        assert_eq!(op, PendingOp::Cursor { position: 1 });
    }

    #[test]
    fn test_range_can_collapse() {
        let mut op = PendingOp::AddProperty {
            start: 2,
            end: 4,
            property: "bold".to_string(),
            flag: None,
        };
        op.rebase_remove(1, 6);
        match op {
            PendingOp::AddProperty { start, end, .. } => {
                assert_eq!(start, 1);
                assert_eq!(end, 1);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_echo_matching() {
        let op = PendingOp::Insert {
            position: 3,
            text: "X".to_string(),
        };
        let echo = TextServerMessage::Insert {
            text: "X".to_string(),
            position: 3,
            userid: 1,
            mod_id: 8,
        };
        assert!(op.matches_echo(&echo));

        let wrong = TextServerMessage::Insert {
            text: "X".to_string(),
            position: 4,
            userid: 1,
            mod_id: 8,
        };
        assert!(!op.matches_echo(&wrong));
    }
}
