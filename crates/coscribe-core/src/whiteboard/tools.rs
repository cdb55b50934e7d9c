//! Tool state for the whiteboard.
//!
//! Exactly one tool is active at a time; tool state is local and never
//! leaves the client.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Selector,
    Pen,
    Eraser,
    /// Regular polygon with the given number of sides (≥ 3).
    Shape(u32),
}

/// Modifier keys relevant to selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
}

impl Modifiers {
    pub fn toggles_selection(&self) -> bool {
        self.shift || self.ctrl
    }
}

/// State of an in-flight pointer interaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ToolState {
    #[default]
    Idle,
    /// Pen stroke being drawn.
    Drawing { points: Vec<Point> },
    /// Shape tool drag from its anchor corner.
    ShapeDrag { start: Point, current: Point },
    /// Eraser stroke; `last` is the previous pointer position.
    Erasing { last: Point },
    /// Selection drag; `changed` collects the path ids that moved.
    Moving { last: Point, changed: Vec<String> },
}

/// The active tool, its interaction state and the current selection.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    pub current: ToolKind,
    pub state: ToolState,
    selection: Vec<String>,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch tools, cancelling any in-flight interaction.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.current = tool;
        self.state = ToolState::Idle;
    }

    pub fn is_active(&self) -> bool {
        self.state != ToolState::Idle
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.iter().any(|s| s == id)
    }

    pub fn select(&mut self, id: &str) {
        if !self.is_selected(id) {
            self.selection.push(id.to_string());
        }
    }

    pub fn toggle(&mut self, id: &str) {
        if self.is_selected(id) {
            self.selection.retain(|s| s != id);
        } else {
            self.selection.push(id.to_string());
        }
    }

    pub fn deselect(&mut self, id: &str) {
        self.selection.retain(|s| s != id);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn set_selection(&mut self, ids: Vec<String>) {
        self.selection = ids;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tool_is_selector() {
        let tm = ToolManager::new();
        assert_eq!(tm.current, ToolKind::Selector);
        assert!(!tm.is_active());
    }

    #[test]
    fn test_switching_tools_cancels_interaction() {
        let mut tm = ToolManager::new();
        tm.state = ToolState::Drawing {
            points: vec![Point::new(0.0, 0.0)],
        };
        tm.set_tool(ToolKind::Pen);
        assert!(!tm.is_active());
    }

    #[test]
    fn test_toggle_selection() {
        let mut tm = ToolManager::new();
        tm.toggle("a");
        assert!(tm.is_selected("a"));
        tm.toggle("a");
        assert!(!tm.is_selected("a"));
    }

    #[test]
    fn test_select_is_idempotent() {
        let mut tm = ToolManager::new();
        tm.select("a");
        tm.select("a");
        assert_eq!(tm.selection(), &["a".to_string()]);
    }
}
