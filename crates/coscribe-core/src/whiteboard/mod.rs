//! The collaborative whiteboard engine.

mod board;
mod path;
mod scene;
mod tools;

pub use board::Whiteboard;
pub use path::{regular_polygon, Polyline};
pub use scene::{Element, SceneGraph};
pub use tools::{Modifiers, ToolKind, ToolState};
