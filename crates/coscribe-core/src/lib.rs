//! Coscribe Core Library
//!
//! Client-side engines for the coscribe shared workspace: a collaborative
//! text editor and a collaborative whiteboard, both replicated through a
//! server that totally orders mutation events.

pub mod geometry;
pub mod protocol;
pub mod text;
pub mod whiteboard;

pub use protocol::{BoardMessage, ModId, TextClientMessage, TextServerMessage, UserId};
pub use text::TextEditor;
pub use whiteboard::{ToolKind, Whiteboard};
