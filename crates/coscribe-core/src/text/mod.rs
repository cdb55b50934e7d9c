//! The collaborative text editor engine.

mod buffer;
mod cursors;
mod editor;
mod pending;
mod properties;
mod render;

pub use buffer::Buffer;
pub use cursors::{Cursor, CursorTable, LOCAL_COLOUR, LOCAL_USERNAME, PALETTE};
pub use editor::{Replica, TextDocument, TextEditor};
pub use pending::PendingOp;
pub use properties::{Property, PropertyTable, Span};
pub use render::render_markup;
