//! Cursor navigation
//!
//! The cursor is the only mutable state of a query session. Everything that
//! moves it restores it through [`SavedContext`] before returning.

pub mod cursor;
pub mod position;

pub use cursor::{Cursor, SavedContext};
pub use position::{resolve_position, PositionTuple};
