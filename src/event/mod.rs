//! Change feed data model and source traits.
//!
//! Events arrive in source order, each carrying an opaque position id that
//! doubles as the resume checkpoint for the next session.

mod change_event;
mod filter;
mod source;

pub use change_event::*;
pub use filter::*;
pub use source::*;
