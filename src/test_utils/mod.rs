//! Shared fixtures for unit tests: in-memory stores driven by the tokio
//! clock, a scriptable event source and a recording handler.

mod common;
mod memory_event_source;
mod recording_handler;

pub use common::*;
pub use memory_event_source::*;
pub use memory_stores::*;
pub use recording_handler::*;
