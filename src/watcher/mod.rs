//! The ownership and consumption state machine.
//!
//! One watch loop competes for a lease, drains the change stream while it
//! holds it, and tears the session down on handover, lease loss, stream
//! trouble or shutdown. Only a store failure ends the loop with an error.

mod change_watcher;
mod handler;
mod phase;

pub use change_watcher::*;
pub use handler::*;
pub use phase::*;
