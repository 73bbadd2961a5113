//! Distributed TTL leases and their background renewal.
//!
//! One lease guards one watcher id. Whoever holds it is the only instance
//! allowed to drain that change stream until the lease lapses, is released,
//! or is handed over.

mod handle;
mod renewer;
mod store;

pub use handle::*;
pub use renewer::*;
pub use store::*;
