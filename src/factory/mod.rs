//! Composition point wiring stores, configuration and shutdown signaling
//! into ready-to-run watchers.

mod watcher_factory;
pub use watcher_factory::*;
