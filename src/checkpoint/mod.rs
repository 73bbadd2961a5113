//! Durable resume positions and per-event retry accounting.

mod store;

pub use store::*;
