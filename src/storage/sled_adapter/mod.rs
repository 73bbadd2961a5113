// Submodule declaration
// -----------------------------------------------------------------------------
mod sled_checkpoint_store;
mod sled_lease_store;

// Re-export
// -----------------------------------------------------------------------------
pub use sled_checkpoint_store::*;
pub use sled_lease_store::*;
