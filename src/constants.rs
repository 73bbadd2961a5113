// -
// Database namespaces

/// Sled database tree namespaces
pub(crate) const LEASE_RECORDS_TREE: &str = "_lease_records";
pub(crate) const CHECKPOINTS_TREE: &str = "_checkpoints";
pub(crate) const RETRY_COUNTERS_TREE: &str = "_retry_counters";

/// Lease resource key namespace
pub(crate) const LEASE_KEY_PREFIX: &str = "solewatch::lease::";
