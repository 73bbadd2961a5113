use std::time::{SystemTime, UNIX_EPOCH};

/// return minisecond
pub(crate) fn now_unix_ms() -> u64 {
    let now = SystemTime::now();
    let since_epoch = now.duration_since(UNIX_EPOCH).expect("Time went backwards");
    since_epoch.as_millis() as u64
}
