mod sled_adapter;

use std::path::Path;

#[doc(hidden)]
pub use sled_adapter::*;
use tracing::debug;
use tracing::warn;

/// Embedded database backing both durable stores.
pub fn init_sled_watch_db(
    db_root_path: impl AsRef<Path> + std::fmt::Debug
) -> std::result::Result<sled::Db, std::io::Error> {
    debug!("init_sled_watch_db from path: {:?}", &db_root_path);

    let path = db_root_path.as_ref();
    let watch_db_path = path.join("watch_state");

    sled::Config::default()
        .path(&watch_db_path)
        .cache_capacity(10 * 1024 * 1024) //10MB
        .flush_every_ms(Some(3))
        .use_compression(true)
        .compression_factor(1)
        .open()
        .map_err(|e| {
            warn!(
                "Try to open DB at this location: {:?} and failed: {:?}",
                watch_db_path, e
            );
            std::io::Error::other(e)
        })
}
