//! Watcher Error Hierarchy
//!
//! Defines the error types for the exclusive change-stream watcher,
//! categorized by infrastructure and watch-lifecycle concerns.

use config::ConfigError;
use tokio::task::JoinError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Infrastructure-level failures (storage, serialization, tasks)
    #[error(transparent)]
    System(#[from] SystemError),

    /// Watcher configuration validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Watch lifecycle failures that terminate the watch loop
    #[error(transparent)]
    Watch(#[from] WatchError),

    /// Unrecoverable failures requiring the watcher to stop
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    // Storage layer
    #[error("Storage operation failed")]
    Storage(#[from] StorageError),

    //Serialization
    #[error("Serialization error")]
    Serialization(#[from] SerializationError),

    #[error("Background task failed: {0}")]
    TaskFailed(#[from] JoinError),
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The change stream could not be opened at all
    #[error("Failed to open change stream: {0}")]
    StreamOpen(#[source] StreamError),

    /// The renewer task went away without reporting a fault
    #[error("Lease renewer stopped unexpectedly")]
    RenewerGone,
}

/// Failures of an open change stream.
///
/// These are reported by [`crate::EventSource`] and [`crate::ChangeStream`]
/// implementations and make the watcher tear down the current session and
/// start over from the last durable checkpoint.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Connection to the change feed was lost
    #[error("Change stream disconnected: {0}")]
    Disconnected(String),

    /// An event was received but could not be decoded
    #[error("Malformed change event: {0}")]
    Decode(String),

    /// Source-defined failure with its original cause
    #[error("Change source error: {source}")]
    Source {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Failures raised by a change handler.
///
/// Handler errors never escape the watch loop. They only drive the
/// per-event retry accounting.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Handler failed: {0}")]
    Failed(String),

    /// Handler-defined failure with its original cause
    #[error("Handler error: {source}")]
    Source {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Disk I/O failures during lease/checkpoint operations
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// Serialization failures for persisted data
    #[error(transparent)]
    BincodeError(#[from] bincode::Error),

    /// Embedded database errors
    #[error("Embedded database error: {0}")]
    DbError(String),

    /// Error type for value conversion operations
    #[error("Value convert failed")]
    Convert(#[from] ConvertError),
}

// Serialization is classified separately (wire tokens versus stored records)
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("Bincode serialization failed: {0}")]
    Bincode(#[from] bincode::Error),
}

/// Error type for value conversion operations
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Invalid input length error
    ///
    /// This occurs when the input byte slice length doesn't match the required 8 bytes.
    #[error("invalid byte length: expected 8 bytes, received {0} bytes")]
    InvalidLength(usize),

    /// Generic conversion failure with detailed message
    #[error("conversion failure: {0}")]
    ConversionFailure(String),
}

// ============== Conversion Implementations ============== //
impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Error::System(SystemError::Storage(e))
    }
}

impl From<ConvertError> for Error {
    fn from(e: ConvertError) -> Self {
        Error::System(SystemError::Storage(StorageError::Convert(e)))
    }
}

impl From<SerializationError> for Error {
    fn from(e: SerializationError) -> Self {
        Error::System(SystemError::Serialization(e))
    }
}

impl From<sled::Error> for Error {
    fn from(err: sled::Error) -> Self {
        StorageError::DbError(err.to_string()).into()
    }
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::DbError(err.to_string())
    }
}

impl From<JoinError> for Error {
    fn from(err: JoinError) -> Self {
        Error::System(SystemError::TaskFailed(err))
    }
}

impl HandlerError {
    /// Wraps an arbitrary error as a handler failure.
    pub fn from_source<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        HandlerError::Source {
            source: Box::new(source),
        }
    }
}

impl StreamError {
    /// Wraps an arbitrary error as a source failure.
    pub fn from_source<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StreamError::Source {
            source: Box::new(source),
        }
    }
}
