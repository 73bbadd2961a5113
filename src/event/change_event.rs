use serde::Deserialize;
use serde::Serialize;

/// Opaque position id of a change event inside its feed.
///
/// The byte content is defined by the event source. Ids are compared for
/// equality and handed back as resume checkpoints; nothing in the watcher
/// interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Vec<u8>);

impl EventId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        EventId(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for EventId {
    fn from(bytes: Vec<u8>) -> Self {
        EventId(bytes)
    }
}

impl AsRef<[u8]> for EventId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Kind of mutation a change event describes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Insert,
    Update,
    Replace,
    Delete,
    /// Source-specific operation outside the common set
    Other(String),
}

impl OperationKind {
    pub fn as_str(&self) -> &str {
        match self {
            OperationKind::Insert => "insert",
            OperationKind::Update => "update",
            OperationKind::Replace => "replace",
            OperationKind::Delete => "delete",
            OperationKind::Other(name) => name,
        }
    }
}

impl From<&str> for OperationKind {
    fn from(name: &str) -> Self {
        match name {
            "insert" => OperationKind::Insert,
            "update" => OperationKind::Update,
            "replace" => OperationKind::Replace,
            "delete" => OperationKind::Delete,
            other => OperationKind::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields touched by an update operation, as reported by the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateDescription {
    /// Source-encoded map of updated fields
    pub updated_fields: Option<Vec<u8>>,
    /// Names of removed fields
    pub removed_fields: Vec<String>,
}

/// One entry of the ordered change feed.
///
/// `document_key` and `full_document` carry source-encoded payload bytes.
/// `full_document` is only populated when the stream session asked for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub id: EventId,
    pub operation: OperationKind,
    pub document_key: Vec<u8>,
    pub full_document: Option<Vec<u8>>,
    pub timestamp_ms: u64,
    pub update_description: Option<UpdateDescription>,
}
