use serde::Deserialize;
use serde::Serialize;

use super::ChangeEvent;
use super::OperationKind;

/// Selection of which change events a stream session should carry.
///
/// Sources translate the filter into their native predicate language when
/// opening a stream. [`EventFilter::matches`] is the reference semantics
/// a source must reproduce.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFilter {
    /// Operation kinds to keep. Empty keeps every operation.
    #[serde(default)]
    pub operations: Vec<OperationKind>,
}

impl EventFilter {
    /// A filter that keeps every event.
    pub fn any() -> Self {
        EventFilter::default()
    }

    /// A filter that keeps only the given operation kinds.
    pub fn for_operations(operations: impl Into<Vec<OperationKind>>) -> Self {
        EventFilter {
            operations: operations.into(),
        }
    }

    pub fn matches(
        &self,
        event: &ChangeEvent,
    ) -> bool {
        self.operations.is_empty() || self.operations.contains(&event.operation)
    }
}
