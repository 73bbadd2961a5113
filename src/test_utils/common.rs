use crate::event::ChangeEvent;
use crate::event::EventId;
use crate::event::OperationKind;
use crate::utils::time::now_unix_ms;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

/// Insert event with a sortable sequence id.
pub fn generate_insert_event(seq: u64) -> ChangeEvent {
    generate_event(seq, OperationKind::Insert)
}

pub fn generate_event(
    seq: u64,
    operation: OperationKind,
) -> ChangeEvent {
    ChangeEvent {
        id: EventId::new(format!("evt-{seq:08}").into_bytes()),
        operation,
        document_key: format!("doc-{seq}").into_bytes(),
        full_document: Some(format!("{{\"seq\":{seq}}}").into_bytes()),
        timestamp_ms: now_unix_ms(),
        update_description: None,
    }
}
