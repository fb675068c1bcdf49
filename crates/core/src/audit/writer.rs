use std::sync::Arc;

use tokio::sync::mpsc;

use super::{AuditEventEnvelope, AuditHandle, AuditRecord, AuditStore};

/// Background task that drains the audit channel into storage
pub struct AuditWriter {
    rx: mpsc::Receiver<AuditEventEnvelope>,
    store: Arc<dyn AuditStore>,
}

impl AuditWriter {
    pub fn new(rx: mpsc::Receiver<AuditEventEnvelope>, store: Arc<dyn AuditStore>) -> Self {
        Self { rx, store }
    }

    /// Consume events until every handle has been dropped.
    pub async fn run(mut self) {
        tracing::info!("Audit writer started");

        while let Some(envelope) = self.rx.recv().await {
            let record = AuditRecord::from_event(envelope.event, envelope.timestamp);

            if let Err(e) = self.store.insert(&record) {
                tracing::error!("Failed to write audit event: {}", e);
            }
        }

        tracing::info!("Audit writer shutting down");
    }
}

/// Create a handle/writer pair sharing a channel of `buffer_size` events.
///
/// Spawn the writer with `tokio::spawn(writer.run())`; it exits once the
/// last handle clone is dropped.
pub fn create_audit_system(
    store: Arc<dyn AuditStore>,
    buffer_size: usize,
) -> (AuditHandle, AuditWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (AuditHandle::new(tx), AuditWriter::new(rx, store))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::audit::{AuditError, AuditEvent, AuditFilter};

    /// Store that keeps records in memory
    struct MockStore {
        records: Mutex<Vec<AuditRecord>>,
        should_fail: bool,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
                should_fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
                should_fail: true,
            }
        }

        fn get_records(&self) -> Vec<AuditRecord> {
            self.records.lock().unwrap().clone()
        }
    }

    impl AuditStore for MockStore {
        fn insert(&self, record: &AuditRecord) -> Result<i64, AuditError> {
            if self.should_fail {
                return Err(AuditError::Database("Mock failure".to_string()));
            }
            let mut records = self.records.lock().unwrap();
            let id = records.len() as i64 + 1;
            let mut stored = record.clone();
            stored.id = id;
            records.push(stored);
            Ok(id)
        }

        fn query(&self, _filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditError> {
            Ok(self.records.lock().unwrap().clone())
        }

        fn count(&self, _filter: &AuditFilter) -> Result<i64, AuditError> {
            Ok(self.records.lock().unwrap().len() as i64)
        }
    }

    fn spawn_writer(store: &Arc<MockStore>, buffer: usize) -> (AuditHandle, tokio::task::JoinHandle<()>) {
        let store_dyn: Arc<dyn AuditStore> = Arc::clone(store) as Arc<dyn AuditStore>;
        let (handle, writer) = create_audit_system(store_dyn, buffer);
        (handle, tokio::spawn(writer.run()))
    }

    fn cancelled(reservation_id: &str) -> AuditEvent {
        AuditEvent::ReservationCancelled {
            reservation_id: reservation_id.to_string(),
            flight_id: "F1".to_string(),
            user_id: "alice".to_string(),
            previous_status: "PENDING".to_string(),
            seats_released: 2,
            refunded: false,
        }
    }

    #[tokio::test]
    async fn test_writer_stores_events_with_ids() {
        let store = Arc::new(MockStore::new());
        let (handle, writer) = spawn_writer(&store, 10);

        handle.emit(cancelled("r-1")).await;
        drop(handle);
        writer.await.unwrap();

        let records = store.get_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_type, "reservation_cancelled");
        assert_eq!(records[0].reservation_id.as_deref(), Some("r-1"));
        assert_eq!(records[0].user_id.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_writer_continues_on_insert_failure() {
        let store = Arc::new(MockStore::failing());
        let (handle, writer) = spawn_writer(&store, 10);

        handle.emit(cancelled("r-1")).await;
        handle.emit(cancelled("r-2")).await;
        drop(handle);

        writer.await.unwrap();
        assert!(store.get_records().is_empty());
    }

    #[tokio::test]
    async fn test_writer_waits_for_all_handles_to_drop() {
        let store = Arc::new(MockStore::new());
        let (main_handle, writer) = spawn_writer(&store, 10);
        let manager_handle = main_handle.clone();

        manager_handle.emit(cancelled("r-1")).await;
        main_handle
            .emit(AuditEvent::ServiceStopped {
                reason: "graceful_shutdown".to_string(),
            })
            .await;

        drop(main_handle);
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        assert!(
            !writer.is_finished(),
            "Writer should still be running with handles alive"
        );

        drop(manager_handle);
        let result = tokio::time::timeout(tokio::time::Duration::from_secs(1), writer).await;
        assert!(result.is_ok(), "Writer should exit after all handles dropped");

        let records = store.get_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].event_type, "service_stopped");
    }

    #[tokio::test]
    async fn test_try_emit_from_sync_code_is_captured() {
        let store = Arc::new(MockStore::new());
        let (handle, writer) = spawn_writer(&store, 10);

        let sync_handle = handle.clone();
        tokio::task::spawn_blocking(move || {
            assert!(sync_handle.try_emit(cancelled("r-9")));
        })
        .await
        .unwrap();

        drop(handle);
        writer.await.unwrap();
        assert_eq!(store.get_records().len(), 1);
    }
}
