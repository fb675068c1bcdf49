//! Booking lifecycle integration tests.
//!
//! These tests drive the manager against a real SQLite reservation store:
//! - The book / cancel / rebook scenario
//! - Contention between threads booking the same flight
//! - Seat release on cancellation
//! - Transition guards and idempotent payment
//! - Audit trail of the whole flow

use std::sync::{Arc, Barrier};
use std::thread;

use chrono::Duration;
use tempfile::TempDir;

use hangar_core::{
    audit::{create_audit_system, AuditFilter, AuditStore, SqliteAuditStore},
    config::BookingConfig,
    testing::{fixtures, FixedClock, MockFlightCatalog},
    CreateReservation, PaymentStatus, ReservationError, ReservationManager, ReservationStatus,
    ReservationStore, SqliteReservationStore,
};

struct TestHarness {
    manager: Arc<ReservationManager>,
    store: Arc<SqliteReservationStore>,
    catalog: Arc<MockFlightCatalog>,
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new(capacity: u32) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(
            SqliteReservationStore::new(&temp_dir.path().join("reservations.db"))
                .expect("Failed to create reservation store"),
        );

        let catalog = Arc::new(MockFlightCatalog::new());
        catalog.add_flight(fixtures::flight(
            "F1",
            capacity,
            fixtures::now() + Duration::days(7),
        ));

        let clock = Arc::new(FixedClock::new(fixtures::now()));
        let manager = ReservationManager::new(
            catalog.clone(),
            store.clone(),
            clock,
            &BookingConfig::default(),
        );

        Self {
            manager: Arc::new(manager),
            store,
            catalog,
            _temp_dir: temp_dir,
        }
    }

    fn book(&self, user: &str, passengers: u32) -> Result<String, ReservationError> {
        self.manager
            .create(CreateReservation {
                flight_id: "F1".to_string(),
                user_id: user.to_string(),
                passengers,
                notes: None,
            })
            .map(|r| r.id)
    }

    fn available(&self) -> u32 {
        self.manager.engine().available_seats("F1").unwrap()
    }
}

#[test]
fn test_book_cancel_rebook_scenario() {
    let h = TestHarness::new(3);

    let r1 = h.book("userA", 2).unwrap();
    let reservation = h.manager.get(&r1).unwrap();
    assert_eq!(reservation.status, ReservationStatus::Pending);
    assert_eq!(reservation.payment_status, PaymentStatus::Pending);
    assert_eq!(h.available(), 1);

    let err = h.book("userB", 2).unwrap_err();
    assert!(matches!(err, ReservationError::Unavailable(_)));

    let cancelled = h.manager.cancel(&r1).unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    assert_eq!(h.available(), 3);

    assert!(h.book("userB", 2).is_ok());
    assert_eq!(h.available(), 1);
}

#[test]
fn test_last_seat_goes_to_exactly_one_booker() {
    for _ in 0..10 {
        let h = TestHarness::new(1);
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = ["alice", "bob"]
            .into_iter()
            .map(|user| {
                let manager = Arc::clone(&h.manager);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    manager.create(CreateReservation {
                        flight_id: "F1".to_string(),
                        user_id: user.to_string(),
                        passengers: 1,
                        notes: None,
                    })
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let unavailable = results
            .iter()
            .filter(|r| matches!(r, Err(ReservationError::Unavailable(_))))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(unavailable, 1);
        assert_eq!(h.available(), 0);
    }
}

#[test]
fn test_capacity_never_exceeded_under_contention() {
    let h = TestHarness::new(10);
    let barrier = Arc::new(Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let manager = Arc::clone(&h.manager);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                manager.create(CreateReservation {
                    flight_id: "F1".to_string(),
                    user_id: format!("user-{}", i),
                    passengers: 1 + (i % 3),
                    notes: None,
                })
            })
        })
        .collect();

    for handle in handles {
        match handle.join().unwrap() {
            Ok(_) | Err(ReservationError::Unavailable(_)) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    let committed = h.store.committed_passengers("F1").unwrap();
    assert!(committed <= 10, "committed {} seats on a 10 seat flight", committed);
    assert_eq!(h.available(), 10 - committed);
}

#[test]
fn test_cancellation_releases_exact_passenger_count() {
    let h = TestHarness::new(5);
    let r1 = h.book("alice", 3).unwrap();
    h.book("bob", 2).unwrap();
    assert_eq!(h.available(), 0);

    h.manager.confirm(&r1).unwrap();
    h.manager.cancel(&r1).unwrap();
    assert_eq!(h.available(), 3);
}

#[test]
fn test_mark_paid_twice_is_not_an_error() {
    let h = TestHarness::new(2);
    let id = h.book("alice", 1).unwrap();

    let first = h.manager.mark_paid(&id).unwrap();
    let second = h.manager.mark_paid(&id).unwrap();
    assert_eq!(first.payment_status, PaymentStatus::Paid);
    assert_eq!(second.payment_status, PaymentStatus::Paid);
    assert_eq!(second.status, ReservationStatus::Pending);
}

#[test]
fn test_confirm_after_cancel_is_rejected() {
    let h = TestHarness::new(2);
    let id = h.book("alice", 1).unwrap();
    h.manager.mark_paid(&id).unwrap();
    h.manager.cancel(&id).unwrap();

    let err = h.manager.confirm(&id).unwrap_err();
    assert!(matches!(err, ReservationError::InvalidTransition { .. }));

    let stored = h.manager.get(&id).unwrap();
    assert_eq!(stored.status, ReservationStatus::Cancelled);
    assert_eq!(stored.payment_status, PaymentStatus::Refunded);
}

#[test]
fn test_catalog_outage_never_books() {
    let h = TestHarness::new(2);
    h.catalog.fail_with("flight service unreachable");

    let err = h.book("alice", 1).unwrap_err();
    assert!(matches!(err, ReservationError::DependencyFailure(_)));
    assert_eq!(h.store.committed_passengers("F1").unwrap(), 0);
}

#[test]
fn test_audit_trail_records_lifecycle() {
    let h = TestHarness::new(2);
    let audit_store = Arc::new(SqliteAuditStore::in_memory().unwrap());
    let (handle, writer) = create_audit_system(audit_store.clone(), 64);

    let manager = Arc::try_unwrap(h.manager)
        .ok()
        .expect("manager should not be shared yet")
        .with_audit(handle);

    let id = manager
        .create(CreateReservation {
            flight_id: "F1".to_string(),
            user_id: "alice".to_string(),
            passengers: 2,
            notes: Some("first flight".to_string()),
        })
        .unwrap()
        .id;
    manager.confirm(&id).unwrap();
    manager.mark_paid(&id).unwrap();
    manager.cancel(&id).unwrap();

    // Dropping the last handle lets the writer drain and exit.
    drop(manager);
    tokio_test::block_on(writer.run());

    let records = audit_store
        .query(&AuditFilter::new().with_reservation_id(id.clone()))
        .unwrap();
    let mut types: Vec<&str> = records.iter().map(|r| r.event_type.as_str()).collect();
    types.sort();
    assert_eq!(
        types,
        vec![
            "payment_marked",
            "reservation_cancelled",
            "reservation_confirmed",
            "reservation_created",
        ]
    );
    assert!(records.iter().all(|r| r.user_id.as_deref() == Some("alice")));
}
