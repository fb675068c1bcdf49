//! Per-flight booking locks.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::error::ReservationError;

/// Table of flights currently being booked.
///
/// At most one guard per flight id exists at a time. Guards for different
/// flights never wait on each other.
pub struct FlightLocks {
    held: Mutex<HashSet<String>>,
    released: Condvar,
    timeout: Duration,
}

impl FlightLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait for exclusive access to `flight_id`, up to the configured timeout.
    ///
    /// Times out with `DependencyFailure`.
    pub fn acquire(&self, flight_id: &str) -> Result<FlightGuard<'_>, ReservationError> {
        let started = Instant::now();
        let deadline = started + self.timeout;

        let mut held = self.held.lock().map_err(|_| poisoned())?;
        while held.contains(flight_id) {
            let now = Instant::now();
            if now >= deadline {
                return Err(ReservationError::DependencyFailure(format!(
                    "timed out after {}ms waiting for booking lock on flight {}",
                    self.timeout.as_millis(),
                    flight_id
                )));
            }
            let (guard, _) = self
                .released
                .wait_timeout(held, deadline - now)
                .map_err(|_| poisoned())?;
            held = guard;
        }
        held.insert(flight_id.to_string());

        Ok(FlightGuard {
            locks: self,
            flight_id: flight_id.to_string(),
            waited: started.elapsed(),
        })
    }

    /// Number of flights currently locked.
    pub fn held_count(&self) -> usize {
        match self.held.lock() {
            Ok(held) => held.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    fn release(&self, flight_id: &str) {
        let mut held = match self.held.lock() {
            Ok(held) => held,
            Err(poisoned) => poisoned.into_inner(),
        };
        held.remove(flight_id);
        drop(held);
        self.released.notify_all();
    }
}

fn poisoned() -> ReservationError {
    ReservationError::DependencyFailure("booking lock table poisoned".to_string())
}

/// Exclusive access to one flight's bookings. Released on drop.
pub struct FlightGuard<'a> {
    locks: &'a FlightLocks,
    flight_id: String,
    waited: Duration,
}

impl FlightGuard<'_> {
    pub fn flight_id(&self) -> &str {
        &self.flight_id
    }

    /// Time spent waiting before the lock was granted.
    pub fn waited(&self) -> Duration {
        self.waited
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.locks.release(&self.flight_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_acquire_and_release() {
        let locks = FlightLocks::new(Duration::from_millis(100));
        {
            let guard = locks.acquire("F1").unwrap();
            assert_eq!(guard.flight_id(), "F1");
            assert_eq!(locks.held_count(), 1);
        }
        assert_eq!(locks.held_count(), 0);
        assert!(locks.acquire("F1").is_ok());
    }

    #[test]
    fn test_different_flights_do_not_contend() {
        let locks = FlightLocks::new(Duration::from_millis(50));
        let _a = locks.acquire("F1").unwrap();
        let b = locks.acquire("F2").unwrap();
        assert!(b.waited() < Duration::from_millis(50));
        assert_eq!(locks.held_count(), 2);
    }

    #[test]
    fn test_same_flight_times_out() {
        let locks = FlightLocks::new(Duration::from_millis(30));
        let _held = locks.acquire("F1").unwrap();

        let result = locks.acquire("F1");
        assert!(matches!(
            result,
            Err(ReservationError::DependencyFailure(_))
        ));
    }

    #[test]
    fn test_waiter_proceeds_after_release() {
        let locks = Arc::new(FlightLocks::new(Duration::from_secs(5)));
        let guard = locks.acquire("F1").unwrap();

        let waiter = {
            let locks = Arc::clone(&locks);
            thread::spawn(move || locks.acquire("F1").map(|g| g.waited()))
        };

        thread::sleep(Duration::from_millis(20));
        drop(guard);

        let waited = waiter.join().unwrap().unwrap();
        assert!(waited >= Duration::from_millis(10));
    }

    #[test]
    fn test_mutual_exclusion() {
        let locks = Arc::new(FlightLocks::new(Duration::from_secs(5)));
        let inside = Arc::new(AtomicU32::new(0));
        let max_inside = Arc::new(AtomicU32::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    let _guard = locks.acquire("F1").unwrap();
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(2));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }
}
