//! SQLite-backed reservation store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{
    NewReservation, PaymentStatus, Reservation, ReservationFilter, ReservationStatus,
    ReservationStore,
};
use crate::error::ReservationError;
use crate::lifecycle::{Transition, TransitionOutcome};

const RESERVATION_COLUMNS: &str = "id, flight_id, user_id, passengers, amount_cents, notes, \
     status, payment_status, created_at, updated_at";

fn db_err(e: rusqlite::Error) -> ReservationError {
    ReservationError::Storage(e.to_string())
}

/// SQLite-backed reservation store.
pub struct SqliteReservationStore {
    conn: Mutex<Connection>,
}

impl SqliteReservationStore {
    /// Create a new store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, ReservationError> {
        let conn = Connection::open(path).map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, ReservationError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), ReservationError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS reservations (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                flight_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                passengers INTEGER NOT NULL CHECK (passengers >= 1),
                amount_cents INTEGER NOT NULL DEFAULT 0,
                notes TEXT,
                status TEXT NOT NULL,
                payment_status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_reservations_flight ON reservations(flight_id, status);
            CREATE INDEX IF NOT EXISTS idx_reservations_user ON reservations(user_id);
            CREATE INDEX IF NOT EXISTS idx_reservations_status ON reservations(status);
            "#,
        )
        .map_err(db_err)?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, ReservationError> {
        self.conn
            .lock()
            .map_err(|_| ReservationError::Storage("reservation store lock poisoned".to_string()))
    }

    fn build_where_clause(filter: &ReservationFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref flight_id) = filter.flight_id {
            conditions.push("flight_id = ?");
            params.push(Box::new(flight_id.clone()));
        }

        if let Some(ref user_id) = filter.user_id {
            conditions.push("user_id = ?");
            params.push(Box::new(user_id.clone()));
        }

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params.push(Box::new(status.as_str()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn conversion_err(column: usize, message: String) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Text,
            message.into(),
        )
    }

    fn parse_timestamp(value: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| Self::conversion_err(column, e.to_string()))
    }

    fn row_to_reservation(row: &rusqlite::Row) -> rusqlite::Result<Reservation> {
        let amount_cents: i64 = row.get(4)?;
        let status_str: String = row.get(6)?;
        let payment_str: String = row.get(7)?;
        let created_at_str: String = row.get(8)?;
        let updated_at_str: String = row.get(9)?;

        let status = ReservationStatus::parse(&status_str)
            .ok_or_else(|| Self::conversion_err(6, format!("unknown status: {}", status_str)))?;
        let payment_status = PaymentStatus::parse(&payment_str).ok_or_else(|| {
            Self::conversion_err(7, format!("unknown payment status: {}", payment_str))
        })?;

        Ok(Reservation {
            id: row.get(0)?,
            flight_id: row.get(1)?,
            user_id: row.get(2)?,
            passengers: row.get(3)?,
            amount_cents: amount_cents.max(0) as u64,
            notes: row.get(5)?,
            status,
            payment_status,
            created_at: Self::parse_timestamp(&created_at_str, 8)?,
            updated_at: Self::parse_timestamp(&updated_at_str, 9)?,
        })
    }

    fn select_by_id(conn: &Connection, id: &str) -> Result<Option<Reservation>, ReservationError> {
        let sql = format!(
            "SELECT {} FROM reservations WHERE id = ?",
            RESERVATION_COLUMNS
        );
        conn.query_row(&sql, params![id], Self::row_to_reservation)
            .optional()
            .map_err(db_err)
    }
}

impl ReservationStore for SqliteReservationStore {
    fn insert(&self, new: NewReservation) -> Result<Reservation, ReservationError> {
        if new.passengers == 0 {
            return Err(ReservationError::InvalidRequest(
                "passengers must be at least 1".to_string(),
            ));
        }

        let conn = self.lock()?;

        let reservation = Reservation {
            id: uuid::Uuid::new_v4().to_string(),
            flight_id: new.flight_id,
            user_id: new.user_id,
            passengers: new.passengers,
            amount_cents: new.amount_cents,
            notes: new.notes,
            status: ReservationStatus::Pending,
            payment_status: PaymentStatus::Pending,
            created_at: new.created_at,
            updated_at: new.created_at,
        };

        conn.execute(
            "INSERT INTO reservations (id, flight_id, user_id, passengers, amount_cents, notes, status, payment_status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                reservation.id,
                reservation.flight_id,
                reservation.user_id,
                reservation.passengers,
                reservation.amount_cents as i64,
                reservation.notes,
                reservation.status.as_str(),
                reservation.payment_status.as_str(),
                reservation.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                reservation.updated_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )
        .map_err(db_err)?;

        Ok(reservation)
    }

    fn get(&self, id: &str) -> Result<Option<Reservation>, ReservationError> {
        let conn = self.lock()?;
        Self::select_by_id(&conn, id)
    }

    fn list(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, ReservationError> {
        let conn = self.lock()?;

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT {} FROM reservations {} ORDER BY created_at ASC, seq ASC LIMIT ? OFFSET ?",
            RESERVATION_COLUMNS, where_clause
        );

        let mut stmt = conn.prepare(&sql).map_err(db_err)?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_reservation)
            .map_err(db_err)?;

        let mut reservations = Vec::new();
        for row_result in rows {
            reservations.push(row_result.map_err(db_err)?);
        }

        Ok(reservations)
    }

    fn count(&self, filter: &ReservationFilter) -> Result<i64, ReservationError> {
        let conn = self.lock()?;

        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM reservations {}", where_clause);
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(db_err)
    }

    fn committed_passengers(&self, flight_id: &str) -> Result<u32, ReservationError> {
        let conn = self.lock()?;

        let total: i64 = conn
            .query_row(
                "SELECT COALESCE(SUM(passengers), 0) FROM reservations WHERE flight_id = ? AND status IN (?, ?)",
                params![
                    flight_id,
                    ReservationStatus::Pending.as_str(),
                    ReservationStatus::Confirmed.as_str()
                ],
                |row| row.get(0),
            )
            .map_err(db_err)?;

        u32::try_from(total)
            .map_err(|_| ReservationError::Storage(format!("committed seat total out of range: {}", total)))
    }

    fn apply_transition(
        &self,
        id: &str,
        transition: Transition,
        at: DateTime<Utc>,
    ) -> Result<TransitionOutcome, ReservationError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;

        let current = Self::select_by_id(&tx, id)?
            .ok_or_else(|| ReservationError::NotFound(format!("reservation {}", id)))?;

        // Rejected transitions drop the transaction, which rolls back.
        let effect = transition.evaluate(&current)?;

        let mut updated = current.clone();
        if effect.changed {
            updated.status = effect.status;
            updated.payment_status = effect.payment_status;
            updated.updated_at = at;

            tx.execute(
                "UPDATE reservations SET status = ?, payment_status = ?, updated_at = ? WHERE id = ?",
                params![
                    updated.status.as_str(),
                    updated.payment_status.as_str(),
                    updated.updated_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                    id
                ],
            )
            .map_err(db_err)?;
        }

        tx.commit().map_err(db_err)?;

        Ok(TransitionOutcome {
            reservation: updated,
            previous_status: current.status,
            previous_payment_status: current.payment_status,
            changed: effect.changed,
        })
    }
}
