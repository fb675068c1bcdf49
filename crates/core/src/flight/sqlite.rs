//! SQLite-backed flight catalog.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{
    Aircraft, CatalogError, Flight, FlightCatalog, FlightFilter, FlightListing, FlightStatus,
    FlightType,
};

const FLIGHT_COLUMNS: &str = "id, registration, model, departure_at, estimated_return_at, \
     flight_type, capacity, price_cents, description, status";

/// SQLite-backed flight catalog.
///
/// Besides the read-only [`FlightCatalog`] surface it exposes `upsert` and
/// `set_status`, the write side used by flight management and seeding.
pub struct SqliteFlightCatalog {
    conn: Mutex<Connection>,
}

impl SqliteFlightCatalog {
    /// Open (or create) the catalog at the given database path.
    pub fn new(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path).map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory catalog (useful for testing).
    pub fn in_memory() -> Result<Self, CatalogError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CatalogError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS flights (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                registration TEXT NOT NULL,
                model TEXT NOT NULL,
                departure_at TEXT NOT NULL,
                estimated_return_at TEXT NOT NULL,
                flight_type TEXT NOT NULL,
                capacity INTEGER NOT NULL CHECK (capacity >= 1),
                price_cents INTEGER NOT NULL DEFAULT 0,
                description TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_flights_departure ON flights(departure_at);
            "#,
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CatalogError> {
        self.conn
            .lock()
            .map_err(|_| CatalogError::Unavailable("catalog lock poisoned".to_string()))
    }

    /// Insert a flight, or replace the one with the same id.
    ///
    /// Replacing keeps the flight's original catalog position.
    pub fn upsert(&self, flight: &Flight) -> Result<(), CatalogError> {
        flight.validate()?;
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO flights (id, registration, model, departure_at, estimated_return_at, flight_type, capacity, price_cents, description, status)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                registration = excluded.registration,
                model = excluded.model,
                departure_at = excluded.departure_at,
                estimated_return_at = excluded.estimated_return_at,
                flight_type = excluded.flight_type,
                capacity = excluded.capacity,
                price_cents = excluded.price_cents,
                description = excluded.description,
                status = excluded.status",
            params![
                flight.id,
                flight.aircraft.registration,
                flight.aircraft.model,
                flight.departure_at.to_rfc3339(),
                flight.estimated_return_at.to_rfc3339(),
                flight.flight_type.as_str(),
                flight.capacity,
                flight.price_cents as i64,
                flight.description,
                flight.status.as_str(),
            ],
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(())
    }

    /// Insert a flight unless one with the same id already exists.
    ///
    /// Returns whether the flight was inserted. An existing flight is left
    /// untouched, including any status set since it was first imported.
    pub fn insert_if_absent(&self, flight: &Flight) -> Result<bool, CatalogError> {
        flight.validate()?;
        let conn = self.lock()?;

        let inserted = conn
            .execute(
                "INSERT INTO flights (id, registration, model, departure_at, estimated_return_at, flight_type, capacity, price_cents, description, status)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO NOTHING",
                params![
                    flight.id,
                    flight.aircraft.registration,
                    flight.aircraft.model,
                    flight.departure_at.to_rfc3339(),
                    flight.estimated_return_at.to_rfc3339(),
                    flight.flight_type.as_str(),
                    flight.capacity,
                    flight.price_cents as i64,
                    flight.description,
                    flight.status.as_str(),
                ],
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(inserted > 0)
    }

    /// Import seed flights that are not in the catalog yet.
    ///
    /// Returns the number of flights added.
    pub fn import_missing(&self, flights: &[Flight]) -> Result<usize, CatalogError> {
        let mut added = 0;
        for flight in flights {
            if self.insert_if_absent(flight)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Change a flight's operational status.
    pub fn set_status(&self, id: &str, status: FlightStatus) -> Result<(), CatalogError> {
        let conn = self.lock()?;

        let updated = conn
            .execute(
                "UPDATE flights SET status = ? WHERE id = ?",
                params![status.as_str(), id],
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        if updated == 0 {
            return Err(CatalogError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Number of flights in the catalog.
    pub fn len(&self) -> Result<usize, CatalogError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM flights", [], |row| row.get(0))
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, CatalogError> {
        Ok(self.len()? == 0)
    }

    fn parse_timestamp(value: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    column,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
    }

    fn invalid_enum(column: usize, value: &str) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Text,
            format!("unknown value: {}", value).into(),
        )
    }

    fn row_to_flight(row: &rusqlite::Row) -> rusqlite::Result<Flight> {
        let departure_str: String = row.get(3)?;
        let return_str: String = row.get(4)?;
        let type_str: String = row.get(5)?;
        let status_str: String = row.get(9)?;
        let price_cents: i64 = row.get(7)?;

        Ok(Flight {
            id: row.get(0)?,
            aircraft: Aircraft {
                registration: row.get(1)?,
                model: row.get(2)?,
            },
            departure_at: Self::parse_timestamp(&departure_str, 3)?,
            estimated_return_at: Self::parse_timestamp(&return_str, 4)?,
            flight_type: FlightType::parse(&type_str)
                .ok_or_else(|| Self::invalid_enum(5, &type_str))?,
            capacity: row.get(6)?,
            price_cents: price_cents.max(0) as u64,
            description: row.get(8)?,
            status: FlightStatus::parse(&status_str)
                .ok_or_else(|| Self::invalid_enum(9, &status_str))?,
        })
    }
}

impl FlightCatalog for SqliteFlightCatalog {
    fn list_flights(&self, filter: &FlightFilter) -> Result<FlightListing, CatalogError> {
        let conn = self.lock()?;

        let sql = format!("SELECT {} FROM flights ORDER BY seq ASC", FLIGHT_COLUMNS);
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_flight)
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut flights = Vec::new();
        for row_result in rows {
            flights.push(row_result.map_err(|e| CatalogError::Database(e.to_string()))?);
        }

        Ok(FlightListing::new(flights, filter.clone()))
    }

    fn get_flight(&self, id: &str) -> Result<Flight, CatalogError> {
        let conn = self.lock()?;

        let sql = format!("SELECT {} FROM flights WHERE id = ?", FLIGHT_COLUMNS);
        let result = conn.query_row(&sql, params![id], Self::row_to_flight);

        match result {
            Ok(flight) => Ok(flight),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(CatalogError::NotFound(id.to_string())),
            Err(e) => Err(CatalogError::Database(e.to_string())),
        }
    }
}
