//! Store (C5): schema, catalog, idempotent batch inserts.
//!
//! Backed by SQLite via `rusqlite` (see DESIGN.md Open Question 1 for
//! why this crate, uniquely in the corpus, pulls in a relational-store
//! dependency). Every insert is an "INSERT OR REPLACE" against the
//! natural key (§3 invariant 3) and every batch runs inside one
//! transaction, mirroring the source's `database.transaction()` scoping.

pub mod models;
pub mod schema;

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use log::warn;
use rusqlite::{params, Connection};

use crate::angle::sign_index;
use crate::catalog::{Body, CelestialBody};
use crate::error::{CoreError, CoreResult};
use models::{Aspect, Eclipse, LunarPhase, PlanetPhase, RunMetadata, RunStatus, SolarEvent};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// On-disk timestamp format (§6): bare `YYYY-MM-DDTHH:MM:SS`, no offset
/// suffix — every stored timestamp is already UTC.
pub(crate) fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn parse_timestamp(s: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Rows per transaction for batched writes, used when a caller doesn't
/// set one explicitly via [`Store::set_batch_size`]. A tuning knob, not
/// a contract (§4.4).
pub const DEFAULT_BATCH_SIZE: usize = 100;

pub struct Store {
    conn: Connection,
    batch_size: usize,
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Store { conn, batch_size: DEFAULT_BATCH_SIZE };
        store.bootstrap()?;
        Ok(store)
    }

    pub fn open_in_memory() -> CoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Store { conn, batch_size: DEFAULT_BATCH_SIZE };
        store.bootstrap()?;
        Ok(store)
    }

    /// Rows per transaction for every subsequent `insert_*` call (§4.4
    /// "batches of 100"). A failure mid-batch rolls back only that batch;
    /// prior batches committed earlier in the same call remain durable
    /// (§4.5).
    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.batch_size = batch_size.max(1);
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Create tables/indices if missing, then ensure the catalog is
    /// populated. Safe to call repeatedly (§4.5 bootstrap contract).
    pub fn bootstrap(&self) -> CoreResult<()> {
        schema::bootstrap(&self.conn)?;
        self.ensure_catalog()?;
        Ok(())
    }

    /// Re-seed the catalog if it was found empty — the store's
    /// recoverable path for `CatalogMissing` (§7).
    pub fn ensure_catalog(&self) -> CoreResult<()> {
        if schema::catalog_is_populated(&self.conn)? {
            return Ok(());
        }
        warn!("celestial_bodies catalog missing or empty; re-seeding");
        for body in Body::ALL {
            let cb: CelestialBody = body.into();
            self.conn.execute(
                "INSERT OR REPLACE INTO celestial_bodies (id, name, type) VALUES (?1, ?2, ?3)",
                params![cb.id, cb.name, cb.kind.as_str()],
            )?;
        }
        Ok(())
    }

    pub fn insert_aspects(&mut self, aspects: &[Aspect]) -> CoreResult<()> {
        for chunk in aspects.chunks(self.batch_size) {
            let tx = self.conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR REPLACE INTO aspects (
                        body1_id, body2_id, aspect_type, is_major, year,
                        applying_timestamp, exact_timestamp, separation_timestamp,
                        applying_position1, applying_position2,
                        exact_position1, exact_position2,
                        separation_position1, separation_position2
                    ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14)",
                )?;
                for a in chunk {
                    let (b1, b2) = if a.body1_id < a.body2_id {
                        (a.body1_id, a.body2_id)
                    } else {
                        (a.body2_id, a.body1_id)
                    };
                    stmt.execute(params![
                        b1,
                        b2,
                        a.aspect_type.as_str(),
                        a.is_major,
                        a.year,
                        a.applying_timestamp.map(format_timestamp),
                        format_timestamp(a.exact_timestamp),
                        a.separation_timestamp.map(format_timestamp),
                        a.applying_position1,
                        a.applying_position2,
                        a.exact_position1,
                        a.exact_position2,
                        a.separation_position1,
                        a.separation_position2,
                    ])?;
                }
            }
            tx.commit()?;
        }
        Ok(())
    }

    pub fn insert_lunar_phases(&mut self, phases: &[LunarPhase]) -> CoreResult<()> {
        for chunk in phases.chunks(self.batch_size) {
            let tx = self.conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR REPLACE INTO lunar_phases
                        (timestamp, year, phase_type, moon_position, sun_position, zodiac_sign)
                     VALUES (?1,?2,?3,?4,?5,?6)",
                )?;
                for p in chunk {
                    stmt.execute(params![
                        format_timestamp(p.timestamp),
                        p.year,
                        p.phase_kind.as_str(),
                        p.moon_position,
                        p.sun_position,
                        sign_index(p.moon_position) as i64,
                    ])?;
                }
            }
            tx.commit()?;
        }
        Ok(())
    }

    pub fn insert_planet_phases(&mut self, phases: &[PlanetPhase]) -> CoreResult<()> {
        for chunk in phases.chunks(self.batch_size) {
            let tx = self.conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR REPLACE INTO planet_phases
                        (body_id, phase_type, timestamp, year, elongation_degree, zodiac_sign)
                     VALUES (?1,?2,?3,?4,?5,?6)",
                )?;
                for p in chunk {
                    stmt.execute(params![
                        p.body_id,
                        p.phase_kind.as_str(),
                        format_timestamp(p.timestamp),
                        p.year,
                        p.elongation_degree,
                        p.zodiac_sign,
                    ])?;
                }
            }
            tx.commit()?;
        }
        Ok(())
    }

    pub fn insert_eclipses(&mut self, eclipses: &[Eclipse]) -> CoreResult<()> {
        for chunk in eclipses.chunks(self.batch_size) {
            let tx = self.conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR REPLACE INTO eclipses
                        (timestamp, year, eclipse_type, sun_position, moon_position, sun_zodiac, moon_zodiac)
                     VALUES (?1,?2,?3,?4,?5,?6,?7)",
                )?;
                for e in chunk {
                    stmt.execute(params![
                        format_timestamp(e.timestamp),
                        e.year,
                        e.eclipse_kind.as_str(),
                        e.sun_position,
                        e.moon_position,
                        e.sun_zodiac,
                        e.moon_zodiac,
                    ])?;
                }
            }
            tx.commit()?;
        }
        Ok(())
    }

    pub fn insert_solar_events(&mut self, events: &[SolarEvent]) -> CoreResult<()> {
        for chunk in events.chunks(self.batch_size) {
            let tx = self.conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR REPLACE INTO solar_events
                        (timestamp, year, event_type, sun_position, zodiac_sign)
                     VALUES (?1,?2,?3,?4,?5)",
                )?;
                for e in chunk {
                    stmt.execute(params![
                        format_timestamp(e.timestamp),
                        e.year,
                        e.solar_kind.as_str(),
                        e.sun_position,
                        e.zodiac_sign,
                    ])?;
                }
            }
            tx.commit()?;
        }
        Ok(())
    }

    /// Upsert an `in_progress`/`complete`/`failed` row for `(start_year, end_year)`.
    pub fn upsert_run_metadata(&self, meta: &RunMetadata) -> CoreResult<()> {
        self.conn.execute(
            "INSERT INTO calculation_metadata
                (start_year, end_year, calculation_timestamp, status, events_count)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(start_year, end_year) DO UPDATE SET
                calculation_timestamp = excluded.calculation_timestamp,
                status = excluded.status,
                events_count = excluded.events_count",
            params![
                meta.start_year,
                meta.end_year,
                format_timestamp(meta.calculation_timestamp),
                meta.status.as_str(),
                meta.events_count,
            ],
        )?;
        Ok(())
    }

    pub fn run_status(&self, start_year: i32, end_year: i32) -> CoreResult<Option<RunStatus>> {
        let result = self.conn.query_row(
            "SELECT status FROM calculation_metadata WHERE start_year = ?1 AND end_year = ?2",
            params![start_year, end_year],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(s) => Ok(s.parse().ok()),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(CoreError::from(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use models::SolarKind;
    use tempfile::NamedTempFile;

    #[test]
    fn inserts_spanning_several_batches_all_land() {
        let mut store = Store::open_in_memory().unwrap();
        store.set_batch_size(2);

        let events: Vec<SolarEvent> = (0..7)
            .map(|i| SolarEvent {
                timestamp: Utc.with_ymd_and_hms(2000 + i, 3, 20, 0, 0, 0).unwrap(),
                year: 2000 + i,
                solar_kind: SolarKind::SpringEquinox,
                sun_position: 0.0,
                zodiac_sign: 0,
            })
            .collect();
        store.insert_solar_events(&events).unwrap();

        let count: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM solar_events", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 7);
    }

    #[test]
    fn opening_a_real_file_bootstraps_and_survives_reopen() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path();

        {
            let store = Store::open(path).unwrap();
            store
                .upsert_run_metadata(&RunMetadata {
                    start_year: 1950,
                    end_year: 1950,
                    calculation_timestamp: Utc::now(),
                    status: RunStatus::Complete,
                    events_count: 42,
                })
                .unwrap();
        }

        let reopened = Store::open(path).unwrap();
        let status = reopened.run_status(1950, 1950).unwrap();
        assert_eq!(status, Some(RunStatus::Complete));
    }
}
