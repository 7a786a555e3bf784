//! Schema DDL and index creation, grounded on the source repository's
//! `_initialize_tables`/`_create_indexes` column-for-column, with the two
//! deliberate deviations recorded in DESIGN.md: the `eclipses` table has
//! no `node_position`/`eclipse_classification` columns (the source
//! references them without declaring them — a bug, not a contract), and
//! `status` values are the single consistent string `"complete"`.

use rusqlite::{Connection, Result};

pub fn bootstrap(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;

        CREATE TABLE IF NOT EXISTS calculation_metadata (
            id INTEGER PRIMARY KEY,
            start_year INTEGER NOT NULL,
            end_year INTEGER NOT NULL,
            calculation_timestamp TEXT NOT NULL,
            status TEXT NOT NULL,
            events_count INTEGER NOT NULL DEFAULT 0,
            UNIQUE(start_year, end_year)
        );

        CREATE TABLE IF NOT EXISTS celestial_bodies (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            UNIQUE(name)
        );

        -- Reserved for future per-instant position snapshots; the
        -- detectors in this crate never write to it (spec §9).
        CREATE TABLE IF NOT EXISTS positions (
            id INTEGER PRIMARY KEY,
            body_id INTEGER NOT NULL,
            timestamp TEXT NOT NULL,
            year INTEGER NOT NULL,
            is_heliocentric INTEGER NOT NULL,
            absolute_position REAL NOT NULL,
            zodiac_sign INTEGER NOT NULL,
            FOREIGN KEY (body_id) REFERENCES celestial_bodies(id),
            UNIQUE(body_id, timestamp, is_heliocentric)
        );

        CREATE TABLE IF NOT EXISTS aspects (
            id INTEGER PRIMARY KEY,
            body1_id INTEGER NOT NULL,
            body2_id INTEGER NOT NULL,
            aspect_type TEXT NOT NULL,
            is_major INTEGER NOT NULL,
            year INTEGER NOT NULL,
            applying_timestamp TEXT,
            exact_timestamp TEXT NOT NULL,
            separation_timestamp TEXT,
            applying_position1 REAL,
            applying_position2 REAL,
            exact_position1 REAL NOT NULL,
            exact_position2 REAL NOT NULL,
            separation_position1 REAL,
            separation_position2 REAL,
            FOREIGN KEY (body1_id) REFERENCES celestial_bodies(id),
            FOREIGN KEY (body2_id) REFERENCES celestial_bodies(id),
            UNIQUE(body1_id, body2_id, exact_timestamp, aspect_type)
        );

        CREATE TABLE IF NOT EXISTS lunar_phases (
            id INTEGER PRIMARY KEY,
            timestamp TEXT NOT NULL,
            year INTEGER NOT NULL,
            phase_type TEXT NOT NULL,
            moon_position REAL NOT NULL,
            sun_position REAL NOT NULL,
            zodiac_sign INTEGER NOT NULL,
            UNIQUE(timestamp, phase_type)
        );

        CREATE TABLE IF NOT EXISTS planet_phases (
            id INTEGER PRIMARY KEY,
            body_id INTEGER NOT NULL,
            phase_type TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            year INTEGER NOT NULL,
            elongation_degree REAL,
            zodiac_sign INTEGER NOT NULL,
            FOREIGN KEY (body_id) REFERENCES celestial_bodies(id),
            UNIQUE(body_id, timestamp, phase_type)
        );

        CREATE TABLE IF NOT EXISTS eclipses (
            id INTEGER PRIMARY KEY,
            timestamp TEXT NOT NULL,
            year INTEGER NOT NULL,
            eclipse_type TEXT NOT NULL,
            sun_position REAL NOT NULL,
            moon_position REAL NOT NULL,
            sun_zodiac TEXT NOT NULL,
            moon_zodiac TEXT NOT NULL,
            UNIQUE(timestamp, eclipse_type)
        );

        CREATE TABLE IF NOT EXISTS solar_events (
            id INTEGER PRIMARY KEY,
            timestamp TEXT NOT NULL,
            year INTEGER NOT NULL,
            event_type TEXT NOT NULL,
            sun_position REAL NOT NULL,
            zodiac_sign INTEGER NOT NULL,
            UNIQUE(timestamp, event_type)
        );

        CREATE INDEX IF NOT EXISTS idx_positions_body_timestamp ON positions(body_id, timestamp);
        CREATE INDEX IF NOT EXISTS idx_positions_year ON positions(year);
        CREATE INDEX IF NOT EXISTS idx_aspects_bodies ON aspects(body1_id, body2_id);
        CREATE INDEX IF NOT EXISTS idx_aspects_exact_timestamp ON aspects(exact_timestamp);
        CREATE INDEX IF NOT EXISTS idx_aspects_year ON aspects(year);
        CREATE INDEX IF NOT EXISTS idx_lunar_phases_timestamp ON lunar_phases(timestamp);
        CREATE INDEX IF NOT EXISTS idx_lunar_phases_year ON lunar_phases(year);
        CREATE INDEX IF NOT EXISTS idx_planet_phases_timestamp ON planet_phases(timestamp);
        CREATE INDEX IF NOT EXISTS idx_planet_phases_year ON planet_phases(year);
        CREATE INDEX IF NOT EXISTS idx_eclipses_timestamp ON eclipses(timestamp);
        CREATE INDEX IF NOT EXISTS idx_eclipses_year ON eclipses(year);
        CREATE INDEX IF NOT EXISTS idx_solar_events_timestamp ON solar_events(timestamp);
        CREATE INDEX IF NOT EXISTS idx_solar_events_year ON solar_events(year);
        ",
    )
}

/// `true` once the catalog table exists and has at least one row —
/// used by the coordinator to decide whether a re-bootstrap is needed
/// (spec §4.5's "absence of the catalog table is a recoverable condition").
pub fn catalog_is_populated(conn: &Connection) -> Result<bool> {
    let table_exists: bool = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='celestial_bodies'",
        [],
        |row| row.get::<_, i64>(0).map(|c| c > 0),
    )?;
    if !table_exists {
        return Ok(false);
    }
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM celestial_bodies", [], |row| row.get(0))?;
    Ok(count > 0)
}
