//! Query API (C7): filtered reads, ascending by `exact_timestamp`/`timestamp`.
//!
//! Grounded on `astrological_events_repository.py`'s `get_aspects`/
//! `get_eclipses`/`get_lunar_phases`/`get_planet_phases`/
//! `get_available_date_range`/`get_calculation_status` — dynamic SQL
//! with JOINs there becomes typed filter structs here (§4.8 ambient
//! style note): idiomatic Rust prefers a small struct of `Option`s over
//! a long positional-optional argument list. Every query below uses a
//! fixed SQL string with sentinel "unset" parameter values rather than
//! conditionally concatenated SQL, so the bound-parameter count never
//! drifts from the placeholder count.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::error::CoreResult;
use crate::store::models::{
    Aspect, AspectType, CalendarEvent, Eclipse, EclipseKind, LunarPhase, LunarPhaseKind,
    PlanetPhase, PlanetPhaseKind, RunStatus, SolarEvent, SolarKind,
};
use crate::store::{format_timestamp, parse_timestamp, Store};

const UNSET_ID: i64 = -1;
const UNSET_BOOL: i64 = -1;
const UNSET_STR: &str = "";

#[derive(Debug, Clone, Default)]
pub struct AspectFilter {
    pub body1_id: Option<i64>,
    pub body2_id: Option<i64>,
    pub aspect_type: Option<AspectType>,
    pub is_major: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct LunarPhaseFilter {
    pub phase_kind: Option<LunarPhaseKind>,
}

#[derive(Debug, Clone, Default)]
pub struct PlanetPhaseFilter {
    pub body_id: Option<i64>,
    pub phase_kind: Option<PlanetPhaseKind>,
}

#[derive(Debug, Clone, Default)]
pub struct EclipseFilter {
    pub eclipse_kind: Option<EclipseKind>,
}

#[derive(Debug, Clone, Default)]
pub struct SolarEventFilter {
    pub solar_kind: Option<SolarKind>,
}

#[derive(Debug, Clone)]
pub struct CalculationStatus {
    pub known_ranges: Vec<(i32, i32, RunStatus)>,
    pub total_aspects: i64,
    pub total_lunar_phases: i64,
    pub total_planet_phases: i64,
    pub total_eclipses: i64,
    pub total_solar_events: i64,
}

/// The read-only surface consumed by callers (§4.7). Wraps a [`Store`]
/// without owning its write path.
pub struct QueryApi<'a> {
    store: &'a Store,
}

impl<'a> QueryApi<'a> {
    pub fn new(store: &'a Store) -> Self {
        QueryApi { store }
    }

    pub fn get_aspects(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        filter: &AspectFilter,
    ) -> CoreResult<Vec<Aspect>> {
        let conn = self.store.connection();
        let mut stmt = conn.prepare(
            "SELECT body1_id, body2_id, aspect_type, is_major, year,
                    applying_timestamp, exact_timestamp, separation_timestamp,
                    applying_position1, applying_position2,
                    exact_position1, exact_position2,
                    separation_position1, separation_position2
             FROM aspects
             WHERE exact_timestamp BETWEEN ?1 AND ?2
               AND (?3 = -1 OR body1_id = ?3 OR body2_id = ?3)
               AND (?4 = -1 OR body1_id = ?4 OR body2_id = ?4)
               AND (?5 = '' OR aspect_type = ?5)
               AND (?6 = -1 OR is_major = ?6)
             ORDER BY exact_timestamp ASC",
        )?;

        let body1 = filter.body1_id.unwrap_or(UNSET_ID);
        let body2 = filter.body2_id.unwrap_or(UNSET_ID);
        let aspect_type_str = filter.aspect_type.map(|a| a.as_str()).unwrap_or(UNSET_STR);
        let is_major = filter.is_major.map(|b| b as i64).unwrap_or(UNSET_BOOL);

        let rows = stmt.query_map(
            params![
                format_timestamp(start),
                format_timestamp(end),
                body1,
                body2,
                aspect_type_str,
                is_major
            ],
            |row| {
                Ok(Aspect {
                    body1_id: row.get(0)?,
                    body2_id: row.get(1)?,
                    aspect_type: AspectType::from_str(&row.get::<_, String>(2)?)
                        .unwrap_or(AspectType::Conjunction),
                    is_major: row.get(3)?,
                    year: row.get(4)?,
                    applying_timestamp: parse_opt_ts(row.get::<_, Option<String>>(5)?),
                    exact_timestamp: parse_ts(row.get::<_, String>(6)?),
                    separation_timestamp: parse_opt_ts(row.get::<_, Option<String>>(7)?),
                    applying_position1: row.get(8)?,
                    applying_position2: row.get(9)?,
                    exact_position1: row.get(10)?,
                    exact_position2: row.get(11)?,
                    separation_position1: row.get(12)?,
                    separation_position2: row.get(13)?,
                })
            },
        )?;
        collect(rows)
    }

    pub fn get_lunar_phases(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        filter: &LunarPhaseFilter,
    ) -> CoreResult<Vec<LunarPhase>> {
        let conn = self.store.connection();
        let mut stmt = conn.prepare(
            "SELECT timestamp, year, phase_type, moon_position, sun_position, zodiac_sign
             FROM lunar_phases
             WHERE timestamp BETWEEN ?1 AND ?2
               AND (?3 = '' OR phase_type = ?3)
             ORDER BY timestamp ASC",
        )?;
        let phase_str = filter.phase_kind.map(|p| p.as_str()).unwrap_or(UNSET_STR);
        let rows = stmt.query_map(params![format_timestamp(start), format_timestamp(end), phase_str], |row| {
            Ok(LunarPhase {
                timestamp: parse_ts(row.get::<_, String>(0)?),
                year: row.get(1)?,
                phase_kind: LunarPhaseKind::from_str(&row.get::<_, String>(2)?)
                    .unwrap_or(LunarPhaseKind::NewMoon),
                moon_position: row.get(3)?,
                sun_position: row.get(4)?,
                zodiac_sign: row.get(5)?,
            })
        })?;
        collect(rows)
    }

    pub fn get_planet_phases(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        filter: &PlanetPhaseFilter,
    ) -> CoreResult<Vec<PlanetPhase>> {
        let conn = self.store.connection();
        let mut stmt = conn.prepare(
            "SELECT body_id, phase_type, timestamp, year, elongation_degree, zodiac_sign
             FROM planet_phases
             WHERE timestamp BETWEEN ?1 AND ?2
               AND (?3 = -1 OR body_id = ?3)
               AND (?4 = '' OR phase_type = ?4)
             ORDER BY timestamp ASC",
        )?;
        let body_id = filter.body_id.unwrap_or(UNSET_ID);
        let phase_str = filter.phase_kind.map(|p| p.as_str()).unwrap_or(UNSET_STR);
        let rows = stmt.query_map(
            params![format_timestamp(start), format_timestamp(end), body_id, phase_str],
            |row| {
                Ok(PlanetPhase {
                    body_id: row.get(0)?,
                    phase_kind: PlanetPhaseKind::from_str(&row.get::<_, String>(1)?)
                        .unwrap_or(PlanetPhaseKind::StationaryDirect),
                    timestamp: parse_ts(row.get::<_, String>(2)?),
                    year: row.get(3)?,
                    elongation_degree: row.get(4)?,
                    zodiac_sign: row.get(5)?,
                })
            },
        )?;
        collect(rows)
    }

    pub fn get_eclipses(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        filter: &EclipseFilter,
    ) -> CoreResult<Vec<Eclipse>> {
        let conn = self.store.connection();
        let mut stmt = conn.prepare(
            "SELECT timestamp, year, eclipse_type, sun_position, moon_position, sun_zodiac, moon_zodiac
             FROM eclipses
             WHERE timestamp BETWEEN ?1 AND ?2
               AND (?3 = '' OR eclipse_type = ?3)
             ORDER BY timestamp ASC",
        )?;
        let kind_str = filter.eclipse_kind.map(|k| k.as_str()).unwrap_or(UNSET_STR);
        let rows = stmt.query_map(params![format_timestamp(start), format_timestamp(end), kind_str], |row| {
            Ok(Eclipse {
                timestamp: parse_ts(row.get::<_, String>(0)?),
                year: row.get(1)?,
                eclipse_kind: EclipseKind::from_str(&row.get::<_, String>(2)?)
                    .unwrap_or(EclipseKind::SolarPartial),
                sun_position: row.get(3)?,
                moon_position: row.get(4)?,
                sun_zodiac: row.get(5)?,
                moon_zodiac: row.get(6)?,
            })
        })?;
        collect(rows)
    }

    pub fn get_solar_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        filter: &SolarEventFilter,
    ) -> CoreResult<Vec<SolarEvent>> {
        let conn = self.store.connection();
        let mut stmt = conn.prepare(
            "SELECT timestamp, year, event_type, sun_position, zodiac_sign
             FROM solar_events
             WHERE timestamp BETWEEN ?1 AND ?2
               AND (?3 = '' OR event_type = ?3)
             ORDER BY timestamp ASC",
        )?;
        let kind_str = filter.solar_kind.map(|k| k.as_str()).unwrap_or(UNSET_STR);
        let rows = stmt.query_map(params![format_timestamp(start), format_timestamp(end), kind_str], |row| {
            Ok(SolarEvent {
                timestamp: parse_ts(row.get::<_, String>(0)?),
                year: row.get(1)?,
                solar_kind: SolarKind::from_str(&row.get::<_, String>(2)?)
                    .unwrap_or(SolarKind::SpringEquinox),
                sun_position: row.get(3)?,
                zodiac_sign: row.get(4)?,
            })
        })?;
        collect(rows)
    }

    /// A single chronological stream over all five event kinds (§9
    /// "tagged-union events vs. table-per-kind"), for callers that want
    /// one feed rather than five separate queries. Aspects sort by
    /// `exact_timestamp`, everything else by `timestamp`.
    pub fn get_calendar_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CoreResult<Vec<CalendarEvent>> {
        let mut events: Vec<(DateTime<Utc>, CalendarEvent)> = Vec::new();

        for a in self.get_aspects(start, end, &AspectFilter::default())? {
            events.push((a.exact_timestamp, CalendarEvent::Aspect(a)));
        }
        for p in self.get_lunar_phases(start, end, &LunarPhaseFilter::default())? {
            events.push((p.timestamp, CalendarEvent::LunarPhase(p)));
        }
        for p in self.get_planet_phases(start, end, &PlanetPhaseFilter::default())? {
            events.push((p.timestamp, CalendarEvent::PlanetPhase(p)));
        }
        for e in self.get_eclipses(start, end, &EclipseFilter::default())? {
            events.push((e.timestamp, CalendarEvent::Eclipse(e)));
        }
        for e in self.get_solar_events(start, end, &SolarEventFilter::default())? {
            events.push((e.timestamp, CalendarEvent::SolarEvent(e)));
        }

        events.sort_by_key(|(ts, _)| *ts);
        Ok(events.into_iter().map(|(_, event)| event).collect())
    }

    /// `(min_year, max_year)` derived from `complete` metadata rows,
    /// falling back to scanning event tables if no run has completed.
    pub fn get_available_date_range(&self) -> CoreResult<Option<(i32, i32)>> {
        let conn = self.store.connection();
        let from_metadata: Option<(i32, i32)> = conn.query_row(
            "SELECT MIN(start_year), MAX(end_year) FROM calculation_metadata WHERE status = 'complete'",
            [],
            |row| {
                let min: Option<i32> = row.get(0)?;
                let max: Option<i32> = row.get(1)?;
                Ok(min.zip(max))
            },
        )?;
        if from_metadata.is_some() {
            return Ok(from_metadata);
        }

        let tables = [
            "aspects",
            "lunar_phases",
            "planet_phases",
            "eclipses",
            "solar_events",
        ];
        let mut min_year: Option<i32> = None;
        let mut max_year: Option<i32> = None;
        for table in tables {
            let sql = format!("SELECT MIN(year), MAX(year) FROM {table}");
            let (lo, hi): (Option<i32>, Option<i32>) =
                conn.query_row(&sql, [], |row| Ok((row.get(0)?, row.get(1)?)))?;
            if let Some(lo) = lo {
                min_year = Some(min_year.map_or(lo, |m| m.min(lo)));
            }
            if let Some(hi) = hi {
                max_year = Some(max_year.map_or(hi, |m| m.max(hi)));
            }
        }
        Ok(min_year.zip(max_year))
    }

    pub fn get_calculation_status(&self) -> CoreResult<CalculationStatus> {
        let conn = self.store.connection();
        let mut stmt = conn
            .prepare("SELECT start_year, end_year, status FROM calculation_metadata ORDER BY start_year")?;
        let known_ranges = stmt
            .query_map([], |row| {
                let status_str: String = row.get(2)?;
                Ok((
                    row.get::<_, i32>(0)?,
                    row.get::<_, i32>(1)?,
                    RunStatus::from_str(&status_str).unwrap_or(RunStatus::Failed),
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let count = |table: &str| -> CoreResult<i64> {
            let sql = format!("SELECT COUNT(*) FROM {table}");
            Ok(conn.query_row(&sql, [], |row| row.get(0))?)
        };

        Ok(CalculationStatus {
            known_ranges,
            total_aspects: count("aspects")?,
            total_lunar_phases: count("lunar_phases")?,
            total_planet_phases: count("planet_phases")?,
            total_eclipses: count("eclipses")?,
            total_solar_events: count("solar_events")?,
        })
    }
}

fn parse_ts(s: String) -> DateTime<Utc> {
    parse_timestamp(&s)
}

fn parse_opt_ts(s: Option<String>) -> Option<DateTime<Utc>> {
    s.map(parse_ts)
}

fn collect<T>(
    rows: rusqlite::MappedRows<'_, impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>>,
) -> CoreResult<Vec<T>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::coordinator::{CancellationToken, Coordinator};
    use crate::ephemeris::LowPrecisionEphemeris;
    use crate::store::Store;
    use chrono::TimeZone;

    #[test]
    fn calendar_events_are_merged_and_chronologically_sorted() {
        let mut store = Store::open_in_memory().unwrap();
        let ephem = LowPrecisionEphemeris::new();
        let config = EngineConfig::default();
        let mut coordinator = Coordinator::new(&mut store, &ephem, &config);
        coordinator.run(2000, 2000, &CancellationToken::new(), |_, _| {}).unwrap();

        let query = QueryApi::new(&store);
        let start = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
        let events = query.get_calendar_events(start, end).unwrap();

        let status = query.get_calculation_status().unwrap();
        let expected_total = status.total_aspects
            + status.total_lunar_phases
            + status.total_planet_phases
            + status.total_eclipses
            + status.total_solar_events;
        assert_eq!(events.len() as i64, expected_total);

        fn ts(e: &CalendarEvent) -> DateTime<Utc> {
            match e {
                CalendarEvent::Aspect(a) => a.exact_timestamp,
                CalendarEvent::LunarPhase(p) => p.timestamp,
                CalendarEvent::PlanetPhase(p) => p.timestamp,
                CalendarEvent::Eclipse(e) => e.timestamp,
                CalendarEvent::SolarEvent(e) => e.timestamp,
            }
        }
        for pair in events.windows(2) {
            assert!(ts(&pair[0]) <= ts(&pair[1]));
        }
    }
}
