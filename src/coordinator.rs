//! Run Coordinator (C6): drives all five detectors across a year range,
//! records run metadata, publishes progress, and marks the range
//! `complete` or `failed`. The sole suspension point in the pipeline —
//! detectors themselves run to completion for a year before the
//! coordinator checks for cancellation again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use log::{error, info};

use crate::config::EngineConfig;
use crate::detectors::{aspect, eclipse, lunar_phase, planet_phase, solar_event};
use crate::ephemeris::Ephemeris;
use crate::error::{CoreError, CoreResult};
use crate::store::models::RunMetadata;
use crate::store::models::RunStatus;
use crate::store::Store;

const DETECTORS_PER_YEAR: i64 = 5;

/// Cooperative cancellation flag, checked between years and between
/// detectors — never inside a detector's per-year scan.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of a completed or cancelled coordinator run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub events_count: i64,
    pub cancelled: bool,
}

pub struct Coordinator<'a> {
    store: &'a mut Store,
    ephem: &'a dyn Ephemeris,
    config: &'a EngineConfig,
}

impl<'a> Coordinator<'a> {
    pub fn new(store: &'a mut Store, ephem: &'a dyn Ephemeris, config: &'a EngineConfig) -> Self {
        store.set_batch_size(config.store.batch_size);
        Coordinator { store, ephem, config }
    }

    /// Run every detector for every year in `[start_year, end_year]`,
    /// publishing `(percent, message)` progress after each detector.
    pub fn run(
        &mut self,
        start_year: i32,
        end_year: i32,
        cancel: &CancellationToken,
        mut progress: impl FnMut(f64, &str),
    ) -> CoreResult<RunOutcome> {
        if start_year > end_year {
            return Err(CoreError::InvalidRange { start_year, end_year });
        }

        let num_years = (end_year - start_year + 1) as i64;
        let total_steps = (num_years * DETECTORS_PER_YEAR).max(1);
        let mut current_step: i64 = 0;
        let mut events_count: i64 = 0;

        self.store.upsert_run_metadata(&RunMetadata {
            start_year,
            end_year,
            calculation_timestamp: Utc::now(),
            status: RunStatus::InProgress,
            events_count: 0,
        })?;

        if let Err(e) = self.store.ensure_catalog() {
            self.mark_failed(start_year, end_year, events_count)?;
            return Err(e);
        }

        let mut cancelled = false;

        'years: for year in start_year..=end_year {
            if cancel.is_cancelled() {
                cancelled = true;
                break 'years;
            }

            macro_rules! step {
                ($label:expr, $body:expr) => {{
                    match $body {
                        Ok(count) => {
                            events_count += count;
                            current_step += 1;
                            let pct = 100.0 * current_step as f64 / total_steps as f64;
                            progress(pct, &format!("{}: {year}", $label));
                        }
                        Err(e) => {
                            error!("{} failed for {year}: {e}", $label);
                            self.mark_failed(start_year, end_year, events_count)?;
                            return Err(e);
                        }
                    }
                    if cancel.is_cancelled() {
                        cancelled = true;
                        break 'years;
                    }
                }};
            }

            step!("aspects", {
                let events = aspect::detect(
                    year,
                    self.ephem,
                    &self.config.orbs,
                    self.config.scan.aspect_step_hours,
                );
                let n = events.len() as i64;
                self.store.insert_aspects(&events).map(|_| n)
            });

            step!("lunar phases", {
                let events = lunar_phase::detect(year, self.ephem);
                let n = events.len() as i64;
                self.store.insert_lunar_phases(&events).map(|_| n)
            });

            step!("planet phases", {
                let events = planet_phase::detect(
                    year,
                    self.ephem,
                    self.config.scan.planet_phase_debounce_days,
                );
                let n = events.len() as i64;
                self.store.insert_planet_phases(&events).map(|_| n)
            });

            step!("eclipses", {
                let events = eclipse::detect(year, self.ephem, self.config.scan.eclipse_advance_days);
                let n = events.len() as i64;
                self.store.insert_eclipses(&events).map(|_| n)
            });

            step!("solar events", {
                let events = solar_event::detect(year, self.ephem);
                let n = events.len() as i64;
                self.store.insert_solar_events(&events).map(|_| n)
            });
        }

        let status = if cancelled {
            RunStatus::InProgress
        } else {
            RunStatus::Complete
        };

        self.store.upsert_run_metadata(&RunMetadata {
            start_year,
            end_year,
            calculation_timestamp: Utc::now(),
            status,
            events_count,
        })?;

        if !cancelled {
            info!("run {start_year}-{end_year} complete: {events_count} events");
        } else {
            info!("run {start_year}-{end_year} cancelled after {events_count} events");
        }

        Ok(RunOutcome {
            status,
            events_count,
            cancelled,
        })
    }

    fn mark_failed(&mut self, start_year: i32, end_year: i32, events_count: i64) -> CoreResult<()> {
        self.store.upsert_run_metadata(&RunMetadata {
            start_year,
            end_year,
            calculation_timestamp: Utc::now(),
            status: RunStatus::Failed,
            events_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::LowPrecisionEphemeris;

    #[test]
    fn rejects_inverted_range_before_any_writes() {
        let mut store = Store::open_in_memory().unwrap();
        let ephem = LowPrecisionEphemeris::new();
        let config = EngineConfig::default();
        let mut coordinator = Coordinator::new(&mut store, &ephem, &config);
        let cancel = CancellationToken::new();
        let result = coordinator.run(2005, 2000, &cancel, |_, _| {});
        assert!(matches!(result, Err(CoreError::InvalidRange { .. })));
    }

    #[test]
    fn completes_a_single_year_and_reports_monotonic_progress() {
        let mut store = Store::open_in_memory().unwrap();
        let ephem = LowPrecisionEphemeris::new();
        let config = EngineConfig::default();
        let mut coordinator = Coordinator::new(&mut store, &ephem, &config);
        let cancel = CancellationToken::new();

        let mut last_pct = -1.0;
        let mut monotonic = true;
        let outcome = coordinator
            .run(2000, 2000, &cancel, |pct, _msg| {
                if pct < last_pct {
                    monotonic = false;
                }
                last_pct = pct;
            })
            .unwrap();

        assert!(monotonic);
        assert!(last_pct >= 99.0);
        assert_eq!(outcome.status, RunStatus::Complete);
        assert!(outcome.events_count > 0);
        assert!(!outcome.cancelled);
    }

    #[test]
    fn cancellation_between_years_stops_the_run_early() {
        let mut store = Store::open_in_memory().unwrap();
        let ephem = LowPrecisionEphemeris::new();
        let config = EngineConfig::default();
        let mut coordinator = Coordinator::new(&mut store, &ephem, &config);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = coordinator.run(2000, 2002, &cancel, |_, _| {}).unwrap();
        assert!(outcome.cancelled);
        assert_eq!(outcome.events_count, 0);
    }
}
