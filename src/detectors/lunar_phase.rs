//! Lunar-phase detector: new/first-quarter/full/last-quarter via a
//! quarter-cycle forward scan (~7.38 days, a quarter of the 29.53-day
//! synodic month) with bisection refinement, padded a month on each side
//! of the target year to catch phases straddling the boundary.

use chrono::Datelike;

use crate::angle::{self, sign_index};
use crate::catalog::Body;
use crate::ephemeris::{jd_to_datetime, julian_day, Ephemeris, EphemerisMode};
use crate::root_finder::bisect;
use crate::store::models::{LunarPhase, LunarPhaseKind};

const QUARTER_CYCLE_DAYS: f64 = 29.530_588 / 4.0;

/// Moon's longitude minus Sun's longitude, re-centered so the target angle
/// sits at zero — gives the root finder a clean sign change to bisect on.
fn centered_diff(ephem: &dyn Ephemeris, jd: f64, target: f64) -> Option<f64> {
    let moon = ephem.position(jd, Body::Moon, EphemerisMode::Geocentric).ok()?;
    let sun = ephem.position(jd, Body::Sun, EphemerisMode::Geocentric).ok()?;
    let raw = angle::wrapped_diff(moon.longitude, sun.longitude);
    let centered = raw - target;
    Some(((centered + 180.0) % 360.0 + 360.0) % 360.0 - 180.0)
}

fn positions_at(ephem: &dyn Ephemeris, jd: f64) -> Option<(f64, f64)> {
    let moon = ephem.position(jd, Body::Moon, EphemerisMode::Geocentric).ok()?;
    let sun = ephem.position(jd, Body::Sun, EphemerisMode::Geocentric).ok()?;
    Some((moon.longitude, sun.longitude))
}

/// Run the lunar-phase scan for one calendar year.
pub fn detect(year: i32, ephem: &dyn Ephemeris) -> Vec<LunarPhase> {
    let window_start = julian_day(year - 1, 12, 1.0);
    let window_end = julian_day(year + 1, 1, 31.0) + 1.0;

    let mut out = Vec::new();

    for kind in LunarPhaseKind::ALL {
        let target = kind.target_angle();
        let mut t = window_start;
        let Some(mut prev_g) = centered_diff(ephem, t, target) else {
            continue;
        };

        while t < window_end {
            let next_t = t + QUARTER_CYCLE_DAYS;
            let Some(next_g) = centered_diff(ephem, next_t, target) else {
                t = next_t;
                continue;
            };

            if prev_g == 0.0 || prev_g.signum() != next_g.signum() {
                let result = bisect(t, next_t, |jd| centered_diff(ephem, jd, target).unwrap_or(0.0));
                if let Some((moon_lon, sun_lon)) = positions_at(ephem, result.t) {
                    let dt = jd_to_datetime(result.t);
                    if dt.year() == year {
                        out.push(LunarPhase {
                            timestamp: dt,
                            year,
                            phase_kind: kind,
                            moon_position: moon_lon,
                            sun_position: sun_lon,
                            zodiac_sign: sign_index(moon_lon) as i64,
                        });
                    }
                }
            }

            t = next_t;
            prev_g = next_g;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::LowPrecisionEphemeris;

    #[test]
    fn finds_twelve_or_thirteen_of_each_phase_in_a_year() {
        let ephem = LowPrecisionEphemeris::new();
        let events = detect(2000, &ephem);
        for kind in LunarPhaseKind::ALL {
            let count = events.iter().filter(|e| e.phase_kind == kind).count();
            assert!(
                (12..=13).contains(&count),
                "kind {kind:?} had {count} occurrences"
            );
        }
    }

    #[test]
    fn full_moons_are_spaced_about_one_synodic_month_apart() {
        let ephem = LowPrecisionEphemeris::new();
        let events = detect(2000, &ephem);
        let mut full_moons: Vec<_> = events
            .iter()
            .filter(|e| e.phase_kind == LunarPhaseKind::FullMoon)
            .map(|e| e.timestamp)
            .collect();
        full_moons.sort();
        for pair in full_moons.windows(2) {
            let days = (pair[1] - pair[0]).num_seconds() as f64 / 86_400.0;
            assert!((days - 29.5).abs() < 1.5, "gap was {days} days");
        }
    }

    #[test]
    fn all_events_fall_within_the_target_year() {
        let ephem = LowPrecisionEphemeris::new();
        let events = detect(2023, &ephem);
        assert!(!events.is_empty());
        for e in &events {
            assert_eq!(e.timestamp.year(), 2023);
            assert_eq!(e.year, 2023);
        }
    }
}
