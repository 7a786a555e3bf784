//! Eclipse detector: delegates bracket-finding to the ephemeris's own
//! eclipse search, iterating forward by `eclipse_advance_days` after each
//! find until a padded window around the target year is exhausted.

use chrono::Datelike;
use log::warn;

use crate::angle::sign_name;
use crate::catalog::Body;
use crate::ephemeris::{jd_to_datetime, julian_day, Ephemeris, EphemerisMode};
use crate::store::models::{Eclipse, EclipseKind};

const WINDOW_PAD_DAYS: f64 = 15.0;

fn build_record(
    ephem: &dyn Ephemeris,
    jd: f64,
    kind: EclipseKind,
    year: i32,
) -> Option<Eclipse> {
    let sun = ephem.position(jd, Body::Sun, EphemerisMode::Geocentric).ok()?;
    let moon = ephem.position(jd, Body::Moon, EphemerisMode::Geocentric).ok()?;
    Some(Eclipse {
        timestamp: jd_to_datetime(jd),
        year,
        eclipse_kind: kind,
        sun_position: sun.longitude,
        moon_position: moon.longitude,
        sun_zodiac: sign_name(sun.longitude).to_string(),
        moon_zodiac: sign_name(moon.longitude).to_string(),
    })
}

/// Run the eclipse scan for one calendar year, both solar and lunar.
pub fn detect(year: i32, ephem: &dyn Ephemeris, advance_days: i64) -> Vec<Eclipse> {
    let year_start = julian_day(year, 1, 1.0);
    let year_end = julian_day(year + 1, 1, 1.0);
    let window_start = year_start - WINDOW_PAD_DAYS;
    let window_end = year_end + WINDOW_PAD_DAYS;

    let mut out = Vec::new();

    let mut jd = window_start;
    while jd < window_end {
        match ephem.next_solar_eclipse(jd) {
            Ok(obs) => {
                if obs.jd >= window_end {
                    break;
                }
                if obs.jd >= year_start && obs.jd < year_end {
                    let kind = EclipseKind::from_solar_bits(obs.classification_bits);
                    if let Some(record) = build_record(ephem, obs.jd, kind, year) {
                        if record.timestamp.year() == year {
                            out.push(record);
                        }
                    }
                }
                jd = obs.jd + advance_days as f64;
            }
            Err(e) => {
                warn!("solar eclipse search stalled at jd={jd}: {e}");
                break;
            }
        }
    }

    let mut jd = window_start;
    while jd < window_end {
        match ephem.next_lunar_eclipse(jd) {
            Ok(obs) => {
                if obs.jd >= window_end {
                    break;
                }
                if obs.jd >= year_start && obs.jd < year_end {
                    let kind = EclipseKind::from_lunar_bits(obs.classification_bits);
                    if let Some(record) = build_record(ephem, obs.jd, kind, year) {
                        if record.timestamp.year() == year {
                            out.push(record);
                        }
                    }
                }
                jd = obs.jd + advance_days as f64;
            }
            Err(e) => {
                warn!("lunar eclipse search stalled at jd={jd}: {e}");
                break;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::LowPrecisionEphemeris;

    #[test]
    fn finds_at_least_one_eclipse_candidate_in_2000() {
        let ephem = LowPrecisionEphemeris::new();
        let events = detect(2000, &ephem, 10);
        assert!(!events.is_empty());
        for e in &events {
            assert_eq!(e.timestamp.year(), 2000);
        }
    }

    #[test]
    fn classifications_split_between_solar_and_lunar() {
        let ephem = LowPrecisionEphemeris::new();
        let events = detect(2001, &ephem, 10);
        let solar = events
            .iter()
            .filter(|e| {
                matches!(
                    e.eclipse_kind,
                    EclipseKind::SolarTotal | EclipseKind::SolarAnnular | EclipseKind::SolarPartial
                )
            })
            .count();
        let lunar = events.len() - solar;
        assert!(solar > 0 && lunar > 0);
    }
}
