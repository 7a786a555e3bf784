//! Aspect detector: 6-hour scan across a year over all 55 body pairs and
//! all 11 aspect types, aggregated into one event per `(pair, aspect,
//! month)` bucket.
//!
//! Grounded on `original_source`'s `_calculate_aspects_for_year`: contacts
//! are deduplicated per calendar day via a daily-pair cache keyed on
//! `(pair, aspect, month, day)`, then merged per month bucket with
//! smallest-orb-wins for `exact` and always-latest for `separating`.
//! `applying` is fixed at the bucket's first contact, since the scan
//! visits ticks in ascending time order. The cache is cleared at the
//! first tick of each month purely to bound its memory — by then every
//! key it could hold belongs to a month that's already fully scanned.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Timelike};
use log::warn;

use crate::angle;
use crate::catalog::{aspect_pairs, Body};
use crate::config::OrbConfig;
use crate::ephemeris::{jd_to_datetime, julian_day, Ephemeris, EphemerisMode};
use crate::store::models::{Aspect, AspectType};

struct Accumulator {
    applying_jd: f64,
    applying_pos1: f64,
    applying_pos2: f64,
    exact_jd: f64,
    exact_orb: f64,
    exact_pos1: f64,
    exact_pos2: f64,
    separating_jd: f64,
    separating_pos1: f64,
    separating_pos2: f64,
}

/// Run the aspect scan for one calendar year.
pub fn detect(year: i32, ephem: &dyn Ephemeris, orbs: &OrbConfig, step_hours: i64) -> Vec<Aspect> {
    let pairs = aspect_pairs();
    let step_days = step_hours as f64 / 24.0;

    let start_jd = julian_day(year, 1, 1.0);
    let next_year_jd = julian_day(year + 1, 1, 1.0);

    let mut processed: HashMap<(Body, Body, AspectType, u32), Accumulator> = HashMap::new();
    let mut checked_today: HashSet<(Body, Body, AspectType, u32, u32)> = HashSet::new();

    let mut jd = start_jd;
    while jd < next_year_jd {
        let dt = jd_to_datetime(jd);
        let month = dt.month();
        let day_of_month = dt.day();
        if day_of_month == 1 && (dt.hour() as f64) < step_hours as f64 {
            checked_today.clear();
        }

        let mut positions: HashMap<Body, f64> = HashMap::with_capacity(Body::ALL.len());
        for body in Body::ALL {
            match ephem.position(jd, body, EphemerisMode::Geocentric) {
                Ok(pos) => {
                    positions.insert(body, pos.longitude);
                }
                Err(e) => {
                    warn!("aspect scan: position unavailable for {body} at jd={jd}: {e}");
                }
            }
        }

        for (b1, b2) in &pairs {
            let (Some(&pos1), Some(&pos2)) = (positions.get(b1), positions.get(b2)) else {
                continue;
            };

            for (aspect_type, aspect_angle) in AspectType::ALL_WITH_ANGLE {
                let daily_key = (*b1, *b2, aspect_type, month, day_of_month);
                if checked_today.contains(&daily_key) {
                    continue;
                }
                checked_today.insert(daily_key);

                if !orbs.include_minor && !aspect_type.is_major() {
                    continue;
                }

                let max_orb = if aspect_type.is_major() {
                    orbs.major_orb_deg
                } else {
                    orbs.minor_orb_deg
                };

                let Some(orb) = angle::aspect_orb(pos1, pos2, aspect_angle, max_orb) else {
                    continue;
                };

                let strength = 100.0 * (1.0 - orb / max_orb);
                if strength < orbs.min_strength_pct {
                    continue;
                }

                let bucket_key = (*b1, *b2, aspect_type, month);
                processed
                    .entry(bucket_key)
                    .and_modify(|acc| {
                        if orb < acc.exact_orb {
                            acc.exact_jd = jd;
                            acc.exact_orb = orb;
                            acc.exact_pos1 = pos1;
                            acc.exact_pos2 = pos2;
                        }
                        acc.separating_jd = jd;
                        acc.separating_pos1 = pos1;
                        acc.separating_pos2 = pos2;
                    })
                    .or_insert_with(|| Accumulator {
                        applying_jd: jd,
                        applying_pos1: pos1,
                        applying_pos2: pos2,
                        exact_jd: jd,
                        exact_orb: orb,
                        exact_pos1: pos1,
                        exact_pos2: pos2,
                        separating_jd: jd,
                        separating_pos1: pos1,
                        separating_pos2: pos2,
                    });
            }
        }

        jd += step_days;
    }

    processed
        .into_iter()
        .map(|((b1, b2, aspect_type, _month), acc)| Aspect {
            body1_id: b1.catalog_id(),
            body2_id: b2.catalog_id(),
            aspect_type,
            is_major: aspect_type.is_major(),
            year,
            applying_timestamp: Some(jd_to_datetime(acc.applying_jd)),
            exact_timestamp: jd_to_datetime(acc.exact_jd),
            separation_timestamp: Some(jd_to_datetime(acc.separating_jd)),
            applying_position1: Some(acc.applying_pos1),
            applying_position2: Some(acc.applying_pos2),
            exact_position1: acc.exact_pos1,
            exact_position2: acc.exact_pos2,
            separation_position1: Some(acc.separating_pos1),
            separation_position2: Some(acc.separating_pos2),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::LowPrecisionEphemeris;

    #[test]
    fn finds_at_least_one_sun_moon_conjunction_per_year() {
        let ephem = LowPrecisionEphemeris::new();
        let orbs = OrbConfig {
            major_orb_deg: 6.0,
            minor_orb_deg: 2.0,
            include_minor: true,
            min_strength_pct: 0.0,
        };
        let events = detect(2000, &ephem, &orbs, 6);
        let sun_moon_conjunctions: Vec<_> = events
            .iter()
            .filter(|a| a.aspect_type == AspectType::Conjunction)
            .filter(|a| {
                let pair = (a.body1_id, a.body2_id);
                pair == (Body::Sun.catalog_id(), Body::Moon.catalog_id())
            })
            .collect();
        // ~12-13 new moons in a year.
        assert!(sun_moon_conjunctions.len() >= 10);
    }

    #[test]
    fn every_stored_aspect_respects_ordering_and_orb() {
        let ephem = LowPrecisionEphemeris::new();
        let orbs = OrbConfig {
            major_orb_deg: 6.0,
            minor_orb_deg: 2.0,
            include_minor: true,
            min_strength_pct: 0.0,
        };
        let events = detect(2001, &ephem, &orbs, 6);
        assert!(!events.is_empty());
        for a in &events {
            if let (Some(applying), Some(separating)) =
                (a.applying_timestamp, a.separation_timestamp)
            {
                assert!(applying <= a.exact_timestamp);
                assert!(a.exact_timestamp <= separating);
            }
            let max_orb = a.aspect_type.max_orb_deg();
            let orb = angle::aspect_orb(
                a.exact_position1,
                a.exact_position2,
                a.aspect_type
                    .target_angle_for_test(),
                max_orb,
            );
            assert!(orb.is_some());
        }
    }

    impl AspectType {
        fn target_angle_for_test(&self) -> f64 {
            AspectType::ALL_WITH_ANGLE
                .iter()
                .find(|(t, _)| t == self)
                .map(|(_, a)| *a)
                .unwrap()
        }
    }

    #[test]
    fn aspect_pairs_all_canonicalized_low_to_high_id() {
        let ephem = LowPrecisionEphemeris::new();
        let orbs = OrbConfig {
            major_orb_deg: 6.0,
            minor_orb_deg: 2.0,
            include_minor: true,
            min_strength_pct: 0.0,
        };
        let events = detect(2000, &ephem, &orbs, 6);
        for a in &events {
            assert!(a.body1_id < a.body2_id);
        }
    }
}
