//! Inner-planet-phase detector (Mercury, Venus): daily scan tracking
//! elongation and longitudinal speed, detecting stations by a speed sign
//! change, conjunctions by an elongation local minimum, and greatest
//! elongations by an elongation local maximum — each refined against its
//! immediate neighbors and followed by a debounce window.

use chrono::Datelike;

use crate::angle::{self, normalize, sign_index};
use crate::catalog::Body;
use crate::ephemeris::{jd_to_datetime, julian_day, Ephemeris, EphemerisMode};
use crate::root_finder::{bisect, golden_section_max};
use crate::store::models::{PlanetPhase, PlanetPhaseKind};

const INFERIOR_DIVERGENCE_THRESHOLD_DEG: f64 = 90.0;

struct Sample {
    jd: f64,
    elongation: f64,
    speed: f64,
}

fn sample_at(ephem: &dyn Ephemeris, planet: Body, jd: f64) -> Option<Sample> {
    let geo = ephem.position(jd, planet, EphemerisMode::Geocentric).ok()?;
    let sun = ephem.position(jd, Body::Sun, EphemerisMode::Geocentric).ok()?;
    Some(Sample {
        jd,
        elongation: angle::separation(geo.longitude, sun.longitude),
        speed: geo.speed_longitude,
    })
}

fn elongation_fn(ephem: &dyn Ephemeris, planet: Body) -> impl Fn(f64) -> f64 + '_ {
    move |jd| sample_at(ephem, planet, jd).map(|s| s.elongation).unwrap_or(0.0)
}

fn speed_fn(ephem: &dyn Ephemeris, planet: Body) -> impl Fn(f64) -> f64 + '_ {
    move |jd| sample_at(ephem, planet, jd).map(|s| s.speed).unwrap_or(0.0)
}

fn emit(
    ephem: &dyn Ephemeris,
    planet: Body,
    kind: PlanetPhaseKind,
    jd: f64,
    year: i32,
) -> Option<PlanetPhase> {
    let geo = ephem.position(jd, planet, EphemerisMode::Geocentric).ok()?;
    let sun = ephem.position(jd, Body::Sun, EphemerisMode::Geocentric).ok()?;
    let dt = jd_to_datetime(jd);
    Some(PlanetPhase {
        body_id: planet.catalog_id(),
        phase_kind: kind,
        timestamp: dt,
        year,
        elongation_degree: Some(angle::separation(geo.longitude, sun.longitude)),
        zodiac_sign: sign_index(geo.longitude) as i64,
    })
}

fn classify_conjunction(ephem: &dyn Ephemeris, planet: Body, jd: f64) -> Option<PlanetPhaseKind> {
    let geo = ephem.position(jd, planet, EphemerisMode::Geocentric).ok()?;
    let helio = ephem.position(jd, planet, EphemerisMode::Heliocentric).ok()?;
    let divergence = angle::separation(geo.longitude, helio.longitude);
    Some(if divergence > INFERIOR_DIVERGENCE_THRESHOLD_DEG {
        PlanetPhaseKind::InferiorConjunction
    } else {
        PlanetPhaseKind::SuperiorConjunction
    })
}

fn classify_elongation(ephem: &dyn Ephemeris, planet: Body, jd: f64) -> Option<PlanetPhaseKind> {
    let geo = ephem.position(jd, planet, EphemerisMode::Geocentric).ok()?;
    let sun = ephem.position(jd, Body::Sun, EphemerisMode::Geocentric).ok()?;
    let signed = normalize(geo.longitude - sun.longitude);
    Some(if signed < 180.0 {
        PlanetPhaseKind::GreatestEasternElongation
    } else {
        PlanetPhaseKind::GreatestWesternElongation
    })
}

/// Run the inner-planet-phase scan for one calendar year, for a single body.
fn detect_for_body(year: i32, ephem: &dyn Ephemeris, planet: Body, debounce_days: i64) -> Vec<PlanetPhase> {
    let start_jd = julian_day(year, 1, 1.0);
    let end_jd = julian_day(year + 1, 1, 1.0);

    let mut out = Vec::new();
    let mut history: Vec<Sample> = Vec::with_capacity(3);
    let mut skip_until: f64 = f64::NEG_INFINITY;

    let mut jd = start_jd;
    while jd <= end_jd {
        let Some(sample) = sample_at(ephem, planet, jd) else {
            jd += 1.0;
            continue;
        };
        history.push(sample);
        if history.len() > 3 {
            history.remove(0);
        }

        if history.len() == 3 && jd >= skip_until {
            let a = &history[0];
            let b = &history[1];
            let c = &history[2];

            let mut refined: Option<(f64, PlanetPhaseKind)> = None;

            if a.speed.signum() != c.speed.signum() && a.speed != 0.0 && c.speed != 0.0 {
                let result = bisect(a.jd, c.jd, speed_fn(ephem, planet));
                let kind = if a.speed > 0.0 {
                    PlanetPhaseKind::StationaryRetrograde
                } else {
                    PlanetPhaseKind::StationaryDirect
                };
                refined = Some((result.t, kind));
            } else if b.elongation < a.elongation && b.elongation < c.elongation {
                let t = golden_section_max(a.jd, c.jd, |t| -elongation_fn(ephem, planet)(t));
                if let Some(kind) = classify_conjunction(ephem, planet, t) {
                    refined = Some((t, kind));
                }
            } else if b.elongation > a.elongation && b.elongation > c.elongation {
                let t = golden_section_max(a.jd, c.jd, elongation_fn(ephem, planet));
                if let Some(kind) = classify_elongation(ephem, planet, t) {
                    refined = Some((t, kind));
                }
            }

            if let Some((t, kind)) = refined {
                if let Some(event) = emit(ephem, planet, kind, t, year) {
                    if event.timestamp.year() == year {
                        out.push(event);
                    }
                    skip_until = t + debounce_days as f64;
                }
            }
        }

        jd += 1.0;
    }

    out
}

/// Run the inner-planet-phase scan for one calendar year, over Mercury and Venus.
pub fn detect(year: i32, ephem: &dyn Ephemeris, debounce_days: i64) -> Vec<PlanetPhase> {
    let mut out = detect_for_body(year, ephem, Body::Mercury, debounce_days);
    out.extend(detect_for_body(year, ephem, Body::Venus, debounce_days));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::LowPrecisionEphemeris;

    #[test]
    fn mercury_has_several_stations_per_year() {
        let ephem = LowPrecisionEphemeris::new();
        let events = detect(2023, &ephem, 10);
        let stations = events
            .iter()
            .filter(|e| e.body_id == Body::Mercury.catalog_id())
            .filter(|e| {
                matches!(
                    e.phase_kind,
                    PlanetPhaseKind::StationaryDirect | PlanetPhaseKind::StationaryRetrograde
                )
            })
            .count();
        assert!(stations >= 2, "expected at least 2 Mercury stations, got {stations}");
    }

    #[test]
    fn events_are_debounced_by_at_least_some_margin() {
        let ephem = LowPrecisionEphemeris::new();
        let events = detect_for_body(2023, &ephem, Body::Mercury, 10);
        let mut timestamps: Vec<_> = events.iter().map(|e| e.timestamp).collect();
        timestamps.sort();
        for pair in timestamps.windows(2) {
            let days = (pair[1] - pair[0]).num_seconds() as f64 / 86_400.0;
            assert!(days >= 1.0, "events too close together: {days} days apart");
        }
    }
}
