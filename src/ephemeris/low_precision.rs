//! Closed-form low-precision ephemeris.
//!
//! The crate's only shipped [`Ephemeris`] implementation: pure
//! mean-longitude/mean-element arithmetic, no external data file, no
//! FFI. Accuracy is on the order of a degree for the inner planets and
//! a fraction of a degree for the Sun — adequate for property testing
//! and for embedders who have not wired in a high-precision backend.
//! Every [`Position`] it returns carries [`Precision::Low`].
//!
//! The Moon model (`schaefer_moon`) is Schaefer's 1985/1994 closed-form
//! routine (Sky & Telescope BASIC "MOONFX.BAS"); the Sun model is the
//! standard low-precision mean-longitude-plus-equation-of-center formula
//! (Meeus, *Astronomical Algorithms*, ch. 25, low-accuracy variant);
//! Mercury/Venus/the mean node use circular, coplanar J2000 mean
//! elements, which is why their modeled latitude is always zero —
//! documented, not hidden, via `Precision::Low`.

use core::f64::consts::PI;

use super::{EclipseObservation, Ephemeris, EphemerisMode, Position, Precision};
use crate::angle::{normalize, wrapped_diff};
use crate::catalog::Body;
use crate::error::{CoreError, CoreResult};
use crate::root_finder::bisect;

const J2000: f64 = 2_451_545.0;
const KM_PER_EARTH_RADIUS: f64 = 6378.137;
const KM_PER_AU: f64 = 149_597_870.7;
const ECLIPSE_LAT_THRESHOLD_DEG: f64 = 2.0;
const SPEED_DT_DAYS: f64 = 0.01;

/// Everything Schaefer's routine can compute for a given instant.
struct LunarEphemeris {
    lon_deg: f64,
    lat_deg: f64,
    distance_er: f64,
}

/// Schaefer's 1985/1994 closed-form lunar position from a Julian Day.
fn schaefer_moon(jd: f64) -> LunarEphemeris {
    let days = jd - J2000 + 10_957.5; // shift so `days` matches the routine's 1900-epoch convention
    let mut jd_norm = days / 29.530_588_2;
    jd_norm -= jd_norm.floor();

    fn frac(mut v: f64) -> f64 {
        v -= v.floor();
        if v < 0.0 {
            v + 1.0
        } else {
            v
        }
    }

    let dp = frac((days + 245_1550.1 - 245_1562.2) / 27.554_549_88) * 2.0 * PI;
    let distance_er = 60.4
        - 3.3 * dp.cos()
        - 0.6 * ((2.0 * jd_norm * 2.0 * PI) - dp).cos()
        - 0.5 * (2.0 * jd_norm * 2.0 * PI).cos();

    let np = frac((days + 245_1550.1 - 245_1565.2) / 27.212_220_817) * 2.0 * PI;
    let lat_deg = 5.1 * np.sin();

    let rp = frac((days + 245_1550.1 - 245_1555.8) / 27.321_582_241);
    let lon_deg = normalize(
        360.0 * rp
            + 6.3 * dp.sin()
            + 1.3 * ((2.0 * jd_norm * 2.0 * PI) - dp).sin()
            + 0.7 * (2.0 * jd_norm * 2.0 * PI).sin(),
    );

    LunarEphemeris {
        lon_deg,
        lat_deg,
        distance_er,
    }
}

/// Geocentric apparent ecliptic longitude of the Sun, degrees.
fn sun_longitude(jd: f64) -> f64 {
    let d = jd - J2000;
    let mean_lon = 280.460 + 0.985_647_4 * d;
    let mean_anomaly = (357.528 + 0.985_600_3 * d).to_radians();
    normalize(mean_lon + 1.915 * mean_anomaly.sin() + 0.020 * (2.0 * mean_anomaly).sin())
}

/// Sun-Earth distance, AU, from the eccentricity-corrected radius vector.
fn sun_distance_au(jd: f64) -> f64 {
    let d = jd - J2000;
    let g = (357.528 + 0.985_600_3 * d).to_radians();
    1.000_14 - 0.016_71 * g.cos() - 0.000_14 * (2.0 * g).cos()
}

/// Circular, coplanar heliocentric mean elements: `(L0_deg, rate_deg_per_day, radius_au)`.
fn mean_elements(body: Body) -> Option<(f64, f64, f64)> {
    match body {
        Body::Mercury => Some((252.251, 4.092_385, 0.387_098)),
        Body::Venus => Some((181.980, 1.602_136, 0.723_332)),
        Body::Mars => Some((355.433, 0.524_071, 1.523_679)),
        Body::Jupiter => Some((34.351, 0.083_056, 5.204_267)),
        Body::Saturn => Some((50.077, 0.033_371, 9.582_018)),
        Body::Uranus => Some((314.055, 0.011_698, 19.229_412)),
        Body::Neptune => Some((304.348, 0.005_965, 30.103_658)),
        _ => None,
    }
}

const EARTH_L0: f64 = 100.464;
const EARTH_RATE: f64 = 0.985_609_1;
const EARTH_RADIUS_AU: f64 = 1.0;

fn heliocentric_xy(l0: f64, rate: f64, radius: f64, jd: f64) -> (f64, f64) {
    let lon = normalize(l0 + rate * (jd - J2000)).to_radians();
    (radius * lon.cos(), radius * lon.sin())
}

/// Geocentric ecliptic longitude and distance (AU) for an outer/inner
/// planet under the circular-coplanar simplification.
fn planet_geocentric(body: Body, jd: f64) -> (f64, f64) {
    let (l0, rate, radius) = mean_elements(body).expect("planet has mean elements");
    let (px, py) = heliocentric_xy(l0, rate, radius, jd);
    let (ex, ey) = heliocentric_xy(EARTH_L0, EARTH_RATE, EARTH_RADIUS_AU, jd);
    let (dx, dy) = (px - ex, py - ey);
    (normalize(dy.atan2(dx).to_degrees()), (dx * dx + dy * dy).sqrt())
}

fn planet_heliocentric(body: Body, jd: f64) -> (f64, f64) {
    let (l0, rate, radius) = mean_elements(body).expect("planet has mean elements");
    let (px, py) = heliocentric_xy(l0, rate, radius, jd);
    (normalize(py.atan2(px).to_degrees()), (px * px + py * py).sqrt())
}

/// Mean longitude of the ascending (north) lunar node; regresses over
/// an 18.6-year cycle.
fn north_node_longitude(jd: f64) -> f64 {
    let d = jd - J2000;
    normalize(125.1228 - 0.052_953_8083 * d)
}

fn longitude_at(body: Body, jd: f64, mode: EphemerisMode) -> f64 {
    match (body, mode) {
        (Body::Sun, EphemerisMode::Geocentric) => sun_longitude(jd),
        (Body::Sun, EphemerisMode::Heliocentric) => 0.0,
        (Body::Moon, _) => schaefer_moon(jd).lon_deg,
        (Body::NorthNode, _) => north_node_longitude(jd),
        (_, EphemerisMode::Heliocentric) => planet_heliocentric(body, jd).0,
        (_, EphemerisMode::Geocentric) => planet_geocentric(body, jd).0,
    }
}

/// Closed-form ephemeris requiring no external data file.
#[derive(Debug, Default, Clone, Copy)]
pub struct LowPrecisionEphemeris;

impl LowPrecisionEphemeris {
    pub fn new() -> Self {
        LowPrecisionEphemeris
    }

    fn position_uncached(&self, jd: f64, body: Body, mode: EphemerisMode) -> Position {
        let (longitude, latitude, distance) = match (body, mode) {
            (Body::Sun, EphemerisMode::Geocentric) => (sun_longitude(jd), 0.0, sun_distance_au(jd)),
            (Body::Sun, EphemerisMode::Heliocentric) => (0.0, 0.0, 0.0),
            (Body::Moon, _) => {
                let m = schaefer_moon(jd);
                (m.lon_deg, m.lat_deg, m.distance_er * KM_PER_EARTH_RADIUS / KM_PER_AU)
            }
            (Body::NorthNode, _) => (north_node_longitude(jd), 0.0, 0.0),
            (_, EphemerisMode::Heliocentric) => {
                let (lon, dist) = planet_heliocentric(body, jd);
                (lon, 0.0, dist)
            }
            (_, EphemerisMode::Geocentric) => {
                let (lon, dist) = planet_geocentric(body, jd);
                (lon, 0.0, dist)
            }
        };

        let before = longitude_at(body, jd - SPEED_DT_DAYS, mode);
        let after = longitude_at(body, jd + SPEED_DT_DAYS, mode);
        let speed_longitude = wrapped_diff(after, before) / (2.0 * SPEED_DT_DAYS);

        Position {
            longitude,
            latitude,
            distance,
            speed_longitude,
            precision: Precision::Low,
        }
    }

    /// Search forward from `from_jd` for the next syzygy (`target_deg` =
    /// 0 for new moon / solar eclipse candidates, 180 for full moon /
    /// lunar eclipse candidates), returning its Julian Day and the
    /// Moon's ecliptic latitude there.
    fn next_syzygy(&self, from_jd: f64, target_deg: f64) -> (f64, f64) {
        let f = |t: f64| wrapped_diff(schaefer_moon(t).lon_deg - sun_longitude(t), target_deg);
        let mut lo = from_jd;
        let mut f_lo = f(lo);
        loop {
            let hi = lo + 1.0;
            let f_hi = f(hi);
            if f_lo.signum() != f_hi.signum() {
                let result = bisect(lo, hi, f);
                return (result.t, schaefer_moon(result.t).lat_deg);
            }
            lo = hi;
            f_lo = f_hi;
        }
    }
}

impl Ephemeris for LowPrecisionEphemeris {
    fn position(&self, jd: f64, body: Body, mode: EphemerisMode) -> CoreResult<Position> {
        Ok(self.position_uncached(jd, body, mode))
    }

    fn next_solar_eclipse(&self, from_jd: f64) -> CoreResult<EclipseObservation> {
        let mut jd = from_jd;
        for _ in 0..50 {
            let (t, lat) = self.next_syzygy(jd, 0.0);
            let abs_lat = lat.abs();
            if abs_lat < ECLIPSE_LAT_THRESHOLD_DEG {
                let bits = if abs_lat < 0.5 {
                    0b001 // total
                } else if abs_lat < 1.0 {
                    0b010 // annular
                } else {
                    0b100 // partial
                };
                return Ok(EclipseObservation {
                    jd: t,
                    classification_bits: bits,
                });
            }
            jd = t + 15.0;
        }
        Err(CoreError::RootFindDiverged(
            "no solar eclipse found within search bound".to_string(),
        ))
    }

    fn next_lunar_eclipse(&self, from_jd: f64) -> CoreResult<EclipseObservation> {
        let mut jd = from_jd;
        for _ in 0..50 {
            let (t, lat) = self.next_syzygy(jd, 180.0);
            let abs_lat = lat.abs();
            if abs_lat < ECLIPSE_LAT_THRESHOLD_DEG {
                let bits = if abs_lat < 0.5 {
                    0b001 // total
                } else if abs_lat < 1.3 {
                    0b010 // partial
                } else {
                    0b100 // penumbral
                };
                return Ok(EclipseObservation {
                    jd: t,
                    classification_bits: bits,
                });
            }
            jd = t + 15.0;
        }
        Err(CoreError::RootFindDiverged(
            "no lunar eclipse found within search bound".to_string(),
        ))
    }

    fn next_sun_longitude_crossing(&self, from_jd: f64, target_deg: f64) -> CoreResult<f64> {
        let f = |t: f64| wrapped_diff(sun_longitude(t), target_deg);
        let mut lo = from_jd;
        let mut f_lo = f(lo);
        for _ in 0..400 {
            let hi = lo + 1.0;
            let f_hi = f(hi);
            if f_lo.signum() != f_hi.signum() {
                return Ok(bisect(lo, hi, f).t);
            }
            lo = hi;
            f_lo = f_hi;
        }
        Err(CoreError::RootFindDiverged(
            "no sun longitude crossing found within search bound".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sun_position_is_low_precision_and_in_range() {
        let eph = LowPrecisionEphemeris::new();
        let pos = eph
            .position(J2000, Body::Sun, EphemerisMode::Geocentric)
            .unwrap();
        assert_eq!(pos.precision, Precision::Low);
        assert!((0.0..360.0).contains(&pos.longitude));
    }

    #[test]
    fn moon_completes_a_synodic_cycle_in_about_29_5_days() {
        let lon0 = schaefer_moon(J2000).lon_deg;
        let lon1 = schaefer_moon(J2000 + 29.530_588_2).lon_deg;
        assert!(wrapped_diff(lon1, lon0).abs() < 5.0);
    }

    #[test]
    fn sun_longitude_crossing_finds_spring_equinox_near_day_80() {
        let eph = LowPrecisionEphemeris::new();
        let start = crate::ephemeris::julian_day(2000, 1, 1.0);
        let jd = eph.next_sun_longitude_crossing(start, 0.0).unwrap();
        let (_, m, d) = crate::ephemeris::reverse_julian_day(jd);
        assert_eq!(m, 3);
        assert!((18.0..22.0).contains(&d));
    }

    #[test]
    fn next_solar_eclipse_finds_a_new_moon_candidate() {
        let eph = LowPrecisionEphemeris::new();
        let start = crate::ephemeris::julian_day(2000, 1, 1.0);
        let obs = eph.next_solar_eclipse(start).unwrap();
        assert!(obs.jd > start);
        assert!(obs.classification_bits > 0);
    }
}
