//! Ephemeris Adapter (C1): a pure function from Julian Day + body to
//! ecliptic longitude, latitude, distance and longitudinal speed. Hides
//! whatever native ephemeris library backs it.

pub mod low_precision;

pub use low_precision::LowPrecisionEphemeris;

use crate::catalog::Body;
use crate::error::CoreResult;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Geocentric (apparent, as seen from Earth) or heliocentric (as seen
/// from the Sun) reference frame. The inner-planet-phase detector uses
/// both to distinguish superior from inferior conjunctions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EphemerisMode {
    Geocentric,
    Heliocentric,
}

/// Whether a position came from the primary ephemeris or a closed-form
/// fallback. Never silently conflated — every stored event born from a
/// `Low` position is tagged `low_precision`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    High,
    Low,
}

/// One body's state at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct Position {
    /// Ecliptic longitude, normalized to `[0, 360)`.
    pub longitude: f64,
    /// Ecliptic latitude in degrees.
    pub latitude: f64,
    /// Distance from the observer in AU (geocentric) or AU (heliocentric).
    pub distance: f64,
    /// Instantaneous longitudinal speed in degrees/day. Negative during
    /// apparent retrograde motion.
    pub speed_longitude: f64,
    pub precision: Precision,
}

/// An eclipse found by an ephemeris-backed search, before the detector
/// maps its classification bits onto the domain's `EclipseKind`.
#[derive(Debug, Clone, Copy)]
pub struct EclipseObservation {
    pub jd: f64,
    /// Bitmask: for solar eclipses, bit0=total, bit1=annular, bit2=partial;
    /// for lunar, bit0=total, bit1=partial, bit2=penumbral. Unknown or
    /// zero combinations default to the partial variant, per §4.4.
    pub classification_bits: u8,
}

/// The contract every ephemeris backend must satisfy. Implementations
/// may wrap Swiss Ephemeris, VSOP87, JPL DE, or (as shipped here) a
/// closed-form low-precision model; detectors depend only on this trait.
pub trait Ephemeris {
    fn position(&self, jd: f64, body: Body, mode: EphemerisMode) -> CoreResult<Position>;

    fn next_solar_eclipse(&self, from_jd: f64) -> CoreResult<EclipseObservation>;

    fn next_lunar_eclipse(&self, from_jd: f64) -> CoreResult<EclipseObservation>;

    /// Next Julian Day at or after `from_jd` where the Sun's apparent
    /// geocentric longitude crosses `target_deg`.
    fn next_sun_longitude_crossing(&self, from_jd: f64, target_deg: f64) -> CoreResult<f64>;
}

/// Julian Day (UT) for a proleptic-Gregorian calendar date.
///
/// `month` is `1..=12`; `day` may be fractional (e.g. `15.5` = noon UTC).
pub fn julian_day(year: i32, month: u32, day: f64) -> f64 {
    let (y, m) = if month <= 2 {
        (year - 1, month as i64 + 12)
    } else {
        (year, month as i64)
    };
    let a = (y as f64 / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();
    (365.25 * (y as f64 + 4716.0)).floor() + (30.6001 * (m as f64 + 1.0)).floor() + day + b
        - 1524.5
}

/// Inverse of [`julian_day`]: `(year, month, day_with_fraction)`.
pub fn reverse_julian_day(jd: f64) -> (i32, u32, f64) {
    let jd = jd + 0.5;
    let z = jd.floor();
    let f = jd - z;
    let a = if z < 2_299_161.0 {
        z
    } else {
        let alpha = ((z - 1_867_216.25) / 36524.25).floor();
        z + 1.0 + alpha - (alpha / 4.0).floor()
    };
    let b = a + 1524.0;
    let c = ((b - 122.1) / 365.25).floor();
    let d = (365.25 * c).floor();
    let e = ((b - d) / 30.6001).floor();

    let day = b - d - (30.6001 * e).floor() + f;
    let month = if e < 14.0 { e - 1.0 } else { e - 13.0 };
    let year = if month > 2.0 { c - 4716.0 } else { c - 4715.0 };

    (year as i32, month as u32, day)
}

/// Julian Day (UT) to a UTC calendar timestamp, rounded to the nearest second.
///
/// Every detector uses this single conversion so that timestamps written to
/// the store are consistent to the second regardless of which scan produced
/// them.
pub fn jd_to_datetime(jd: f64) -> DateTime<Utc> {
    let (year, month, day_frac) = reverse_julian_day(jd);
    let day = day_frac.floor().max(1.0) as u32;
    let frac_day = (day_frac - day_frac.floor()).clamp(0.0, 1.0);
    let seconds = (frac_day * 86_400.0).round() as i64;
    let seconds = seconds.clamp(0, 86_399) as u32;
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, month, 1).unwrap());
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).unwrap();
    DateTime::from_naive_utc_and_offset(NaiveDateTime::new(date, time), Utc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn julian_day_roundtrips() {
        let jd = julian_day(2000, 1, 1.5);
        let (y, m, d) = reverse_julian_day(jd);
        assert_eq!(y, 2000);
        assert_eq!(m, 1);
        assert!((d - 1.5).abs() < 1e-6);
    }

    #[test]
    fn julian_day_known_epoch() {
        // J2000.0 = JD 2451545.0 = 2000-01-01 12:00 UTC
        let jd = julian_day(2000, 1, 1.5);
        assert!((jd - 2_451_545.0).abs() < 1e-6);
    }

    #[test]
    fn jd_to_datetime_matches_known_epoch() {
        use chrono::{Datelike, Timelike};
        let dt = jd_to_datetime(2_451_545.0);
        assert_eq!(dt.year(), 2000);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 1);
        assert_eq!(dt.hour(), 12);
    }
}
