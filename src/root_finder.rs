//! Generic 1-D root and extremum finders over ephemeris-derived scalar
//! functions, with a fixed iteration budget. Callers must supply a
//! bracket known to contain exactly one root or extremum — these finders
//! refine, they do not search.

const BISECT_MAX_ITER: u32 = 20;
const BISECT_TOLERANCE_DAYS: f64 = 1e-4;
const GOLDEN_MAX_ITER: u32 = 10;
const GOLDEN_TOLERANCE_DAYS: f64 = 0.01;

/// Outcome of a bisection search.
pub struct BisectResult {
    pub t: f64,
    /// `false` if the bracket did not contain a sign change or the
    /// iteration budget was exceeded; `t` is then the interval midpoint.
    pub converged: bool,
}

/// Bisect `f` on `[lo, hi]` for the Julian Day where it crosses zero.
///
/// `f` must change sign across `[lo, hi]`; if it does not, the midpoint is
/// returned as a best estimate with `converged = false`.
pub fn bisect<F>(mut lo: f64, mut hi: f64, f: F) -> BisectResult
where
    F: Fn(f64) -> f64,
{
    let mut f_lo = f(lo);
    let f_hi = f(hi);

    if f_lo == 0.0 {
        return BisectResult {
            t: lo,
            converged: true,
        };
    }
    if f_hi == 0.0 {
        return BisectResult {
            t: hi,
            converged: true,
        };
    }
    if f_lo.signum() == f_hi.signum() {
        return BisectResult {
            t: (lo + hi) / 2.0,
            converged: false,
        };
    }

    for _ in 0..BISECT_MAX_ITER {
        if (hi - lo).abs() < BISECT_TOLERANCE_DAYS {
            break;
        }
        let mid = (lo + hi) / 2.0;
        let f_mid = f(mid);
        if f_mid == 0.0 {
            return BisectResult {
                t: mid,
                converged: true,
            };
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    BisectResult {
        t: (lo + hi) / 2.0,
        converged: true,
    }
}

/// Find the argmax of a unimodal function `f` on `[lo, hi]` via
/// golden-section search. Used for greatest-elongation refinement.
pub fn golden_section_max<F>(mut lo: f64, mut hi: f64, f: F) -> f64
where
    F: Fn(f64) -> f64,
{
    let golden_ratio = (5f64.sqrt() - 1.0) / 2.0;
    let mut c = hi - golden_ratio * (hi - lo);
    let mut d = lo + golden_ratio * (hi - lo);

    for _ in 0..GOLDEN_MAX_ITER {
        if (hi - lo).abs() < GOLDEN_TOLERANCE_DAYS {
            break;
        }
        if f(c) > f(d) {
            hi = d;
        } else {
            lo = c;
        }
        c = hi - golden_ratio * (hi - lo);
        d = lo + golden_ratio * (hi - lo);
    }

    (lo + hi) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bisect_finds_zero_crossing() {
        // f(t) = t - 5, root at 5
        let result = bisect(0.0, 10.0, |t| t - 5.0);
        assert!(result.converged);
        assert!((result.t - 5.0).abs() < 1e-3);
    }

    #[test]
    fn bisect_reports_nonconvergence_without_sign_change() {
        let result = bisect(0.0, 10.0, |t| t + 1.0);
        assert!(!result.converged);
        assert!((result.t - 5.0).abs() < 1e-9);
    }

    #[test]
    fn golden_section_finds_max_of_parabola() {
        // f(t) = -(t - 3)^2, max at t=3
        let t = golden_section_max(0.0, 10.0, |t| -((t - 3.0).powi(2)));
        assert!((t - 3.0).abs() < 0.05);
    }
}
