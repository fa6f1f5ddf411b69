use crate::{CoreError, CoreResult};

/// Floating point type used throughout system
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> CoreResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Clamp `value` into `[min, max]`.
///
/// Unlike `f64::clamp` this never panics: an inverted range resolves to `min`,
/// and NaN resolves to `min`.
#[inline]
pub fn clamp(value: Real, min: Real, max: Real) -> Real {
    if value.is_nan() {
        return min;
    }
    min.max(max.min(value))
}

/// Move from `previous` toward `target`, by at most `max_up` upward or
/// `max_down` downward. Negative limits are treated as zero.
#[inline]
pub fn slew_limit(previous: Real, target: Real, max_up: Real, max_down: Real) -> Real {
    let upper = previous + max_up.max(0.0);
    let lower = previous - max_down.max(0.0);
    clamp(target, lower, upper)
}

/// Round to the nearest 0.1.
#[inline]
pub fn round_tenth(value: Real) -> Real {
    (value * 10.0).round() / 10.0
}

/// Weighted mean of `(value, weight)` pairs. Non-positive weights are
/// skipped; an empty (or all-zero) input yields 0.
pub fn weighted_average<I>(pairs: I) -> Real
where
    I: IntoIterator<Item = (Real, Real)>,
{
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for (value, weight) in pairs {
        if weight <= 0.0 || !weight.is_finite() {
            continue;
        }
        weighted_sum += value * weight;
        total_weight += weight;
    }
    if total_weight <= 0.0 {
        0.0
    } else {
        weighted_sum / total_weight
    }
}
