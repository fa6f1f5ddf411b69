// hz-core/src/units.rs

use uom::si::f64::Time as UomTime;

// Public canonical unit types (SI, f64)
pub type Time = UomTime;

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn minutes(v: f64) -> Time {
    use uom::si::time::minute;
    Time::new::<minute>(v)
}

/// Elapsed time in minutes, the unit all controller tunables are expressed in.
#[inline]
pub fn as_minutes(t: Time) -> f64 {
    use uom::si::time::minute;
    t.get::<minute>()
}
