use fixed::types::I32F32;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Convert an f64 to Fixed64. Use only for initialization, never in the scheduling loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display and reports.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Checked division for Fixed64 that returns None on zero divisor.
#[inline]
pub fn checked_div_64(a: Fixed64, b: Fixed64) -> Option<Fixed64> {
    a.checked_div(b)
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// An instant on the game clock, in seconds since the start of the game.
///
/// [`Time::NEVER`] is the distinguished "never feasible" instant. It compares
/// greater than every finite instant, absorbs addition, and is compared with
/// exact equality (`is_never`), never with a tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Time(Fixed64);

impl Time {
    pub const ZERO: Time = Time(Fixed64::ZERO);
    pub const NEVER: Time = Time(Fixed64::MAX);

    pub fn from_secs(secs: f64) -> Self {
        Time(f64_to_fixed64(secs))
    }

    pub fn from_fixed(secs: Fixed64) -> Self {
        Time(secs.min(Fixed64::MAX))
    }

    #[inline]
    pub fn raw(self) -> Fixed64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        fixed64_to_f64(self.0)
    }

    #[inline]
    pub fn is_never(self) -> bool {
        self == Time::NEVER
    }

    /// This instant shifted forward by `secs`. `NEVER` stays `NEVER` and
    /// overflow saturates to `NEVER`.
    pub fn plus(self, secs: Fixed64) -> Time {
        if self.is_never() {
            return self;
        }
        Time(self.0.saturating_add(secs))
    }

    /// This instant shifted backward by `secs`. `NEVER` stays `NEVER`.
    pub fn minus(self, secs: Fixed64) -> Time {
        if self.is_never() {
            return self;
        }
        Time(self.0.saturating_sub(secs))
    }

    /// Seconds elapsed from `earlier` to `self`, saturating at `Fixed64::MAX`
    /// when `self` is `NEVER`.
    pub fn since(self, earlier: Time) -> Fixed64 {
        if self.is_never() {
            return Fixed64::MAX;
        }
        self.0.saturating_sub(earlier.0)
    }
}

impl Default for Time {
    fn default() -> Self {
        Time::NEVER
    }
}

impl fmt::Display for Time {
    /// Renders as `m:ss`, or `∞` for [`Time::NEVER`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_never() {
            return write!(f, "∞");
        }
        let total: i64 = self.0.round().to_num();
        let sign = if total < 0 { "-" } else { "" };
        let total = total.abs();
        write!(f, "{sign}{}:{:02}", total / 60, total % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_absorbs_addition() {
        assert!(Time::NEVER.plus(f64_to_fixed64(10.0)).is_never());
        assert!(Time::NEVER.minus(f64_to_fixed64(10.0)).is_never());
    }

    #[test]
    fn never_orders_after_finite() {
        assert!(Time::from_secs(1e6) < Time::NEVER);
        assert_eq!(Time::ZERO.max(Time::NEVER), Time::NEVER);
    }

    #[test]
    fn saturating_add_becomes_never() {
        let t = Time::from_fixed(Fixed64::MAX - Fixed64::ONE);
        assert!(t.plus(f64_to_fixed64(5.0)).is_never());
    }

    #[test]
    fn since_measures_elapsed() {
        let a = Time::from_secs(12.5);
        let b = Time::from_secs(40.0);
        assert_eq!(b.since(a), f64_to_fixed64(27.5));
        assert_eq!(Time::NEVER.since(a), Fixed64::MAX);
    }

    #[test]
    fn display_minutes_seconds() {
        assert_eq!(Time::from_secs(0.0).to_string(), "0:00");
        assert_eq!(Time::from_secs(75.4).to_string(), "1:15");
        assert_eq!(Time::from_secs(599.6).to_string(), "10:00");
        assert_eq!(Time::NEVER.to_string(), "∞");
    }

    #[test]
    fn fixed64_checked_div_by_zero() {
        let a = f64_to_fixed64(1.0);
        assert!(checked_div_64(a, Fixed64::ZERO).is_none());
    }

    #[test]
    fn default_is_never() {
        assert!(Time::default().is_never());
    }
}
