use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Capture time of a measurement, in nanoseconds since an arbitrary epoch.
///
/// Point-cloud headers usually count microseconds; use [`Stamp::from_micros`]
/// for those so the factor of 1000 is applied in one place.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stamp(u64);

impl Stamp {
    pub const ZERO: Stamp = Stamp(0);

    #[inline]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    #[inline]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros.saturating_mul(1_000))
    }

    /// Negative and non-finite inputs saturate to [`Stamp::ZERO`].
    pub fn from_secs_f64(secs: f64) -> Self {
        if !secs.is_finite() || secs <= 0.0 {
            return Self::ZERO;
        }
        Self((secs * 1e9).round() as u64)
    }

    #[inline]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 * 1e-9
    }

    /// Absolute time between two stamps.
    #[inline]
    pub fn abs_diff(self, other: Stamp) -> Duration {
        Duration::from_nanos(self.0.abs_diff(other.0))
    }

    #[inline]
    pub fn saturating_sub(self, d: Duration) -> Stamp {
        let nanos = u64::try_from(d.as_nanos()).unwrap_or(u64::MAX);
        Stamp(self.0.saturating_sub(nanos))
    }

    #[inline]
    pub fn saturating_add(self, d: Duration) -> Stamp {
        let nanos = u64::try_from(d.as_nanos()).unwrap_or(u64::MAX);
        Stamp(self.0.saturating_add(nanos))
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}s", self.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn micros_are_scaled_to_nanos() {
        assert_eq!(Stamp::from_micros(1_500).as_nanos(), 1_500_000);
    }

    #[test]
    fn secs_conversion_rounds_to_nearest_nano() {
        let s = Stamp::from_secs_f64(12.000_000_000_6);
        assert_eq!(s.as_nanos(), 12_000_000_001);
        assert_eq!(Stamp::from_secs_f64(-3.0), Stamp::ZERO);
        assert_eq!(Stamp::from_secs_f64(f64::NAN), Stamp::ZERO);
    }

    #[test]
    fn duration_arithmetic_saturates() {
        let s = Stamp::from_nanos(10);
        assert_eq!(s.saturating_sub(Duration::from_secs(1)), Stamp::ZERO);
        assert_eq!(s.abs_diff(Stamp::from_nanos(4)), Duration::from_nanos(6));
        assert_eq!(
            Stamp::from_nanos(u64::MAX - 1).saturating_add(Duration::from_secs(1)),
            Stamp::from_nanos(u64::MAX)
        );
    }

    #[test]
    fn display_uses_seconds() {
        assert_eq!(Stamp::from_nanos(1_250_000_000).to_string(), "1.250000s");
    }
}
