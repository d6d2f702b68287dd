//! Range and time helpers shared by the controllers.

use std::time::Duration;

/// Fully closed valve.
pub const OPENING_MIN: u8 = 0;
/// Fully open valve.
pub const OPENING_MAX: u8 = 100;

/// Clamp any integer opening into `[0, 100]`. Out-of-range input degrades to
/// the nearest bound instead of failing.
#[inline]
pub fn clamp_opening(v: i64) -> u8 {
    u8::try_from(v.clamp(i64::from(OPENING_MIN), i64::from(OPENING_MAX))).unwrap_or(OPENING_MAX)
}

/// Sanitize a reported water level: non-finite values map to 0, negatives to 0.
#[inline]
pub fn sanitize_level(level: f32) -> f32 {
    if level.is_finite() { level.max(0.0) } else { 0.0 }
}

/// Milliseconds in a duration, saturating at u64::MAX.
#[inline]
pub fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_both_extremes() {
        assert_eq!(clamp_opening(-5), 0);
        assert_eq!(clamp_opening(0), 0);
        assert_eq!(clamp_opening(100), 100);
        assert_eq!(clamp_opening(105), 100);
        assert_eq!(clamp_opening(i64::MIN), 0);
        assert_eq!(clamp_opening(i64::MAX), 100);
    }

    #[test]
    fn level_sanitizing() {
        assert_eq!(sanitize_level(12.5), 12.5);
        assert_eq!(sanitize_level(-1.0), 0.0);
        assert_eq!(sanitize_level(f32::NAN), 0.0);
        assert_eq!(sanitize_level(f32::INFINITY), 0.0);
    }
}
