//! Per-item pacing: a jittered pause after every transfer attempt.

use rand::Rng;
use std::time::Duration;

/// Pause bounds in milliseconds. Both set → uniform random draw per item;
/// one set → fixed pause; none → no pause. Reversed bounds are swapped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacingBounds {
    min_ms: Option<u64>,
    max_ms: Option<u64>,
}

impl PacingBounds {
    pub fn new(min_ms: Option<u64>, max_ms: Option<u64>) -> Self {
        match (min_ms, max_ms) {
            (Some(min), Some(max)) if min > max => Self {
                min_ms: Some(max),
                max_ms: Some(min),
            },
            _ => Self { min_ms, max_ms },
        }
    }

    /// Draws the pause for one item. Each item gets an independent draw.
    pub fn next_pause(&self) -> Duration {
        let ms = match (self.min_ms, self.max_ms) {
            (Some(min), Some(max)) if min < max => rand::rng().random_range(min..=max),
            (Some(min), Some(_)) => min,
            (Some(fixed), None) | (None, Some(fixed)) => fixed,
            (None, None) => 0,
        };
        Duration::from_millis(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_means_zero() {
        assert_eq!(PacingBounds::new(None, None).next_pause(), Duration::ZERO);
    }

    #[test]
    fn single_bound_is_fixed() {
        assert_eq!(
            PacingBounds::new(Some(300), None).next_pause(),
            Duration::from_millis(300)
        );
        assert_eq!(
            PacingBounds::new(None, Some(700)).next_pause(),
            Duration::from_millis(700)
        );
    }

    #[test]
    fn reversed_bounds_are_swapped() {
        let bounds = PacingBounds::new(Some(900), Some(100));
        assert_eq!(bounds, PacingBounds::new(Some(100), Some(900)));
    }

    #[test]
    fn draws_stay_within_bounds() {
        let bounds = PacingBounds::new(Some(100), Some(200));
        for _ in 0..50 {
            let pause = bounds.next_pause().as_millis() as u64;
            assert!((100..=200).contains(&pause), "pause {} out of range", pause);
        }
    }

    #[test]
    fn equal_bounds_are_fixed() {
        let bounds = PacingBounds::new(Some(250), Some(250));
        assert_eq!(bounds.next_pause(), Duration::from_millis(250));
    }
}
