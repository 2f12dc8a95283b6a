//! Frame-stepped animation helpers.

/// A value ramping back and forth between two bounds by a fixed step per frame.
///
/// Invariant: `min <= value <= max` after every call. When a step would reach or
/// cross a bound, the value lands exactly on the bound and the direction flips.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Oscillator {
    value: f32,
    step: f32,
    min: f32,
    max: f32,
}

impl Oscillator {
    /// `step` is the magnitude of one advance; the ramp starts upward.
    pub fn new(start: f32, step: f32, min: f32, max: f32) -> Self {
        debug_assert!(min < max, "empty oscillator range {min}..{max}");
        debug_assert!(step > 0.0, "oscillator step must be positive");
        Self {
            value: start.clamp(min, max),
            step: step.abs(),
            min,
            max,
        }
    }

    /// The red-channel ramp used by the tutorials: `0 → 1 → 0` in steps of `0.05`.
    pub fn color_ramp() -> Self {
        Self::new(0.0, 0.05, 0.0, 1.0)
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// `true` while moving toward `max`.
    #[inline]
    pub fn rising(&self) -> bool {
        self.step > 0.0
    }

    /// Returns the current value, then moves one step. The first call yields the
    /// starting value.
    pub fn step(&mut self) -> f32 {
        let v = self.value;
        self.advance();
        v
    }

    /// Moves one step and returns the new value.
    pub fn advance(&mut self) -> f32 {
        let next = self.value + self.step;

        if next >= self.max {
            self.value = self.max;
            self.step = -self.step.abs();
        } else if next <= self.min {
            self.value = self.min;
            self.step = self.step.abs();
        } else {
            self.value = next;
        }

        self.value
    }
}

impl Iterator for Oscillator {
    type Item = f32;

    /// Never ends; see [`Oscillator::step`].
    fn next(&mut self) -> Option<f32> {
        Some(self.step())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_within_bounds() {
        let mut osc = Oscillator::color_ramp();
        for _ in 0..1_000 {
            let v = osc.advance();
            assert!((0.0..=1.0).contains(&v), "value {v} escaped [0, 1]");
        }
    }

    #[test]
    fn reverses_exactly_at_max() {
        let mut osc = Oscillator::color_ramp();
        let mut prev = osc.value();
        loop {
            let v = osc.advance();
            if !osc.rising() {
                assert_eq!(v, 1.0);
                assert!(prev < 1.0);
                break;
            }
            prev = v;
        }

        // The very next step goes back down.
        assert!(osc.advance() < 1.0);
    }

    #[test]
    fn reverses_exactly_at_min() {
        let mut osc = Oscillator::new(0.9, 0.05, 0.0, 1.0);
        // Run up to the top, then all the way down.
        while osc.rising() {
            osc.advance();
        }
        while !osc.rising() {
            osc.advance();
        }
        assert_eq!(osc.value(), 0.0);
        assert!(osc.advance() > 0.0);
    }

    #[test]
    fn full_period_is_symmetric() {
        // 20 steps up, 20 steps down with a 0.05 step over [0, 1].
        let values: Vec<f32> = Oscillator::color_ramp().take(41).collect();
        assert_eq!(values[0], 0.0);
        assert_eq!(values[20], 1.0);
        assert_eq!(values[40], 0.0);
        for i in 0..20 {
            assert!(values[i] < values[i + 1], "not rising at {i}");
            assert!(values[20 + i] > values[21 + i], "not falling at {}", 20 + i);
        }
    }

    #[test]
    fn step_yields_start_before_moving() {
        let mut osc = Oscillator::color_ramp();
        assert_eq!(osc.step(), 0.0);
        assert_eq!(osc.step(), 0.05);
        assert_eq!(osc.value(), 0.1);
    }

    #[test]
    fn start_outside_range_is_clamped() {
        let osc = Oscillator::new(4.0, 0.1, -1.0, 1.0);
        assert_eq!(osc.value(), 1.0);
    }
}
