//! Z-Score Gate
//!
//! Rolling-window statistics used to build the spread:
//! - `RollingSum`: trailing sum of the last N observations (momentum)
//! - `ZScoreGate`: trailing mean / sample std and the z-score of the newest value
//!
//! Z-Score Formula: z = (current - rolling_mean) / rolling_std
//!
//! Both windows only report once they hold N defined observations. An
//! undefined observation inside the window makes the output undefined until
//! it rolls out, matching the usual `min_periods = window` convention.

use std::collections::VecDeque;

use statrs::statistics::Statistics;

/// Minimum standard deviation treated as non-degenerate
const MIN_STD_DEV: f64 = 1e-12;

/// Result of z-score calculation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZScoreResult {
    /// Current z-score value
    pub z_score: f64,
    /// Rolling mean used in calculation
    pub mean: f64,
    /// Rolling sample standard deviation
    pub std_dev: f64,
    /// Newest observation
    pub current: f64,
}

/// Fixed-length trailing window over optional observations
#[derive(Debug, Clone)]
struct Window {
    len: usize,
    buffer: VecDeque<Option<f64>>,
}

impl Window {
    fn new(len: usize) -> Self {
        Self {
            len,
            buffer: VecDeque::with_capacity(len + 1),
        }
    }

    fn push(&mut self, value: Option<f64>) {
        self.buffer.push_back(value.filter(|v| v.is_finite()));
        if self.buffer.len() > self.len {
            self.buffer.pop_front();
        }
    }

    /// All values, only when the window is full and fully defined
    fn values(&self) -> Option<Vec<f64>> {
        if self.buffer.len() < self.len {
            return None;
        }
        self.buffer.iter().copied().collect()
    }

    fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Trailing sum over the last `len` observations
#[derive(Debug, Clone)]
pub struct RollingSum {
    window: Window,
}

impl RollingSum {
    pub fn new(len: usize) -> Self {
        Self {
            window: Window::new(len),
        }
    }

    /// Add an observation and return the sum once the window is ready
    pub fn update(&mut self, value: Option<f64>) -> Option<f64> {
        self.window.push(value);
        self.window.values().map(|v| v.iter().sum())
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }
}

/// Z-Score calculation over a trailing window
#[derive(Debug, Clone)]
pub struct ZScoreGate {
    window: Window,
}

impl ZScoreGate {
    /// Create a new z-score gate over `len` observations
    pub fn new(len: usize) -> Self {
        Self {
            window: Window::new(len),
        }
    }

    /// Add a new observation and calculate its z-score
    pub fn update(&mut self, value: Option<f64>) -> Option<ZScoreResult> {
        self.window.push(value);
        let values = self.window.values()?;
        let current = *values.last()?;

        let mean = values.iter().mean();
        let std_dev = values.iter().std_dev();

        // Flat windows have no meaningful z-score
        if !std_dev.is_finite() || std_dev < MIN_STD_DEV {
            return None;
        }

        Some(ZScoreResult {
            z_score: (current - mean) / std_dev,
            mean,
            std_dev,
            current,
        })
    }

    /// Reset the buffer
    pub fn reset(&mut self) {
        self.window.clear();
    }

    /// Check if buffer is full
    pub fn is_ready(&self) -> bool {
        self.window.buffer.len() >= self.window.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rolling_sum_warmup() {
        let mut sum = RollingSum::new(3);
        assert_eq!(sum.update(Some(1.0)), None);
        assert_eq!(sum.update(Some(2.0)), None);
        assert_eq!(sum.update(Some(3.0)), Some(6.0));
        assert_eq!(sum.update(Some(4.0)), Some(9.0));
    }

    #[test]
    fn test_rolling_sum_undefined_inside_window() {
        let mut sum = RollingSum::new(2);
        sum.update(Some(1.0));
        assert_eq!(sum.update(None), None);
        assert_eq!(sum.update(Some(2.0)), None);
        assert_eq!(sum.update(Some(3.0)), Some(5.0));
    }

    #[test]
    fn test_rolling_sum_nan_counts_as_undefined() {
        let mut sum = RollingSum::new(1);
        assert_eq!(sum.update(Some(f64::NAN)), None);
        assert_eq!(sum.update(Some(2.0)), Some(2.0));
    }

    #[test]
    fn test_zscore_gate_creation() {
        let gate = ZScoreGate::new(10);
        assert!(!gate.is_ready());
    }

    #[test]
    fn test_zscore_uses_sample_std() {
        let mut gate = ZScoreGate::new(4);
        for v in [1.0, 2.0, 3.0] {
            assert!(gate.update(Some(v)).is_none());
        }
        let result = gate.update(Some(4.0)).unwrap();
        // mean 2.5, sample variance 5/3
        assert_relative_eq!(result.mean, 2.5);
        assert_relative_eq!(result.std_dev, (5.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(result.z_score, 1.5 / (5.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_eq!(result.current, 4.0);
    }

    #[test]
    fn test_zscore_flat_window_is_undefined() {
        let mut gate = ZScoreGate::new(3);
        gate.update(Some(5.0));
        gate.update(Some(5.0));
        assert!(gate.update(Some(5.0)).is_none());
    }

    #[test]
    fn test_zscore_negative_deviation() {
        let mut gate = ZScoreGate::new(10);
        for _ in 0..9 {
            gate.update(Some(100.0));
        }
        let result = gate.update(Some(90.0)).unwrap();
        assert!(result.z_score < 0.0);
    }

    #[test]
    fn test_reset() {
        let mut gate = ZScoreGate::new(2);
        gate.update(Some(1.0));
        gate.update(Some(2.0));
        assert!(gate.is_ready());

        gate.reset();
        assert!(!gate.is_ready());
    }
}
