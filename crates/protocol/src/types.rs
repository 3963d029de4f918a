use serde::{Deserialize, Serialize};

/// Half-open scroll range `[start, end)` in pixels of scroll offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub start: f64,
    pub end: f64,
}

impl Boundary {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Whether `offset` lies inside the range. Empty or inverted ranges
    /// contain nothing.
    pub fn contains(&self, offset: f64) -> bool {
        offset >= self.start && offset < self.end
    }

    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Fraction of the range covered at `offset`, clamped to `[0, 1]`.
    ///
    /// An empty range reports `1.0` once the offset has reached its start.
    pub fn progress_at(&self, offset: f64) -> f64 {
        if self.is_empty() {
            return if offset >= self.start { 1.0 } else { 0.0 };
        }
        ((offset - self.start) / self.len()).clamp(0.0, 1.0)
    }
}

/// Scroll position as owned by the smooth-scroll driver.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollState {
    /// Offset the user (or a programmatic scroll) asked for.
    pub raw_offset: f64,
    /// Eased offset actually published to consumers.
    pub smoothed_offset: f64,
    /// Pixels per second of the smoothed offset over the last frame.
    pub velocity: f64,
}

/// Visible window of the host surface, in host pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_open_range() {
        let b = Boundary::new(0.0, 100.0);
        assert!(b.contains(0.0));
        assert!(b.contains(99.9));
        assert!(!b.contains(100.0));
        assert!(!b.contains(-0.1));
    }

    #[test]
    fn progress_is_clamped() {
        let b = Boundary::new(100.0, 300.0);
        assert_eq!(b.progress_at(50.0), 0.0);
        assert!((b.progress_at(200.0) - 0.5).abs() < f64::EPSILON);
        assert_eq!(b.progress_at(400.0), 1.0);
    }

    #[test]
    fn empty_range_jumps_to_done() {
        let b = Boundary::new(50.0, 50.0);
        assert!(b.is_empty());
        assert!(!b.contains(50.0));
        assert_eq!(b.progress_at(49.0), 0.0);
        assert_eq!(b.progress_at(50.0), 1.0);
    }
}
