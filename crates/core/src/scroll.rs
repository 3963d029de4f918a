//! Smoothed scroll position.
//!
//! Input moves a raw target offset; each frame the published (smoothed)
//! offset decays toward it. In immediate mode (reduced motion, or no frame
//! callback available) the smoothed offset equals the raw one after every
//! input.

use scrollreel_protocol::{Ease, ScrollState};
use tracing::debug;

use crate::config::{MIN_DAMPING, MIN_FRAME_DELTA_MS, ScrollConfig};

/// Id returned by [`SmoothScroll::on_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&ScrollState)>;

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScrollAnimation {
    from: f64,
    to: f64,
    elapsed: f64,
    duration: f64,
    ease: Ease,
}

pub struct SmoothScroll {
    state: ScrollState,
    limit: f64,
    damping: f64,
    settle_threshold: f64,
    reduced_motion: bool,
    frames_available: bool,
    animation: Option<ScrollAnimation>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl SmoothScroll {
    pub fn new(config: &ScrollConfig, reduced_motion: bool) -> Self {
        Self {
            state: ScrollState::default(),
            limit: 0.0,
            damping: config.damping.max(MIN_DAMPING),
            settle_threshold: config.settle_threshold.max(0.0),
            reduced_motion,
            frames_available: true,
            animation: None,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    pub fn limit(&self) -> f64 {
        self.limit
    }

    /// True when offsets are published synchronously on input.
    pub fn is_immediate(&self) -> bool {
        self.reduced_motion || !self.frames_available
    }

    /// True when nothing remains to animate.
    pub fn is_settled(&self) -> bool {
        self.animation.is_none() && self.state.raw_offset == self.state.smoothed_offset
    }

    /// Hosts without a frame callback switch to immediate mode.
    pub fn set_frames_available(&mut self, available: bool) {
        if self.frames_available != available {
            debug!(available, "Frame callback availability changed");
        }
        self.frames_available = available;
        if self.is_immediate() {
            self.jump_to_target();
        }
    }

    /// New scroll limit after a layout change; offsets beyond it are clamped.
    pub fn set_limit(&mut self, limit: f64) {
        self.limit = limit.max(0.0);
        self.state.raw_offset = self.clamp(self.state.raw_offset);
        self.state.smoothed_offset = self.clamp(self.state.smoothed_offset);
        if let Some(animation) = self.animation.as_mut() {
            animation.to = animation.to.clamp(0.0, self.limit);
        }
    }

    pub fn on_update(&mut self, listener: impl FnMut(&ScrollState) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }

    fn clamp(&self, offset: f64) -> f64 {
        offset.clamp(0.0, self.limit)
    }

    /// Move the target offset by `delta` px. Any programmatic scroll in
    /// flight is abandoned. In immediate mode the new offset is published
    /// and returned at once.
    pub fn scroll_by(&mut self, delta: f64) -> Option<ScrollState> {
        if !delta.is_finite() {
            return None;
        }
        self.animation = None;
        self.state.raw_offset = self.clamp(self.state.raw_offset + delta);
        if self.is_immediate() {
            return self.jump_to_target();
        }
        None
    }

    /// Animate to `target` over `duration` seconds. `None` or a zero
    /// duration (and immediate mode) jumps directly.
    pub fn scroll_to(
        &mut self,
        target: f64,
        duration: Option<f64>,
        ease: Ease,
    ) -> Option<ScrollState> {
        let to = self.clamp(target);
        match duration {
            Some(duration) if duration > 0.0 && !self.is_immediate() => {
                self.animation = Some(ScrollAnimation {
                    from: self.state.smoothed_offset,
                    to,
                    elapsed: 0.0,
                    duration,
                    ease,
                });
                self.state.raw_offset = to;
                None
            }
            _ => {
                self.animation = None;
                self.state.raw_offset = to;
                self.jump_to_target()
            }
        }
    }

    fn jump_to_target(&mut self) -> Option<ScrollState> {
        let previous = self.state.smoothed_offset;
        self.state.smoothed_offset = self.state.raw_offset;
        self.state.velocity = 0.0;
        self.animation = None;
        if previous == self.state.smoothed_offset {
            return None;
        }
        self.publish();
        Some(self.state)
    }

    /// Advance smoothing by `dt` seconds. Returns the new state when the
    /// published offset moved.
    pub fn tick(&mut self, dt: f64) -> Option<ScrollState> {
        if dt <= 0.0 {
            return None;
        }
        let previous = self.state.smoothed_offset;

        if let Some(mut animation) = self.animation.take() {
            animation.elapsed += dt;
            let t = (animation.elapsed / animation.duration).min(1.0);
            let p = animation.ease.apply(t);
            let offset = animation.from + (animation.to - animation.from) * p;
            self.state.smoothed_offset = if t >= 1.0 { animation.to } else { offset };
            self.state.raw_offset = animation.to;
            if t < 1.0 {
                self.animation = Some(animation);
            }
        } else {
            let diff = self.state.raw_offset - self.state.smoothed_offset;
            if diff.abs() <= self.settle_threshold {
                self.state.smoothed_offset = self.state.raw_offset;
            } else {
                let factor = 1.0 - (-self.damping * dt).exp();
                self.state.smoothed_offset += diff * factor;
            }
        }

        let moved = self.state.smoothed_offset - previous;
        self.state.velocity = moved / dt;
        if moved == 0.0 {
            return None;
        }
        self.publish();
        Some(self.state)
    }

    fn publish(&mut self) {
        let state = self.state;
        for (_, listener) in &mut self.listeners {
            listener(&state);
        }
    }
}

impl std::fmt::Debug for SmoothScroll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmoothScroll")
            .field("state", &self.state)
            .field("limit", &self.limit)
            .field("immediate", &self.is_immediate())
            .field("animation", &self.animation)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Converts host timestamps (ms) into simulation deltas (s).
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_ms: Option<f64>,
    max_delta_ms: f64,
}

impl FrameClock {
    pub fn new(max_delta_ms: f64) -> Self {
        Self {
            last_ms: None,
            max_delta_ms: max_delta_ms.max(MIN_FRAME_DELTA_MS),
        }
    }

    /// Seconds since the previous timestamp. The first frame, and any
    /// timestamp that goes backwards, yields zero. Gaps longer than the
    /// configured maximum are clamped.
    pub fn delta(&mut self, timestamp_ms: f64) -> f64 {
        let Some(last) = self.last_ms.replace(timestamp_ms) else {
            return 0.0;
        };
        let raw = timestamp_ms - last;
        if !raw.is_finite() || raw <= 0.0 {
            return 0.0;
        }
        if raw > self.max_delta_ms {
            debug!(gap_ms = raw, "Clamping long frame gap");
            return self.max_delta_ms / 1000.0;
        }
        raw / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn scroller(reduced: bool) -> SmoothScroll {
        let mut scroll = SmoothScroll::new(&ScrollConfig::default(), reduced);
        scroll.set_limit(5000.0);
        scroll
    }

    #[test]
    fn smoothed_offset_converges_and_settles() {
        let mut scroll = scroller(false);
        assert!(scroll.scroll_by(1000.0).is_none());
        let first = scroll.tick(1.0 / 60.0).unwrap();
        assert!(first.smoothed_offset > 0.0 && first.smoothed_offset < 1000.0);
        assert!(first.velocity > 0.0);

        for _ in 0..600 {
            scroll.tick(1.0 / 60.0);
        }
        assert_eq!(scroll.state().smoothed_offset, 1000.0);
        assert!(scroll.is_settled());
        assert!(scroll.tick(1.0 / 60.0).is_none());
    }

    #[test]
    fn offsets_clamp_to_limit() {
        let mut scroll = scroller(true);
        scroll.scroll_by(-50.0);
        assert_eq!(scroll.state().raw_offset, 0.0);
        scroll.scroll_by(9000.0);
        assert_eq!(scroll.state().smoothed_offset, 5000.0);
        scroll.set_limit(3000.0);
        assert_eq!(scroll.state().smoothed_offset, 3000.0);
    }

    #[test]
    fn immediate_mode_publishes_on_input() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut scroll = scroller(true);
        let sink = Rc::clone(&seen);
        scroll.on_update(move |s| sink.borrow_mut().push(s.smoothed_offset));

        let state = scroll.scroll_by(120.0).unwrap();
        assert_eq!(state.smoothed_offset, 120.0);
        assert_eq!(*seen.borrow(), vec![120.0]);
    }

    #[test]
    fn scroll_to_reaches_target_exactly() {
        let mut scroll = scroller(false);
        scroll.scroll_to(2400.0, Some(1.2), Ease::Smooth);
        let mut last = 0.0;
        for _ in 0..90 {
            if let Some(state) = scroll.tick(1.0 / 60.0) {
                assert!(state.smoothed_offset >= last);
                last = state.smoothed_offset;
            }
        }
        assert_eq!(scroll.state().smoothed_offset, 2400.0);
        assert!(scroll.is_settled());
    }

    #[test]
    fn user_input_cancels_programmatic_scroll() {
        let mut scroll = scroller(false);
        scroll.scroll_to(2400.0, Some(1.2), Ease::Smooth);
        scroll.tick(0.1);
        scroll.scroll_by(-10.0);
        assert!(scroll.state().raw_offset < 2400.0);
    }

    #[test]
    fn removed_listener_is_not_called() {
        let calls = Rc::new(RefCell::new(0));
        let mut scroll = scroller(true);
        let sink = Rc::clone(&calls);
        let id = scroll.on_update(move |_| *sink.borrow_mut() += 1);
        assert!(scroll.remove_listener(id));
        scroll.scroll_by(10.0);
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn frame_clock_handles_gaps() {
        let mut clock = FrameClock::new(250.0);
        assert_eq!(clock.delta(1000.0), 0.0);
        assert!((clock.delta(1016.0) - 0.016).abs() < 1e-12);
        assert_eq!(clock.delta(1010.0), 0.0);
        assert_eq!(clock.delta(5000.0), 0.25);
    }

    #[test]
    fn zero_rates_still_converge() {
        let config = ScrollConfig {
            damping: 0.0,
            ..ScrollConfig::default()
        };
        let mut scroll = SmoothScroll::new(&config, false);
        scroll.set_limit(5000.0);
        scroll.scroll_by(400.0);

        let mut clock = FrameClock::new(0.0);
        clock.delta(0.0);
        let mut t = 0.0;
        for _ in 0..20_000 {
            t += 16.0;
            let dt = clock.delta(t);
            assert!(dt > 0.0);
            scroll.tick(dt);
        }
        assert_eq!(scroll.state().smoothed_offset, 400.0);
    }
}
