//! Keyframe-style property timelines.
//!
//! A [`Timeline`] is a resolved list of tweens on a shared clock. The value
//! of every animated property at time `t` is a pure function of `t`, so the
//! same timeline serves time-driven playback ([`TimelineKind::Autoplay`])
//! and scroll-driven scrubbing ([`TimelineKind::Scrubbed`]).

pub mod engine;
pub mod toggle;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use scrollreel_protocol::{Ease, FrameCommand, Property, PropertyValues, SharedStr};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

pub use engine::{AnimationEngine, TimelineHandle};
pub use toggle::{ToggleAction, ToggleActions};

/// Where a step starts on its timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Position {
    /// Seconds from the timeline start (after its delay).
    Absolute(f64),
    /// Seconds after the previous step ends; negative values overlap it
    /// (`"-=0.4"`).
    Relative(f64),
    /// Seconds after the previous step starts (`"<"`, `"<0.2"`).
    WithPrevious(f64),
}

impl Default for Position {
    fn default() -> Self {
        Position::Relative(0.0)
    }
}

impl FromStr for Position {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bad = || ParseError::Position(s.to_string());
        let number = |text: &str| -> Result<f64, ParseError> {
            text.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(bad)
        };

        if s.is_empty() {
            return Ok(Position::default());
        }
        if let Some(rest) = s.strip_prefix("-=") {
            return Ok(Position::Relative(-number(rest)?));
        }
        if let Some(rest) = s.strip_prefix("+=") {
            return Ok(Position::Relative(number(rest)?));
        }
        if let Some(rest) = s.strip_prefix('<') {
            if rest.is_empty() {
                return Ok(Position::WithPrevious(0.0));
            }
            return Ok(Position::WithPrevious(number(rest)?));
        }
        let at = number(s)?;
        if at < 0.0 {
            return Err(bad());
        }
        Ok(Position::Absolute(at))
    }
}

impl TryFrom<String> for Position {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Position> for String {
    fn from(position: Position) -> Self {
        position.to_string()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Position::Absolute(at) => write!(f, "{at}"),
            Position::Relative(d) if d < 0.0 => write!(f, "-={}", -d),
            Position::Relative(d) => write!(f, "+={d}"),
            Position::WithPrevious(d) if d == 0.0 => f.write_str("<"),
            Position::WithPrevious(d) => write!(f, "<{d}"),
        }
    }
}

/// One authored step: animate `targets` from `from` to `to`.
///
/// With several targets and a non-zero stagger, each target starts
/// `stagger` seconds after the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub targets: Vec<SharedStr>,
    pub from: PropertyValues,
    pub to: PropertyValues,
    pub duration: f64,
    pub ease: Ease,
    pub stagger: f64,
    pub position: Position,
}

impl Step {
    pub fn new(target: impl Into<SharedStr>) -> Self {
        Self::many([target.into()])
    }

    pub fn many(targets: impl IntoIterator<Item = SharedStr>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
            from: PropertyValues::new(),
            to: PropertyValues::new(),
            duration: 0.5,
            ease: Ease::Linear,
            stagger: 0.0,
            position: Position::default(),
        }
    }

    pub fn from(mut self, values: PropertyValues) -> Self {
        self.from = values;
        self
    }

    pub fn to(mut self, values: PropertyValues) -> Self {
        self.to = values;
        self
    }

    pub fn duration(mut self, seconds: f64) -> Self {
        self.duration = seconds.max(0.0);
        self
    }

    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn stagger(mut self, seconds: f64) -> Self {
        self.stagger = seconds.max(0.0);
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }
}

/// A resolved property transition on one target.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub target: SharedStr,
    pub from: PropertyValues,
    pub to: PropertyValues,
    pub start: f64,
    pub duration: f64,
    pub ease: Ease,
}

impl Tween {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    fn local_progress(&self, t: f64, finished: bool) -> f64 {
        if finished {
            return 1.0;
        }
        if self.duration <= 0.0 {
            return if t > self.start { 1.0 } else { 0.0 };
        }
        ((t - self.start) / self.duration).clamp(0.0, 1.0)
    }

    fn value(&self, property: Property, t: f64, finished: bool) -> f64 {
        let from = self.from.get(property).unwrap_or(property.rest_value());
        let to = self.to.get(property).unwrap_or(property.rest_value());
        let p = self.ease.apply(self.local_progress(t, finished));
        // Exact at both ends: p == 0 gives `from`, p == 1 gives `to`.
        from * (1.0 - p) + to * p
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimelineKind {
    /// Runs on frame time once played.
    Autoplay,
    /// Position set from outside through [`Timeline::set_progress`].
    Scrubbed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Playback {
    /// Not moving. Start state of every timeline.
    Idle,
    Playing,
    Reversing,
    Paused,
    Finished,
    Cancelled,
}

/// Builder collecting steps before their start times are resolved.
#[derive(Debug, Clone)]
pub struct TimelineBuilder {
    kind: TimelineKind,
    delay: f64,
    steps: Vec<Step>,
}

impl TimelineBuilder {
    pub fn delay(mut self, seconds: f64) -> Self {
        self.delay = seconds.max(0.0);
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps.extend(steps);
        self
    }

    pub fn build(self) -> Timeline {
        let mut tweens = Vec::new();
        let mut prev_start = 0.0_f64;
        let mut prev_end = 0.0_f64;

        for step in self.steps {
            let start = match step.position {
                Position::Absolute(at) => at,
                Position::Relative(offset) => prev_end + offset,
                Position::WithPrevious(offset) => prev_start + offset,
            }
            .max(0.0);

            let mut step_end = start;
            for (i, target) in step.targets.iter().enumerate() {
                let tween = Tween {
                    target: target.clone(),
                    from: step.from.clone(),
                    to: step.to.clone(),
                    start: start + i as f64 * step.stagger,
                    duration: step.duration,
                    ease: step.ease,
                };
                step_end = step_end.max(tween.end());
                tweens.push(tween);
            }

            prev_start = start;
            prev_end = step_end;
        }

        Timeline::from_tweens(self.kind, self.delay, tweens)
    }
}

/// Key of one animated channel.
type Channel = (SharedStr, Property);

/// An ordered set of tweens plus a playhead.
#[derive(Debug, Clone)]
pub struct Timeline {
    kind: TimelineKind,
    delay: f64,
    duration: f64,
    /// Tween indices per channel, sorted by start (stable in declaration order).
    channels: BTreeMap<Channel, Vec<usize>>,
    tweens: Vec<Tween>,
    /// Seconds from the timeline start; negative while inside the delay.
    playhead: f64,
    playback: Playback,
    /// Direction `resume` continues in.
    reversed: bool,
}

impl Timeline {
    pub fn builder(kind: TimelineKind) -> TimelineBuilder {
        TimelineBuilder {
            kind,
            delay: 0.0,
            steps: Vec::new(),
        }
    }

    pub fn from_tweens(kind: TimelineKind, delay: f64, tweens: Vec<Tween>) -> Self {
        let mut channels: BTreeMap<Channel, Vec<usize>> = BTreeMap::new();
        for (i, tween) in tweens.iter().enumerate() {
            for property in tween.from.properties().chain(tween.to.properties()) {
                let list = channels.entry((tween.target.clone(), property)).or_default();
                if !list.contains(&i) {
                    list.push(i);
                }
            }
        }
        for list in channels.values_mut() {
            list.sort_by(|a, b| tweens[*a].start.total_cmp(&tweens[*b].start));
        }

        let duration = tweens.iter().map(Tween::end).fold(0.0, f64::max);
        let delay = if kind == TimelineKind::Scrubbed {
            0.0
        } else {
            delay.max(0.0)
        };

        Self {
            kind,
            delay,
            duration,
            channels,
            tweens,
            playhead: -delay,
            playback: Playback::Idle,
            reversed: false,
        }
    }

    pub fn kind(&self) -> TimelineKind {
        self.kind
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn delay(&self) -> f64 {
        self.delay
    }

    pub fn playback(&self) -> Playback {
        self.playback
    }

    pub fn tweens(&self) -> &[Tween] {
        &self.tweens
    }

    pub fn is_cancelled(&self) -> bool {
        self.playback == Playback::Cancelled
    }

    pub fn is_finished(&self) -> bool {
        self.playback == Playback::Finished
    }

    pub fn is_running(&self) -> bool {
        matches!(self.playback, Playback::Playing | Playback::Reversing)
    }

    /// Fraction of the timeline behind the playhead.
    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            return if self.playback == Playback::Finished { 1.0 } else { 0.0 };
        }
        (self.playhead / self.duration).clamp(0.0, 1.0)
    }

    /// Every target this timeline writes to.
    pub fn targets(&self) -> Vec<SharedStr> {
        let mut targets: Vec<SharedStr> = self.channels.keys().map(|(t, _)| t.clone()).collect();
        targets.dedup();
        targets
    }

    pub fn writes_to(&self, target: &str) -> bool {
        self.channels.keys().any(|(t, _)| t.as_str() == target)
    }

    /// Value of every channel at time `t`.
    ///
    /// A channel takes its value from the latest tween that has started by
    /// `t`; before any tween on it starts it holds the first tween's `from`.
    /// `finished` treats every tween as complete.
    fn sample(&self, t: f64, finished: bool) -> Vec<(SharedStr, Property, f64)> {
        self.channels
            .iter()
            .filter_map(|((target, property), indices)| {
                let first = *indices.first()?;
                let current = if finished {
                    indices.last().copied().unwrap_or(first)
                } else {
                    indices
                        .iter()
                        .copied()
                        .rev()
                        .find(|&i| self.tweens[i].start <= t)
                        .unwrap_or(first)
                };
                let value = self.tweens[current].value(*property, t, finished);
                Some((target.clone(), *property, value))
            })
            .collect()
    }

    /// Channel values at progress `p` without moving the playhead.
    pub fn values_at(&self, p: f64) -> Vec<(SharedStr, Property, f64)> {
        let p = p.clamp(0.0, 1.0);
        self.sample(p * self.duration, p >= 1.0)
    }

    pub fn start_values(&self) -> Vec<(SharedStr, Property, f64)> {
        self.values_at(0.0)
    }

    pub fn end_values(&self) -> Vec<(SharedStr, Property, f64)> {
        self.values_at(1.0)
    }

    fn writes(values: Vec<(SharedStr, Property, f64)>) -> Vec<FrameCommand> {
        values
            .into_iter()
            .map(|(target, property, value)| FrameCommand::SetProperty {
                target,
                property,
                value,
            })
            .collect()
    }

    /// Jump to progress `p ∈ [0, 1]` and return the writes for that point.
    ///
    /// Purely a function of `p`: calling it twice with the same value
    /// yields the same writes, in either direction. Cancelled timelines
    /// write nothing.
    pub fn set_progress(&mut self, p: f64) -> Vec<FrameCommand> {
        if self.is_cancelled() {
            return Vec::new();
        }
        let p = p.clamp(0.0, 1.0);
        self.playhead = p * self.duration;
        Self::writes(self.values_at(p))
    }

    pub fn play(&mut self) {
        match self.playback {
            Playback::Cancelled | Playback::Finished => {}
            _ => {
                self.playback = Playback::Playing;
                self.reversed = false;
            }
        }
    }

    pub fn reverse(&mut self) {
        if self.is_cancelled() {
            return;
        }
        if self.playhead <= 0.0 {
            self.playhead = 0.0;
            self.playback = Playback::Idle;
        } else {
            self.playback = Playback::Reversing;
        }
        self.reversed = true;
    }

    pub fn pause(&mut self) {
        if self.is_running() {
            self.playback = Playback::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.playback != Playback::Paused {
            return;
        }
        self.playback = if self.reversed {
            Playback::Reversing
        } else {
            Playback::Playing
        };
    }

    /// Rewind to the start (including the delay) and play.
    pub fn restart(&mut self) {
        if self.is_cancelled() {
            return;
        }
        self.playhead = -self.delay;
        self.playback = Playback::Playing;
        self.reversed = false;
    }

    /// Jump to the start and stop; returns the start writes.
    pub fn reset(&mut self) -> Vec<FrameCommand> {
        if self.is_cancelled() {
            return Vec::new();
        }
        self.playhead = -self.delay;
        self.playback = Playback::Idle;
        self.reversed = false;
        Self::writes(self.start_values())
    }

    /// Jump to the end and stop; returns the end writes.
    pub fn complete(&mut self) -> Vec<FrameCommand> {
        if self.is_cancelled() {
            return Vec::new();
        }
        self.playhead = self.duration;
        self.playback = Playback::Finished;
        Self::writes(self.end_values())
    }

    /// Halt immediately. No further writes are produced.
    pub fn cancel(&mut self) {
        self.playback = Playback::Cancelled;
    }

    /// Move the playhead by `dt` seconds in the current direction and return
    /// the resulting writes. Idle, paused, finished and scrubbed timelines
    /// do not move.
    pub fn advance(&mut self, dt: f64) -> Vec<FrameCommand> {
        if self.kind == TimelineKind::Scrubbed {
            return Vec::new();
        }
        match self.playback {
            Playback::Playing => {
                self.playhead += dt;
                if self.playhead < 0.0 {
                    return Vec::new();
                }
                if self.playhead >= self.duration {
                    return self.complete();
                }
                Self::writes(self.sample(self.playhead, false))
            }
            Playback::Reversing => {
                self.playhead = self.playhead.min(self.duration) - dt;
                if self.playhead <= 0.0 {
                    self.playhead = 0.0;
                    self.playback = Playback::Idle;
                    return Self::writes(self.start_values());
                }
                Self::writes(self.sample(self.playhead, false))
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fade_up(target: &str) -> Step {
        Step::new(target)
            .from(
                PropertyValues::new()
                    .with(Property::Opacity, 0.0)
                    .with(Property::Y, 30.0),
            )
            .to(
                PropertyValues::new()
                    .with(Property::Opacity, 1.0)
                    .with(Property::Y, 0.0),
            )
            .duration(0.8)
            .ease(Ease::PowerOut(3))
    }

    fn value_of(values: &[(SharedStr, Property, f64)], target: &str, property: Property) -> f64 {
        values
            .iter()
            .find(|(t, p, _)| *t == target && *p == property)
            .map(|(_, _, v)| *v)
            .unwrap()
    }

    #[test]
    fn relative_positions_overlap_previous_step() {
        let tl = Timeline::builder(TimelineKind::Autoplay)
            .step(fade_up("greeting"))
            .step(fade_up("name").duration(1.0).at(Position::Relative(-0.4)))
            .step(fade_up("role").duration(0.6).at(Position::Relative(-0.5)))
            .build();
        let starts: Vec<f64> = tl.tweens().iter().map(|t| t.start).collect();
        assert!((starts[0] - 0.0).abs() < 1e-9);
        assert!((starts[1] - 0.4).abs() < 1e-9);
        assert!((starts[2] - 0.9).abs() < 1e-9);
        assert!((tl.duration() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn stagger_spreads_targets() {
        let tl = Timeline::builder(TimelineKind::Autoplay)
            .step(
                Step::many(["a", "b", "c"].map(SharedStr::from))
                    .to(PropertyValues::new().with(Property::Scale, 1.0))
                    .from(PropertyValues::new().with(Property::Scale, 0.8))
                    .duration(0.4)
                    .stagger(0.1),
            )
            .step(fade_up("after").at(Position::WithPrevious(0.0)))
            .build();
        let starts: Vec<f64> = tl.tweens().iter().map(|t| t.start).collect();
        assert_eq!(starts.len(), 4);
        assert!((starts[2] - 0.2).abs() < 1e-9);
        assert_eq!(starts[3], 0.0);
        assert!((tl.duration() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn progress_endpoints_are_exact() {
        let mut tl = Timeline::builder(TimelineKind::Scrubbed)
            .step(fade_up("hero"))
            .step(
                Step::new("hero")
                    .from(PropertyValues::new().with(Property::Scale, 1.0))
                    .to(PropertyValues::new().with(Property::Scale, 1.2))
                    .duration(0.3)
                    .at(Position::Absolute(0.5)),
            )
            .build();

        tl.set_progress(0.0);
        let start = tl.start_values();
        assert_eq!(value_of(&start, "hero", Property::Opacity), 0.0);
        assert_eq!(value_of(&start, "hero", Property::Y), 30.0);
        assert_eq!(value_of(&start, "hero", Property::Scale), 1.0);

        let end = tl.end_values();
        assert_eq!(value_of(&end, "hero", Property::Opacity), 1.0);
        assert_eq!(value_of(&end, "hero", Property::Y), 0.0);
        assert_eq!(value_of(&end, "hero", Property::Scale), 1.2);
    }

    #[test]
    fn set_progress_is_idempotent_and_reversible() {
        let mut tl = Timeline::builder(TimelineKind::Scrubbed)
            .step(fade_up("hero"))
            .build();
        let first = tl.set_progress(0.37);
        let again = tl.set_progress(0.37);
        assert_eq!(first, again);

        tl.set_progress(0.9);
        tl.set_progress(0.1);
        assert_eq!(tl.set_progress(0.37), first);
    }

    #[test]
    fn later_tween_takes_over_channel() {
        let tl = Timeline::builder(TimelineKind::Autoplay)
            .step(
                Step::new("box")
                    .from(PropertyValues::new().with(Property::X, 0.0))
                    .to(PropertyValues::new().with(Property::X, 100.0))
                    .duration(1.0),
            )
            .step(
                Step::new("box")
                    .from(PropertyValues::new().with(Property::X, 100.0))
                    .to(PropertyValues::new().with(Property::X, 50.0))
                    .duration(1.0),
            )
            .build();
        let mid_first = tl.values_at(0.25);
        assert!((value_of(&mid_first, "box", Property::X) - 50.0).abs() < 1e-9);
        let mid_second = tl.values_at(0.75);
        assert!((value_of(&mid_second, "box", Property::X) - 75.0).abs() < 1e-9);
    }

    #[test]
    fn autoplay_honours_delay_then_finishes() {
        let mut tl = Timeline::builder(TimelineKind::Autoplay)
            .delay(0.5)
            .step(fade_up("greeting"))
            .build();
        tl.play();
        assert!(tl.advance(0.25).is_empty());
        assert!(!tl.advance(0.5).is_empty());
        assert_eq!(tl.playback(), Playback::Playing);
        let last = tl.advance(1.0);
        assert_eq!(tl.playback(), Playback::Finished);
        assert!(last.contains(&FrameCommand::SetProperty {
            target: "greeting".into(),
            property: Property::Opacity,
            value: 1.0,
        }));
    }

    #[test]
    fn reverse_returns_to_start_values() {
        let mut tl = Timeline::builder(TimelineKind::Autoplay)
            .step(fade_up("card"))
            .build();
        tl.play();
        tl.advance(0.4);
        tl.reverse();
        let writes = tl.advance(1.0);
        assert_eq!(tl.playback(), Playback::Idle);
        assert!(writes.contains(&FrameCommand::SetProperty {
            target: "card".into(),
            property: Property::Opacity,
            value: 0.0,
        }));
    }

    #[test]
    fn cancelled_timeline_writes_nothing() {
        let mut tl = Timeline::builder(TimelineKind::Scrubbed)
            .step(fade_up("hero"))
            .build();
        tl.cancel();
        assert!(tl.set_progress(0.5).is_empty());
        tl.play();
        assert!(tl.advance(0.1).is_empty());
    }

    #[test]
    fn parses_positions() {
        assert_eq!("-=0.4".parse(), Ok(Position::Relative(-0.4)));
        assert_eq!("+=0.2".parse(), Ok(Position::Relative(0.2)));
        assert_eq!("<".parse(), Ok(Position::WithPrevious(0.0)));
        assert_eq!("1.5".parse(), Ok(Position::Absolute(1.5)));
        assert_eq!("".parse(), Ok(Position::Relative(0.0)));
        assert!("-1".parse::<Position>().is_err());
        assert!("soon".parse::<Position>().is_err());
    }
}
