//! Intro sequence shown before the page becomes interactive.
//!
//! A counter and bar fill from 0 to 100, a status line cycles through
//! messages, then the circle expands and the overlay fades out. The
//! sequence reports completion exactly once.

use scrollreel_protocol::{Ease, FrameCommand, Property, PropertyValues, SharedStr};
use tracing::info;

use crate::config::LoadingConfig;
use crate::timeline::{Position, Step, Timeline, TimelineKind};

pub const CONTAINER: &str = "loading";
pub const COUNTER: &str = "loading.counter";
pub const BAR: &str = "loading.bar";
pub const CIRCLE: &str = "loading.circle";
pub const STATUS: &str = "loading.status";

#[derive(Debug, Clone)]
pub struct LoadingSequence {
    timeline: Timeline,
    statuses: Vec<SharedStr>,
    status_index: usize,
    status_interval: f64,
    status_elapsed: f64,
    started: bool,
    done: bool,
}

impl LoadingSequence {
    pub fn new(config: &LoadingConfig) -> Self {
        let mut timeline = Timeline::builder(TimelineKind::Autoplay)
            .step(
                Step::new(COUNTER)
                    .from(PropertyValues::new().with(Property::Value, 0.0))
                    .to(PropertyValues::new().with(Property::Value, 100.0))
                    .duration(config.duration)
                    .ease(config.ease),
            )
            .step(
                Step::new(BAR)
                    .from(PropertyValues::new().with(Property::Width, 0.0))
                    .to(PropertyValues::new().with(Property::Width, 100.0))
                    .duration(config.duration)
                    .ease(config.ease)
                    .at(Position::WithPrevious(0.0)),
            )
            .step(
                Step::new(CIRCLE)
                    .from(
                        PropertyValues::new()
                            .with(Property::Scale, 1.0)
                            .with(Property::Opacity, 1.0),
                    )
                    .to(PropertyValues::new()
                        .with(Property::Scale, 50.0)
                        .with(Property::Opacity, 0.0))
                    .duration(0.8)
                    .ease(Ease::PowerIn(4))
                    .at(Position::Relative(0.3)),
            )
            .step(
                Step::new(CONTAINER)
                    .from(PropertyValues::new().with(Property::Opacity, 1.0))
                    .to(PropertyValues::new().with(Property::Opacity, 0.0))
                    .duration(0.3),
            )
            .build();
        timeline.play();

        Self {
            timeline,
            statuses: config.statuses.iter().map(|s| s.as_str().into()).collect(),
            status_index: 0,
            status_interval: f64::from(config.status_interval_ms) / 1000.0,
            status_elapsed: 0.0,
            started: false,
            done: false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn progress(&self) -> f64 {
        self.timeline.progress()
    }

    /// Advance the sequence. The first call renders the initial state; the
    /// call that finishes the timeline ends with `LoadingComplete`.
    pub fn advance(&mut self, dt: f64) -> Vec<FrameCommand> {
        if self.done {
            return Vec::new();
        }
        let mut commands = Vec::new();

        if !self.started {
            self.started = true;
            commands.extend(self.timeline.start_values().into_iter().map(
                |(target, property, value)| FrameCommand::SetProperty {
                    target,
                    property,
                    value,
                },
            ));
            if let Some(first) = self.statuses.first() {
                commands.push(FrameCommand::SetText {
                    target: STATUS.into(),
                    text: first.clone(),
                });
            }
        }

        commands.extend(self.timeline.advance(dt));
        commands.extend(self.advance_status(dt));

        if self.timeline.is_finished() {
            self.done = true;
            info!("Loading sequence complete");
            commands.push(FrameCommand::LoadingComplete);
        }
        commands
    }

    /// Statuses advance one per interval and stop at the last one.
    fn advance_status(&mut self, dt: f64) -> Option<FrameCommand> {
        if self.status_interval <= 0.0 || self.statuses.is_empty() {
            return None;
        }
        let before = self.status_index;
        self.status_elapsed += dt;
        while self.status_elapsed >= self.status_interval
            && self.status_index + 1 < self.statuses.len()
        {
            self.status_elapsed -= self.status_interval;
            self.status_index += 1;
        }
        if self.status_index == before {
            return None;
        }
        Some(FrameCommand::SetText {
            target: STATUS.into(),
            text: self.statuses[self.status_index].clone(),
        })
    }
}
