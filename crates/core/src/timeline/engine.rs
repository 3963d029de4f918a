use std::collections::HashMap;

use scrollreel_protocol::{FrameCommand, Property, PropertyValues, SharedStr};
use tracing::debug;

use super::toggle::ToggleAction;
use super::{Position, Step, Timeline, TimelineKind, Tween};
use crate::arena::{Arena, ArenaKey};

/// Handle returned by [`AnimationEngine::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimelineHandle(pub(crate) ArenaKey);

/// Owns every live timeline and advances them on frame time.
///
/// Each target element is owned by at most one timeline. Adding a timeline
/// that writes to an owned target cancels the previous owner first, so two
/// timelines never write the same element in one frame.
#[derive(Debug, Default)]
pub struct AnimationEngine {
    timelines: Arena<Timeline>,
    owners: HashMap<SharedStr, TimelineHandle>,
    /// Writes produced between ticks (start values, toggle jumps, scrubs).
    pending: Vec<FrameCommand>,
    /// Last value handed out per channel.
    rendered: HashMap<(SharedStr, Property), f64>,
}

impl AnimationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a timeline. Its start values are rendered on the
    /// next tick so elements never flash their resting state.
    pub fn add(&mut self, timeline: Timeline) -> TimelineHandle {
        let targets = timeline.targets();

        let mut superseded: Vec<TimelineHandle> = targets
            .iter()
            .filter_map(|target| self.owners.get(target).copied())
            .collect();
        superseded.sort_unstable();
        superseded.dedup();
        for previous in superseded {
            debug!(?previous, "Timeline superseded by a new owner");
            self.cancel(previous);
        }

        self.pending.extend(
            timeline
                .start_values()
                .into_iter()
                .map(|(target, property, value)| FrameCommand::SetProperty {
                    target,
                    property,
                    value,
                }),
        );

        let handle = TimelineHandle(self.timelines.insert(timeline));
        for target in targets {
            self.owners.insert(target, handle);
        }
        handle
    }

    /// Start an autoplay tween towards `step.to` and play it.
    ///
    /// Properties missing from `step.from` start at the value last rendered
    /// for the target, so a tween that replaces a running one continues
    /// from where the element is instead of jumping. Each target is offset
    /// by `stagger`; the step position counts only when absolute.
    pub fn tween_to(&mut self, step: Step) -> TimelineHandle {
        let base = match step.position {
            Position::Absolute(at) => at.max(0.0),
            _ => 0.0,
        };
        let tweens: Vec<Tween> = step
            .targets
            .iter()
            .enumerate()
            .map(|(i, target)| {
                let from: PropertyValues = step
                    .to
                    .properties()
                    .map(|property| {
                        let start = step
                            .from
                            .get(property)
                            .unwrap_or_else(|| self.current_value(target, property));
                        (property, start)
                    })
                    .collect();
                Tween {
                    target: target.clone(),
                    from,
                    to: step.to.clone(),
                    start: base + i as f64 * step.stagger,
                    duration: step.duration,
                    ease: step.ease,
                }
            })
            .collect();
        let handle = self.add(Timeline::from_tweens(TimelineKind::Autoplay, 0.0, tweens));
        self.play(handle);
        handle
    }

    /// Value last rendered for `property` on `target`, or its resting value.
    pub fn current_value(&self, target: &SharedStr, property: Property) -> f64 {
        self.rendered
            .get(&(target.clone(), property))
            .copied()
            .unwrap_or(property.rest_value())
    }

    /// Cancel and drop a timeline. Returns `false` for unknown handles.
    pub fn cancel(&mut self, handle: TimelineHandle) -> bool {
        let Some(mut timeline) = self.timelines.remove(handle.0) else {
            return false;
        };
        timeline.cancel();
        self.owners.retain(|_, owner| *owner != handle);
        let superseded: Vec<SharedStr> = timeline.targets();
        // Writes queued for the cancelled timeline's targets are dropped too.
        self.pending
            .retain(|cmd| cmd.target().is_none_or(|t| !superseded.contains(t)));
        true
    }

    pub fn get(&self, handle: TimelineHandle) -> Option<&Timeline> {
        self.timelines.get(handle.0)
    }

    pub fn contains(&self, handle: TimelineHandle) -> bool {
        self.timelines.contains(handle.0)
    }

    pub fn owner_of(&self, target: &str) -> Option<TimelineHandle> {
        self.owners.get(target).copied()
    }

    /// Timelines currently able to write `target`. Never more than one.
    pub fn active_timelines_for(&self, target: &str) -> Vec<TimelineHandle> {
        self.timelines
            .keys()
            .into_iter()
            .map(TimelineHandle)
            .filter(|h| {
                self.timelines
                    .get(h.0)
                    .is_some_and(|tl| !tl.is_cancelled() && tl.writes_to(target))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.timelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }

    pub fn set_progress(&mut self, handle: TimelineHandle, progress: f64) {
        if let Some(timeline) = self.timelines.get_mut(handle.0) {
            let writes = timeline.set_progress(progress);
            self.pending.extend(writes);
        }
    }

    pub fn play(&mut self, handle: TimelineHandle) {
        self.apply_toggle(handle, ToggleAction::Play);
    }

    pub fn reverse(&mut self, handle: TimelineHandle) {
        self.apply_toggle(handle, ToggleAction::Reverse);
    }

    pub fn apply_toggle(&mut self, handle: TimelineHandle, action: ToggleAction) {
        let Some(timeline) = self.timelines.get_mut(handle.0) else {
            return;
        };
        let writes = match action {
            ToggleAction::Play => {
                timeline.play();
                Vec::new()
            }
            ToggleAction::Pause => {
                timeline.pause();
                Vec::new()
            }
            ToggleAction::Resume => {
                timeline.resume();
                Vec::new()
            }
            ToggleAction::Reverse => {
                timeline.reverse();
                Vec::new()
            }
            ToggleAction::Restart => {
                timeline.restart();
                Vec::new()
            }
            ToggleAction::Reset => timeline.reset(),
            ToggleAction::Complete => timeline.complete(),
            ToggleAction::None => Vec::new(),
        };
        self.pending.extend(writes);
    }

    /// Advance every running timeline by `dt` seconds.
    ///
    /// Returns the writes queued since the last tick followed by this
    /// frame's writes, in timeline registration order.
    pub fn tick(&mut self, dt: f64) -> Vec<FrameCommand> {
        let mut commands = std::mem::take(&mut self.pending);
        for key in self.timelines.keys() {
            if let Some(timeline) = self.timelines.get_mut(key) {
                commands.extend(timeline.advance(dt));
            }
        }
        for command in &commands {
            if let FrameCommand::SetProperty {
                target,
                property,
                value,
            } = command
            {
                self.rendered.insert((target.clone(), *property), *value);
            }
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::{Playback, Step, TimelineKind};
    use scrollreel_protocol::{Property, PropertyValues};

    fn fade(target: &str) -> Timeline {
        Timeline::builder(TimelineKind::Autoplay)
            .step(
                Step::new(target)
                    .from(PropertyValues::new().with(Property::Opacity, 0.0))
                    .to(PropertyValues::new().with(Property::Opacity, 1.0))
                    .duration(1.0),
            )
            .build()
    }

    #[test]
    fn start_values_render_on_first_tick() {
        let mut engine = AnimationEngine::new();
        engine.add(fade("card"));
        let commands = engine.tick(0.016);
        assert_eq!(
            commands,
            vec![FrameCommand::SetProperty {
                target: "card".into(),
                property: Property::Opacity,
                value: 0.0,
            }]
        );
    }

    #[test]
    fn new_owner_cancels_previous_timeline() {
        let mut engine = AnimationEngine::new();
        let first = engine.add(fade("card"));
        engine.play(first);
        engine.tick(0.5);

        let second = engine.add(fade("card"));
        assert!(!engine.contains(first));
        assert_eq!(engine.owner_of("card"), Some(second));
        assert_eq!(engine.active_timelines_for("card"), vec![second]);
    }

    #[test]
    fn playing_timeline_finishes() {
        let mut engine = AnimationEngine::new();
        let handle = engine.add(fade("card"));
        engine.play(handle);
        engine.tick(0.5);
        let last = engine.tick(0.6);
        assert_eq!(
            engine.get(handle).map(Timeline::playback),
            Some(Playback::Finished)
        );
        assert_eq!(
            last.last(),
            Some(&FrameCommand::SetProperty {
                target: "card".into(),
                property: Property::Opacity,
                value: 1.0,
            })
        );
    }

    #[test]
    fn complete_and_reset_write_immediately() {
        let mut engine = AnimationEngine::new();
        let handle = engine.add(fade("card"));
        engine.tick(0.0);
        engine.apply_toggle(handle, ToggleAction::Complete);
        engine.apply_toggle(handle, ToggleAction::Reset);
        let writes = engine.tick(0.0);
        let values: Vec<f64> = writes
            .iter()
            .filter_map(|cmd| match cmd {
                FrameCommand::SetProperty { value, .. } => Some(*value),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec![1.0, 0.0]);
    }

    #[test]
    fn tween_to_continues_from_rendered_value() {
        let mut engine = AnimationEngine::new();
        let to_x = |x: f64| {
            Step::new("cursor")
                .to(PropertyValues::new().with(Property::X, x))
                .duration(0.1)
        };
        assert_eq!(engine.current_value(&"cursor".into(), Property::X), 0.0);

        let first = engine.tween_to(to_x(100.0));
        engine.tick(0.0);
        engine.tick(0.05);
        let midway = engine.current_value(&"cursor".into(), Property::X);
        assert!(midway > 0.0 && midway < 100.0);

        let second = engine.tween_to(to_x(-40.0));
        assert!(!engine.contains(first));
        assert_eq!(engine.active_timelines_for("cursor"), vec![second]);
        let restart = engine.tick(0.0);
        assert_eq!(
            restart.first(),
            Some(&FrameCommand::SetProperty {
                target: "cursor".into(),
                property: Property::X,
                value: midway,
            })
        );

        engine.tick(0.2);
        assert_eq!(engine.current_value(&"cursor".into(), Property::X), -40.0);
        assert_eq!(
            engine.get(second).map(Timeline::playback),
            Some(Playback::Finished)
        );
    }

    #[test]
    fn tween_to_keeps_explicit_start_values() {
        let mut engine = AnimationEngine::new();
        engine.tween_to(
            Step::new("badge")
                .from(PropertyValues::new().with(Property::Opacity, 0.2))
                .to(PropertyValues::new()
                    .with(Property::Opacity, 1.0)
                    .with(Property::Scale, 2.0)),
        );
        let start = engine.tick(0.0);
        assert!(start.contains(&FrameCommand::SetProperty {
            target: "badge".into(),
            property: Property::Opacity,
            value: 0.2,
        }));
        assert!(start.contains(&FrameCommand::SetProperty {
            target: "badge".into(),
            property: Property::Scale,
            value: 1.0,
        }));
    }

    #[test]
    fn cancel_unknown_handle_is_noop() {
        let mut engine = AnimationEngine::new();
        let handle = engine.add(fade("card"));
        assert!(engine.cancel(handle));
        assert!(!engine.cancel(handle));
        assert!(engine.tick(0.1).is_empty());
    }
}
