//! Page orchestrator.
//!
//! Owns the scroll driver, trigger registry, timeline engine, section
//! tracker and dock for one page, and turns host input plus frame ticks
//! into [`FrameOutput`]s. Each frame runs, in order: frame clock, scroll
//! smoothing, trigger evaluation, timeline playback, loading sequence,
//! typewriter.

use std::collections::{HashMap, HashSet};

use scrollreel_protocol::{
    Ease, FrameCommand, Property, PropertyValues, ScrollState, SharedStr, Viewport,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{MotionPreference, OrchestratorConfig};
use crate::dock::{DockView, NavigationDock};
use crate::error::OrchestratorError;
use crate::layout::{Layout, PageLayout};
use crate::loading::LoadingSequence;
use crate::page::{
    CURSOR_DOT_TARGET, CURSOR_RING_TARGET, PROGRESS_BAR_TARGET, PageSpec, SectionSpec, StepSpec,
    TiltSpec,
};
use crate::scroll::{FrameClock, ListenerId, SmoothScroll};
use crate::timeline::{
    AnimationEngine, Step, Timeline, TimelineHandle, TimelineKind, ToggleAction, ToggleActions,
};
use crate::tracker::{ActiveSectionState, SectionTracker};
use crate::trigger::{Trigger, TriggerEvent, TriggerEventKind, TriggerHandle, TriggerRegistry};
use crate::typewriter::Typewriter;

/// Host input, already normalised to page pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Wheel { delta_y: f64 },
    Touch { delta_y: f64 },
    Key(ScrollKey),
    Resize { width: f64, height: f64 },
    /// A section's content changed height.
    Reflow { section: SharedStr, height: f64 },
    /// Pointer position in viewport pixels.
    PointerMove { x: f64, y: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollKey {
    LineUp,
    LineDown,
    PageUp,
    PageDown,
    Home,
    End,
}

impl ScrollKey {
    /// Parse a DOM-style key name.
    pub fn from_key_name(name: &str) -> Option<Self> {
        Some(match name {
            "ArrowUp" | "Up" => ScrollKey::LineUp,
            "ArrowDown" | "Down" => ScrollKey::LineDown,
            "PageUp" => ScrollKey::PageUp,
            "PageDown" | " " | "Space" => ScrollKey::PageDown,
            "Home" => ScrollKey::Home,
            "End" => ScrollKey::End,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PagePhase {
    /// Loading sequence running; scroll input is ignored.
    Loading,
    Ready,
}

/// Everything a host needs to render one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameOutput {
    pub phase: PagePhase,
    pub scroll: ScrollState,
    pub active: ActiveSectionState,
    pub commands: Vec<FrameCommand>,
}

/// Triggers and timelines acquired by one mounted section.
///
/// Released only through [`dispose`](Self::dispose); dropping a scope that
/// still holds handles leaks them into the registry and is logged.
#[must_use]
#[derive(Debug)]
pub struct SectionScope {
    id: SharedStr,
    triggers: Vec<TriggerHandle>,
    timelines: Vec<TimelineHandle>,
}

impl SectionScope {
    fn new(id: SharedStr) -> Self {
        Self {
            id,
            triggers: Vec::new(),
            timelines: Vec::new(),
        }
    }

    pub fn id(&self) -> &SharedStr {
        &self.id
    }

    pub fn triggers(&self) -> &[TriggerHandle] {
        &self.triggers
    }

    pub fn timelines(&self) -> &[TimelineHandle] {
        &self.timelines
    }

    /// Unregister every trigger and cancel every timeline of the scope.
    /// No leave callbacks fire.
    pub fn dispose(mut self, registry: &mut TriggerRegistry, engine: &mut AnimationEngine) {
        for handle in self.triggers.drain(..) {
            registry.unregister(handle);
        }
        for handle in self.timelines.drain(..) {
            engine.cancel(handle);
        }
        debug!(scope = %self.id, "Scope disposed");
    }
}

impl Drop for SectionScope {
    fn drop(&mut self) {
        if !self.triggers.is_empty() || !self.timelines.is_empty() {
            warn!(
                scope = %self.id,
                triggers = self.triggers.len(),
                timelines = self.timelines.len(),
                "Scope dropped without dispose"
            );
        }
    }
}

/// What a trigger drives besides the section tracker.
#[derive(Debug, Clone, Copy)]
enum Binding {
    Toggle {
        timeline: TimelineHandle,
        actions: ToggleActions,
    },
    Scrub {
        timeline: TimelineHandle,
    },
}

pub struct Orchestrator {
    config: OrchestratorConfig,
    spec: PageSpec,
    layout: PageLayout,
    scroll: SmoothScroll,
    clock: FrameClock,
    registry: TriggerRegistry,
    engine: AnimationEngine,
    tracker: SectionTracker,
    dock: NavigationDock,
    bindings: HashMap<TriggerHandle, Binding>,
    scopes: Vec<SectionScope>,
    page_scope: Option<SectionScope>,
    loading: Option<LoadingSequence>,
    typewriter: Option<Typewriter>,
    /// Trigger-less entrances waiting for the loading sequence to finish.
    deferred: Vec<TimelineHandle>,
    /// Tilt targets the pointer is currently over.
    hovered: HashSet<SharedStr>,
    phase: PagePhase,
    /// State changes produced outside `frame` (immediate mode).
    pending: Vec<FrameCommand>,
}

impl Orchestrator {
    /// Build the page and mount every section in order.
    pub fn new(
        config: OrchestratorConfig,
        spec: PageSpec,
        viewport: Viewport,
    ) -> Result<Self, OrchestratorError> {
        spec.validate()?;
        let config = config.sanitized();
        let reduced = config.motion == MotionPreference::Reduced;

        let loading = (config.loading.enabled && !reduced)
            .then(|| LoadingSequence::new(&config.loading));
        let phase = if loading.is_some() {
            PagePhase::Loading
        } else {
            PagePhase::Ready
        };
        let typewriter = spec
            .typewriter
            .as_ref()
            .map(|tw| Typewriter::new(tw.target.clone(), &tw.phrases, &config.typewriter));

        let mut orchestrator = Self {
            scroll: SmoothScroll::new(&config.scroll, reduced),
            clock: FrameClock::new(config.frame.max_delta_ms),
            layout: PageLayout::new(viewport),
            registry: TriggerRegistry::new(),
            engine: AnimationEngine::new(),
            tracker: SectionTracker::new(),
            dock: NavigationDock::new(),
            bindings: HashMap::new(),
            scopes: Vec::new(),
            page_scope: None,
            loading,
            typewriter,
            deferred: Vec::new(),
            hovered: HashSet::new(),
            phase,
            pending: Vec::new(),
            config,
            spec,
        };

        let ids: Vec<SharedStr> = orchestrator.spec.sections.iter().map(|s| s.id.clone()).collect();
        for id in ids {
            orchestrator.mount_section(&id)?;
        }
        if orchestrator.spec.progress_bar {
            orchestrator.mount_progress_bar();
        }

        info!(
            sections = orchestrator.scopes.len(),
            triggers = orchestrator.registry.len(),
            timelines = orchestrator.engine.len(),
            phase = ?orchestrator.phase,
            "Page ready to run"
        );
        Ok(orchestrator)
    }

    fn reduced_motion(&self) -> bool {
        self.config.motion == MotionPreference::Reduced
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn spec(&self) -> &PageSpec {
        &self.spec
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn engine(&self) -> &AnimationEngine {
        &self.engine
    }

    pub fn phase(&self) -> PagePhase {
        self.phase
    }

    pub fn scroll_state(&self) -> ScrollState {
        self.scroll.state()
    }

    pub fn scroll_limit(&self) -> f64 {
        self.scroll.limit()
    }

    pub fn active_state(&self) -> &ActiveSectionState {
        self.tracker.state()
    }

    pub fn dock_view(&self) -> DockView {
        self.dock.render(self.tracker.state())
    }

    pub fn is_mounted(&self, id: &str) -> bool {
        self.scopes.iter().any(|s| s.id.as_str() == id)
    }

    pub fn mounted_sections(&self) -> impl Iterator<Item = &SharedStr> {
        self.layout.section_ids()
    }

    pub fn trigger_count(&self) -> usize {
        self.registry.len()
    }

    pub fn timeline_count(&self) -> usize {
        self.engine.len()
    }

    pub fn is_immediate(&self) -> bool {
        self.scroll.is_immediate()
    }

    /// Mount a section of the page: lay it out, track it, and acquire its
    /// entrance and scrubbed timelines.
    pub fn mount_section(&mut self, id: &str) -> Result<(), OrchestratorError> {
        let Some((index, section)) = self
            .spec
            .sections
            .iter()
            .enumerate()
            .find(|(_, s)| s.id.as_str() == id)
            .map(|(i, s)| (i, s.clone()))
        else {
            return Err(OrchestratorError::UnknownSection(id.into()));
        };
        if self.is_mounted(id) {
            return Err(OrchestratorError::AlreadyMounted(section.id));
        }

        let position = self.spec.sections[..index]
            .iter()
            .filter(|s| self.is_mounted(&s.id))
            .count();
        self.layout
            .insert_section(position, section.id.clone(), section.height);
        self.dock
            .insert_item(position, section.id.clone(), section.label.clone());
        self.relayout();

        let mut scope = SectionScope::new(section.id.clone());
        scope.triggers.push(self.tracker.register_section(
            &mut self.registry,
            section.id.clone(),
            &self.config.tracker,
        ));
        if index == self.config.tracker.dock_section {
            scope.triggers.push(self.tracker.register_dock(
                &mut self.registry,
                section.id.clone(),
                self.config.tracker.dock_start,
            ));
        }
        self.acquire_animations(&section, &mut scope);

        debug!(
            section = %section.id,
            triggers = scope.triggers.len(),
            timelines = scope.timelines.len(),
            "Section mounted"
        );
        self.scopes.push(scope);
        self.evaluate_if_immediate();
        Ok(())
    }

    fn acquire_animations(&mut self, section: &SectionSpec, scope: &mut SectionScope) {
        if let Some(entrance) = &section.entrance {
            let timeline = Timeline::builder(TimelineKind::Autoplay)
                .delay(entrance.delay)
                .steps(entrance.steps.iter().map(StepSpec::to_step))
                .build();
            let handle = self.add_scoped(timeline, scope);

            match &entrance.trigger {
                Some(trigger) => {
                    let trigger_handle = self.registry.register(Trigger::element(
                        section.id.clone(),
                        trigger.start,
                        Some(trigger.end),
                    ));
                    self.bindings.insert(
                        trigger_handle,
                        Binding::Toggle {
                            timeline: handle,
                            actions: trigger.toggle_actions,
                        },
                    );
                    scope.triggers.push(trigger_handle);
                }
                None => self.start_autoplay(handle),
            }
        }

        for scrub in &section.scrubbed {
            let timeline = Timeline::builder(TimelineKind::Scrubbed)
                .steps(scrub.steps.iter().map(StepSpec::to_step))
                .build();
            let handle = self.add_scoped(timeline, scope);

            let trigger_handle = self.registry.register(
                Trigger::element(section.id.clone(), scrub.start, Some(scrub.end))
                    .track_progress(),
            );
            self.bindings
                .insert(trigger_handle, Binding::Scrub { timeline: handle });
            scope.triggers.push(trigger_handle);
        }
    }

    /// Add a section timeline. A target shared with an earlier timeline of
    /// the same section cancels that timeline and is logged.
    fn add_scoped(&mut self, timeline: Timeline, scope: &mut SectionScope) -> TimelineHandle {
        for target in timeline.targets() {
            if let Some(owner) = self.engine.owner_of(&target) {
                if scope.timelines.contains(&owner) {
                    warn!(
                        section = %scope.id,
                        target = %target,
                        "Section timelines share a target, cancelling the earlier one"
                    );
                }
            }
        }
        let handle = self.engine.add(timeline);
        scope.timelines.push(handle);
        handle
    }

    fn start_autoplay(&mut self, handle: TimelineHandle) {
        if self.reduced_motion() {
            self.engine.apply_toggle(handle, ToggleAction::Complete);
        } else if self.phase == PagePhase::Loading {
            self.deferred.push(handle);
        } else {
            self.engine.play(handle);
        }
    }

    fn mount_progress_bar(&mut self) {
        let mut scope = SectionScope::new(PROGRESS_BAR_TARGET.into());
        let timeline = Timeline::builder(TimelineKind::Scrubbed)
            .step(
                Step::new(PROGRESS_BAR_TARGET)
                    .from(PropertyValues::new().with(Property::Width, 0.0))
                    .to(PropertyValues::new().with(Property::Width, 100.0))
                    .duration(1.0),
            )
            .build();
        let handle = self.engine.add(timeline);
        let trigger = self.registry.register(Trigger::page().track_progress());
        self.bindings.insert(trigger, Binding::Scrub { timeline: handle });
        scope.timelines.push(handle);
        scope.triggers.push(trigger);
        self.page_scope = Some(scope);
    }

    /// Unmount a section: its triggers are unregistered without firing
    /// leave, its timelines are cancelled, and it is removed from the layout
    /// and the dock.
    pub fn unmount_section(&mut self, id: &str) -> Result<(), OrchestratorError> {
        let Some(index) = self.scopes.iter().position(|s| s.id.as_str() == id) else {
            return Err(OrchestratorError::UnknownSection(id.into()));
        };
        let scope = self.scopes.remove(index);
        for handle in scope.triggers() {
            self.bindings.remove(handle);
            if let Some(command) = self.tracker.untrack(*handle) {
                self.pending.push(command);
            }
        }
        self.deferred.retain(|h| !scope.timelines().contains(h));
        scope.dispose(&mut self.registry, &mut self.engine);
        for tilt in self.spec.tilt.iter().filter(|t| t.section.as_str() == id) {
            self.hovered.remove(&tilt.target);
            if let Some(owner) = self.engine.owner_of(&tilt.target) {
                self.engine.cancel(owner);
            }
        }

        self.layout.remove_section(id);
        self.dock.remove_item(id);
        self.relayout();
        info!(section = id, "Section unmounted");
        self.evaluate_if_immediate();
        Ok(())
    }

    fn relayout(&mut self) {
        self.scroll.set_limit(self.layout.scroll_limit());
        self.registry.invalidate_layout();
    }

    pub fn on_scroll(&mut self, listener: impl FnMut(&ScrollState) + 'static) -> ListenerId {
        self.scroll.on_update(listener)
    }

    pub fn remove_scroll_listener(&mut self, id: ListenerId) -> bool {
        self.scroll.remove_listener(id)
    }

    /// Hosts without a frame callback switch the driver to immediate mode;
    /// offsets are then evaluated as soon as input arrives.
    pub fn set_frames_available(&mut self, available: bool) {
        self.scroll.set_frames_available(available);
        self.evaluate_if_immediate();
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Result<(), OrchestratorError> {
        match event {
            InputEvent::Wheel { delta_y } => {
                self.user_scroll(delta_y * self.config.scroll.wheel_multiplier);
            }
            InputEvent::Touch { delta_y } => {
                self.user_scroll(delta_y * self.config.scroll.touch_multiplier);
            }
            InputEvent::Key(key) => self.key_scroll(key),
            InputEvent::Resize { width, height } => {
                if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
                    return Err(OrchestratorError::InvalidViewport { width, height });
                }
                self.layout.set_viewport(Viewport::new(width, height));
                self.relayout();
                debug!(width, height, "Viewport resized");
            }
            InputEvent::Reflow { section, height } => {
                if !height.is_finite() || height <= 0.0 {
                    return Err(OrchestratorError::InvalidHeight {
                        id: section,
                        height,
                    });
                }
                if !self.layout.set_section_height(&section, height) {
                    return Err(OrchestratorError::UnknownSection(section));
                }
                self.relayout();
                debug!(section = %section, height, "Section reflowed");
            }
            InputEvent::PointerMove { x, y } => self.pointer_move(x, y),
        }
        self.evaluate_if_immediate();
        Ok(())
    }

    fn scroll_locked(&self) -> bool {
        if self.phase == PagePhase::Loading {
            debug!("Ignoring scroll input while loading");
            return true;
        }
        false
    }

    fn user_scroll(&mut self, delta: f64) {
        if self.scroll_locked() {
            return;
        }
        self.scroll.scroll_by(delta);
    }

    fn key_scroll(&mut self, key: ScrollKey) {
        if self.scroll_locked() {
            return;
        }
        let page = self.layout.viewport().height * self.config.scroll.page_fraction;
        let line = self.config.scroll.line_step;
        match key {
            ScrollKey::LineUp => self.scroll.scroll_by(-line),
            ScrollKey::LineDown => self.scroll.scroll_by(line),
            ScrollKey::PageUp => self.scroll.scroll_by(-page),
            ScrollKey::PageDown => self.scroll.scroll_by(page),
            ScrollKey::Home => self.scroll.scroll_to(
                0.0,
                Some(self.config.scroll.scroll_to_duration),
                self.config.scroll.scroll_to_ease,
            ),
            ScrollKey::End => self.scroll.scroll_to(
                self.scroll.limit(),
                Some(self.config.scroll.scroll_to_duration),
                self.config.scroll.scroll_to_ease,
            ),
        };
    }

    fn pointer_move(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            debug!(x, y, "Ignoring pointer move off the page");
            return;
        }
        if self.spec.cursor {
            let at = PropertyValues::new().with(Property::X, x).with(Property::Y, y);
            self.pointer_tween(
                Step::new(CURSOR_RING_TARGET)
                    .to(at.clone())
                    .duration(0.08)
                    .ease(Ease::PowerOut(2)),
            );
            self.pointer_tween(Step::new(CURSOR_DOT_TARGET).to(at).duration(0.02));
        }
        if self.phase == PagePhase::Loading {
            return;
        }
        let tilts = self.spec.tilt.clone();
        for tilt in tilts {
            match self.tilt_angles(&tilt, x, y) {
                Some((rotate_x, rotate_y)) => {
                    self.hovered.insert(tilt.target.clone());
                    self.pointer_tween(
                        Step::new(tilt.target)
                            .to(PropertyValues::new()
                                .with(Property::RotateX, rotate_x)
                                .with(Property::RotateY, rotate_y))
                            .duration(0.3)
                            .ease(Ease::PowerOut(2)),
                    );
                }
                None if self.hovered.remove(&tilt.target) => {
                    self.pointer_tween(
                        Step::new(tilt.target)
                            .to(PropertyValues::new()
                                .with(Property::RotateX, 0.0)
                                .with(Property::RotateY, 0.0))
                            .duration(0.5)
                            .ease(Ease::PowerOut(2)),
                    );
                }
                None => {}
            }
        }
    }

    /// Rotation in degrees when the pointer is over the tilt card's section,
    /// measured from the centre of its on-screen box.
    fn tilt_angles(&self, tilt: &TiltSpec, x: f64, y: f64) -> Option<(f64, f64)> {
        let section = self.layout.element_box(&tilt.section)?;
        let width = self.layout.viewport().width;
        let top = section.top - self.scroll.state().smoothed_offset;
        let local_y = y - top;
        if x < 0.0 || x >= width || local_y < 0.0 || local_y >= section.height {
            return None;
        }
        let rotate_x = (local_y - section.height / 2.0) / tilt.divisor;
        let rotate_y = (width / 2.0 - x) / tilt.divisor;
        let rotate_x = if tilt.invert_x { -rotate_x } else { rotate_x };
        Some((rotate_x, rotate_y))
    }

    /// Replace whatever tween drives the step's targets. Immediate mode
    /// jumps straight to the end.
    fn pointer_tween(&mut self, step: Step) {
        let handle = self.engine.tween_to(step);
        if self.scroll.is_immediate() {
            self.engine.apply_toggle(handle, ToggleAction::Complete);
        }
    }

    /// Scroll to a section through the dock. Returns the target offset.
    pub fn navigate_to(&mut self, id: &str) -> Result<f64, OrchestratorError> {
        if self.phase == PagePhase::Loading {
            return Err(OrchestratorError::NotReady);
        }
        let target = self.dock.activate(
            id,
            &self.layout,
            &mut self.scroll,
            Some(self.config.scroll.scroll_to_duration),
            self.config.scroll.scroll_to_ease,
        )?;
        self.evaluate_if_immediate();
        Ok(target)
    }

    fn evaluate_if_immediate(&mut self) {
        if self.scroll.is_immediate() {
            self.evaluate();
        }
    }

    /// Run the trigger registry against the published offset and route the
    /// events to the tracker and bound timelines.
    fn evaluate(&mut self) {
        let offset = self.scroll.state().smoothed_offset;
        let events = self.registry.update(offset, &self.layout);
        let from = self.pending.len();
        for event in &events {
            self.route(event);
        }
        self.coalesce_section_changes(from);
    }

    /// Keep only the last `SetActiveSection` queued since `from`. A jump
    /// across several sections enters each one on the way through; only
    /// the landing section is reported.
    fn coalesce_section_changes(&mut self, from: usize) {
        let is_change = |c: &FrameCommand| matches!(c, FrameCommand::SetActiveSection { .. });
        let Some(last) = self.pending.iter().rposition(is_change) else {
            return;
        };
        if last < from {
            return;
        }
        let mut index = 0;
        self.pending.retain(|c| {
            let keep = index < from || index == last || !is_change(c);
            index += 1;
            keep
        });
    }

    fn route(&mut self, event: &TriggerEvent) {
        if let Some(command) = self.tracker.apply(event) {
            self.pending.push(command);
        }
        let Some(binding) = self.bindings.get(&event.handle).copied() else {
            return;
        };
        match (binding, event.kind) {
            (_, TriggerEventKind::Detached) => {
                self.bindings.remove(&event.handle);
            }
            (Binding::Toggle { timeline, actions }, kind) => {
                let action = actions.action_for(kind);
                let action = if self.reduced_motion() {
                    action.settled()
                } else {
                    action
                };
                self.engine.apply_toggle(timeline, action);
            }
            (Binding::Scrub { timeline }, TriggerEventKind::Progress(p)) => {
                self.engine.set_progress(timeline, p);
            }
            (Binding::Scrub { .. }, _) => {}
        }
    }

    /// Advance one display frame at host time `timestamp_ms`.
    pub fn frame(&mut self, timestamp_ms: f64) -> FrameOutput {
        let dt = self.clock.delta(timestamp_ms);
        self.scroll.tick(dt);
        self.evaluate();

        let mut commands = std::mem::take(&mut self.pending);
        commands.extend(self.engine.tick(dt));

        if let Some(loading) = self.loading.as_mut() {
            commands.extend(loading.advance(dt));
            if loading.is_done() {
                self.loading = None;
                self.finish_loading();
            }
        }

        if self.phase == PagePhase::Ready {
            if let Some(typewriter) = self.typewriter.as_mut() {
                commands.extend(typewriter.advance(dt));
            }
        }

        FrameOutput {
            phase: self.phase,
            scroll: self.scroll.state(),
            active: self.tracker.state().clone(),
            commands,
        }
    }

    fn finish_loading(&mut self) {
        self.phase = PagePhase::Ready;
        for handle in std::mem::take(&mut self.deferred) {
            self.engine.play(handle);
        }
        info!("Page interactive");
    }

    /// Drain writes produced outside `frame` (for hosts in immediate mode
    /// that never call it).
    pub fn take_commands(&mut self) -> Vec<FrameCommand> {
        let mut commands = std::mem::take(&mut self.pending);
        commands.extend(self.engine.tick(0.0));
        commands
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("phase", &self.phase)
            .field("scroll", &self.scroll)
            .field("sections", &self.scopes.len())
            .field("triggers", &self.registry.len())
            .field("timelines", &self.engine.len())
            .finish()
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        for scope in self.scopes.drain(..).chain(self.page_scope.take()) {
            scope.dispose(&mut self.registry, &mut self.engine);
        }
    }
}
