//! Active-section and dock-visibility tracking.

use std::collections::HashMap;

use scrollreel_protocol::{FrameCommand, SharedStr};
use serde::Serialize;
use tracing::debug;

use crate::config::TrackerConfig;
use crate::trigger::{
    Trigger, TriggerEvent, TriggerEventKind, TriggerHandle, TriggerPoint, TriggerRegistry,
};

/// Which section is current and whether the dock is shown.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSectionState {
    pub current_section: Option<SharedStr>,
    pub dock_visible: bool,
}

#[derive(Debug, Clone)]
enum Tracked {
    Section(SharedStr),
    Dock,
}

/// Maps trigger events on section ranges to [`ActiveSectionState`].
///
/// The current section is whichever section's range was entered last, in
/// either direction. Leaving a range never clears it, so once the offset
/// has passed the first section there is always exactly one current
/// section.
#[derive(Debug, Default)]
pub struct SectionTracker {
    tracked: HashMap<TriggerHandle, Tracked>,
    state: ActiveSectionState,
}

impl SectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ActiveSectionState {
        &self.state
    }

    /// Track `id` with the configured start/end points.
    pub fn register_section(
        &mut self,
        registry: &mut TriggerRegistry,
        id: SharedStr,
        config: &TrackerConfig,
    ) -> TriggerHandle {
        let handle = registry.register(Trigger::element(
            id.clone(),
            config.section_start,
            Some(config.section_end),
        ));
        self.tracked.insert(handle, Tracked::Section(id));
        handle
    }

    /// Show the dock while the offset is at or past the point where
    /// `section_id` reaches `start`.
    pub fn register_dock(
        &mut self,
        registry: &mut TriggerRegistry,
        section_id: SharedStr,
        start: TriggerPoint,
    ) -> TriggerHandle {
        let handle = registry.register(Trigger::element(section_id, start, None));
        self.tracked.insert(handle, Tracked::Dock);
        handle
    }

    /// Stop tracking a trigger. The caller unregisters it. Dropping the
    /// dock trigger hides the dock, and the returned command says so.
    pub fn untrack(&mut self, handle: TriggerHandle) -> Option<FrameCommand> {
        match self.tracked.remove(&handle) {
            Some(Tracked::Section(id)) => {
                if self.state.current_section.as_ref() == Some(&id) {
                    debug!(section = %id, "Current section removed");
                }
                None
            }
            Some(Tracked::Dock) => self.set_dock(false),
            None => None,
        }
    }

    pub fn is_tracked(&self, handle: TriggerHandle) -> bool {
        self.tracked.contains_key(&handle)
    }

    /// Fold one trigger event into the state. Returns the command to emit
    /// when the visible state changed.
    pub fn apply(&mut self, event: &TriggerEvent) -> Option<FrameCommand> {
        let tracked = self.tracked.get(&event.handle)?.clone();
        match (tracked, event.kind) {
            (Tracked::Section(id), TriggerEventKind::Enter(_)) => {
                if self.state.current_section.as_ref() == Some(&id) {
                    return None;
                }
                debug!(section = %id, "Active section changed");
                self.state.current_section = Some(id.clone());
                Some(FrameCommand::SetActiveSection { section: id })
            }
            (Tracked::Section(_), TriggerEventKind::Detached) => {
                self.tracked.remove(&event.handle);
                None
            }
            (Tracked::Dock, TriggerEventKind::Enter(_)) => self.set_dock(true),
            (Tracked::Dock, TriggerEventKind::Leave(_)) => self.set_dock(false),
            (Tracked::Dock, TriggerEventKind::Detached) => {
                self.tracked.remove(&event.handle);
                self.set_dock(false)
            }
            _ => None,
        }
    }

    fn set_dock(&mut self, visible: bool) -> Option<FrameCommand> {
        if self.state.dock_visible == visible {
            return None;
        }
        self.state.dock_visible = visible;
        Some(FrameCommand::SetDockVisible { visible })
    }
}
