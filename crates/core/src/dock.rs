//! Navigation dock: one entry per section, highlighting the active one.

use scrollreel_protocol::{Ease, SharedStr};
use serde::Serialize;
use tracing::debug;

use crate::error::OrchestratorError;
use crate::layout::Layout;
use crate::scroll::SmoothScroll;
use crate::tracker::ActiveSectionState;

#[derive(Debug, Clone, PartialEq)]
pub struct DockItem {
    pub id: SharedStr,
    pub label: SharedStr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DockEntry {
    pub id: SharedStr,
    pub label: SharedStr,
    pub active: bool,
}

/// Render model handed to hosts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DockView {
    pub visible: bool,
    pub entries: Vec<DockEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct NavigationDock {
    items: Vec<DockItem>,
}

impl NavigationDock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[DockItem] {
        &self.items
    }

    pub fn add_item(&mut self, id: SharedStr, label: SharedStr) {
        if self.items.iter().any(|item| item.id == id) {
            return;
        }
        self.items.push(DockItem { id, label });
    }

    /// Insert at `index` in dock order (clamped to the end).
    pub fn insert_item(&mut self, index: usize, id: SharedStr, label: SharedStr) {
        if self.items.iter().any(|item| item.id == id) {
            return;
        }
        let index = index.min(self.items.len());
        self.items.insert(index, DockItem { id, label });
    }

    pub fn remove_item(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id.as_str() != id);
        self.items.len() != before
    }

    pub fn render(&self, state: &ActiveSectionState) -> DockView {
        let active = state.current_section.as_ref();
        DockView {
            visible: state.dock_visible,
            entries: self
                .items
                .iter()
                .map(|item| DockEntry {
                    id: item.id.clone(),
                    label: item.label.clone(),
                    active: active == Some(&item.id),
                })
                .collect(),
        }
    }

    /// Start a programmatic scroll to the top of section `id`.
    ///
    /// Returns the target offset (the section top, clamped to the scroll
    /// limit). The active section itself is only updated once the scroll
    /// crosses the section's trigger.
    pub fn activate(
        &self,
        id: &str,
        layout: &dyn Layout,
        scroll: &mut SmoothScroll,
        duration: Option<f64>,
        ease: Ease,
    ) -> Result<f64, OrchestratorError> {
        if !self.items.iter().any(|item| item.id.as_str() == id) {
            return Err(OrchestratorError::UnknownSection(id.into()));
        }
        let element = layout
            .element_box(id)
            .ok_or_else(|| OrchestratorError::UnknownSection(id.into()))?;
        let target = element.top.clamp(0.0, layout.scroll_limit());
        debug!(section = id, target, "Navigating to section");
        scroll.scroll_to(target, duration, ease);
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrollConfig;
    use crate::layout::PageLayout;
    use scrollreel_protocol::Viewport;

    fn dock() -> NavigationDock {
        let mut dock = NavigationDock::new();
        dock.add_item("hero".into(), "Home".into());
        dock.add_item("about".into(), "About".into());
        dock.add_item("contact".into(), "Contact".into());
        dock
    }

    #[test]
    fn render_marks_active_entry() {
        let state = ActiveSectionState {
            current_section: Some("about".into()),
            dock_visible: true,
        };
        let view = dock().render(&state);
        assert!(view.visible);
        let active: Vec<&str> = view
            .entries
            .iter()
            .filter(|e| e.active)
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(active, vec!["about"]);
    }

    #[test]
    fn activate_targets_section_top_clamped() {
        let mut layout = PageLayout::new(Viewport::new(1280.0, 800.0));
        layout.upsert_section("hero".into(), 1000.0);
        layout.upsert_section("about".into(), 1000.0);
        layout.upsert_section("contact".into(), 500.0);
        let mut scroll = SmoothScroll::new(&ScrollConfig::default(), true);
        scroll.set_limit(layout.scroll_limit());

        let dock = dock();
        let about = dock
            .activate("about", &layout, &mut scroll, None, Ease::Smooth)
            .unwrap();
        assert_eq!(about, 1000.0);
        assert_eq!(scroll.state().smoothed_offset, 1000.0);

        let contact = dock
            .activate("contact", &layout, &mut scroll, Some(1.2), Ease::Smooth)
            .unwrap();
        assert_eq!(contact, 1700.0);

        assert_eq!(
            dock.activate("blog", &layout, &mut scroll, None, Ease::Smooth),
            Err(OrchestratorError::UnknownSection("blog".into()))
        );
    }
}
