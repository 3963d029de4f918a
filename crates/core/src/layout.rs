use scrollreel_protocol::{SharedStr, Viewport};

/// Vertical extent of an element in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementBox {
    pub top: f64,
    pub height: f64,
}

impl ElementBox {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Where elements sit on the page. Triggers resolve their boundaries
/// against this; hosts with a real document implement it over their DOM.
pub trait Layout {
    fn element_box(&self, id: &str) -> Option<ElementBox>;

    fn viewport(&self) -> Viewport;

    fn content_height(&self) -> f64;

    /// Largest reachable scroll offset.
    fn scroll_limit(&self) -> f64 {
        (self.content_height() - self.viewport().height).max(0.0)
    }
}

/// Sections stacked top to bottom in mount order.
#[derive(Debug, Clone)]
pub struct PageLayout {
    viewport: Viewport,
    sections: Vec<(SharedStr, f64)>,
}

impl PageLayout {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            sections: Vec::new(),
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Append a section, or resize it if it is already laid out.
    pub fn upsert_section(&mut self, id: SharedStr, height: f64) {
        match self.sections.iter_mut().find(|(s, _)| *s == id) {
            Some((_, h)) => *h = height,
            None => self.sections.push((id, height)),
        }
    }

    /// Lay out a section at `index` in stacking order (clamped to the end).
    pub fn insert_section(&mut self, index: usize, id: SharedStr, height: f64) {
        if self.set_section_height(&id, height) {
            return;
        }
        let index = index.min(self.sections.len());
        self.sections.insert(index, (id, height));
    }

    /// Returns `false` if the section is not laid out.
    pub fn set_section_height(&mut self, id: &str, height: f64) -> bool {
        match self.sections.iter_mut().find(|(s, _)| s.as_str() == id) {
            Some((_, h)) => {
                *h = height;
                true
            }
            None => false,
        }
    }

    pub fn remove_section(&mut self, id: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|(s, _)| s.as_str() != id);
        self.sections.len() != before
    }

    pub fn section_ids(&self) -> impl Iterator<Item = &SharedStr> {
        self.sections.iter().map(|(id, _)| id)
    }
}

impl Layout for PageLayout {
    fn element_box(&self, id: &str) -> Option<ElementBox> {
        let mut top = 0.0;
        for (section, height) in &self.sections {
            if section.as_str() == id {
                return Some(ElementBox {
                    top,
                    height: *height,
                });
            }
            top += height;
        }
        None
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn content_height(&self) -> f64 {
        self.sections.iter().map(|(_, h)| h).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> PageLayout {
        let mut layout = PageLayout::new(Viewport::new(1280.0, 800.0));
        layout.upsert_section("hero".into(), 800.0);
        layout.upsert_section("about".into(), 1200.0);
        layout.upsert_section("contact".into(), 900.0);
        layout
    }

    #[test]
    fn sections_stack() {
        let layout = layout();
        let about = layout.element_box("about").unwrap();
        assert_eq!(about.top, 800.0);
        assert_eq!(about.bottom(), 2000.0);
        assert_eq!(layout.content_height(), 2900.0);
        assert_eq!(layout.scroll_limit(), 2100.0);
    }

    #[test]
    fn reflow_moves_later_sections() {
        let mut layout = layout();
        assert!(layout.set_section_height("hero", 1000.0));
        assert_eq!(layout.element_box("contact").unwrap().top, 2200.0);
        assert!(layout.remove_section("about"));
        assert_eq!(layout.element_box("contact").unwrap().top, 1000.0);
        assert!(layout.element_box("about").is_none());
    }

    #[test]
    fn insert_keeps_stacking_order() {
        let mut layout = layout();
        layout.remove_section("about");
        layout.insert_section(1, "about".into(), 1200.0);
        let ids: Vec<&str> = layout.section_ids().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["hero", "about", "contact"]);
        assert_eq!(layout.element_box("contact").unwrap().top, 2000.0);
    }

    #[test]
    fn short_page_cannot_scroll() {
        let mut layout = PageLayout::new(Viewport::new(800.0, 1000.0));
        layout.upsert_section("only".into(), 600.0);
        assert_eq!(layout.scroll_limit(), 0.0);
    }
}
