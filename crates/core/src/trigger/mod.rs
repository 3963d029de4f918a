//! Scroll triggers: offset ranges that fire enter/leave/progress.

pub mod registry;

use std::fmt;
use std::str::FromStr;

use scrollreel_protocol::{Boundary, SharedStr};
use serde::{Deserialize, Serialize};

use crate::arena::ArenaKey;
use crate::error::ParseError;
use crate::layout::Layout;

pub use registry::TriggerRegistry;

/// Handle returned by [`TriggerRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerHandle(pub(crate) ArenaKey);

/// Direction of the scroll movement that caused an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerEventKind {
    /// Offset crossed into the range. `Backward` is an enter-back.
    Enter(Direction),
    /// Offset left the range. `Backward` is a leave-back.
    Leave(Direction),
    /// Progress through the range, clamped to `[0, 1]`.
    Progress(f64),
    /// The trigger's element disappeared from the layout and the trigger
    /// was dropped. No callback fires for this.
    Detached,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerEvent {
    pub handle: TriggerHandle,
    pub kind: TriggerEventKind,
}

/// A point where an element edge meets a viewport line, e.g. `"top 80%"`:
/// the element's top reaches 80% down the viewport.
///
/// Both sides are fractions: `0.0` is the top edge, `1.0` the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TriggerPoint {
    pub element: f64,
    pub viewport: f64,
}

impl TriggerPoint {
    pub fn new(element: f64, viewport: f64) -> Self {
        Self { element, viewport }
    }

    /// Scroll offset at which this point is reached.
    pub fn resolve(&self, element_top: f64, element_height: f64, viewport_height: f64) -> f64 {
        element_top + self.element * element_height - self.viewport * viewport_height
    }
}

fn parse_edge(token: &str) -> Option<f64> {
    match token {
        "top" => Some(0.0),
        "center" => Some(0.5),
        "bottom" => Some(1.0),
        _ => {
            let pct: f64 = token.strip_suffix('%')?.parse().ok()?;
            pct.is_finite().then_some(pct / 100.0)
        }
    }
}

fn format_edge(value: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if value == 0.0 {
        f.write_str("top")
    } else if value == 0.5 {
        f.write_str("center")
    } else if value == 1.0 {
        f.write_str("bottom")
    } else {
        write!(f, "{}%", value * 100.0)
    }
}

impl FromStr for TriggerPoint {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(element), Some(viewport), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ParseError::TriggerPoint(s.to_string()));
        };
        match (parse_edge(element), parse_edge(viewport)) {
            (Some(element), Some(viewport)) => Ok(Self { element, viewport }),
            _ => Err(ParseError::TriggerPoint(s.to_string())),
        }
    }
}

impl TryFrom<String> for TriggerPoint {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TriggerPoint> for String {
    fn from(point: TriggerPoint) -> Self {
        point.to_string()
    }
}

impl fmt::Display for TriggerPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_edge(self.element, f)?;
        f.write_str(" ")?;
        format_edge(self.viewport, f)
    }
}

/// What a trigger's range is measured against.
#[derive(Debug, Clone, PartialEq)]
pub enum Anchor {
    /// A fixed offset range, independent of layout.
    Fixed(Boundary),
    /// An element's edges against viewport lines. A missing `end` leaves
    /// the range open toward the bottom of the page.
    Element {
        element: SharedStr,
        start: TriggerPoint,
        end: Option<TriggerPoint>,
    },
    /// The whole scroll range, `[0, scroll limit]`.
    Page,
}

impl Anchor {
    /// Current boundary, or `None` when the anchored element is gone.
    pub fn resolve(&self, layout: &dyn Layout) -> Option<Boundary> {
        match self {
            Anchor::Fixed(boundary) => Some(*boundary),
            Anchor::Element {
                element,
                start,
                end,
            } => {
                let el = layout.element_box(element)?;
                let vh = layout.viewport().height;
                let start = start.resolve(el.top, el.height, vh);
                let end = end.map_or(f64::INFINITY, |end| end.resolve(el.top, el.height, vh));
                Some(Boundary::new(start, end))
            }
            Anchor::Page => Some(Boundary::new(0.0, layout.scroll_limit())),
        }
    }
}

type DirectionCallback = Box<dyn FnMut(Direction)>;
type ProgressCallback = Box<dyn FnMut(f64)>;

/// A registered rule mapping a scroll range to callbacks.
///
/// Callbacks are optional: the registry also reports every transition as a
/// [`TriggerEvent`], which is how the orchestrator consumes them.
pub struct Trigger {
    pub(crate) anchor: Anchor,
    pub(crate) on_enter: Option<DirectionCallback>,
    pub(crate) on_leave: Option<DirectionCallback>,
    pub(crate) on_progress: Option<ProgressCallback>,
    pub(crate) tracks_progress: bool,
}

impl Trigger {
    pub fn new(anchor: Anchor) -> Self {
        Self {
            anchor,
            on_enter: None,
            on_leave: None,
            on_progress: None,
            tracks_progress: false,
        }
    }

    pub fn fixed(start: f64, end: f64) -> Self {
        Self::new(Anchor::Fixed(Boundary::new(start, end)))
    }

    pub fn element(
        element: impl Into<SharedStr>,
        start: TriggerPoint,
        end: Option<TriggerPoint>,
    ) -> Self {
        Self::new(Anchor::Element {
            element: element.into(),
            start,
            end,
        })
    }

    pub fn page() -> Self {
        Self::new(Anchor::Page)
    }

    pub fn on_enter(mut self, f: impl FnMut(Direction) + 'static) -> Self {
        self.on_enter = Some(Box::new(f));
        self
    }

    pub fn on_leave(mut self, f: impl FnMut(Direction) + 'static) -> Self {
        self.on_leave = Some(Box::new(f));
        self
    }

    pub fn on_progress(mut self, f: impl FnMut(f64) + 'static) -> Self {
        self.on_progress = Some(Box::new(f));
        self.tracks_progress = true;
        self
    }

    /// Report progress events without installing a callback.
    pub fn track_progress(mut self) -> Self {
        self.tracks_progress = true;
        self
    }

    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("anchor", &self.anchor)
            .field("on_enter", &self.on_enter.is_some())
            .field("on_leave", &self.on_leave.is_some())
            .field("tracks_progress", &self.tracks_progress)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PageLayout;
    use scrollreel_protocol::Viewport;

    #[test]
    fn parses_trigger_points() {
        assert_eq!(
            "top 80%".parse::<TriggerPoint>(),
            Ok(TriggerPoint::new(0.0, 0.8))
        );
        assert_eq!(
            "bottom center".parse::<TriggerPoint>(),
            Ok(TriggerPoint::new(1.0, 0.5))
        );
        assert!("top".parse::<TriggerPoint>().is_err());
        assert!("middle 10%".parse::<TriggerPoint>().is_err());
        assert!("top 10% extra".parse::<TriggerPoint>().is_err());
    }

    #[test]
    fn display_round_trips_keywords() {
        assert_eq!(TriggerPoint::new(0.0, 0.5).to_string(), "top center");
        assert_eq!(TriggerPoint::new(1.0, 0.0).to_string(), "bottom top");
    }

    #[test]
    fn element_anchor_resolves_against_viewport() {
        let mut layout = PageLayout::new(Viewport::new(1000.0, 800.0));
        layout.upsert_section("hero".into(), 800.0);
        layout.upsert_section("about".into(), 1000.0);

        let anchor = Anchor::Element {
            element: "about".into(),
            start: TriggerPoint::new(0.0, 0.8),
            end: Some(TriggerPoint::new(0.5, 0.5)),
        };
        let boundary = anchor.resolve(&layout).unwrap();
        assert!((boundary.start - 160.0).abs() < 1e-9);
        assert!((boundary.end - 900.0).abs() < 1e-9);

        let open = Anchor::Element {
            element: "about".into(),
            start: TriggerPoint::new(0.0, 0.0),
            end: None,
        };
        assert_eq!(open.resolve(&layout).unwrap().end, f64::INFINITY);

        let missing = Anchor::Element {
            element: "blog".into(),
            start: TriggerPoint::new(0.0, 0.0),
            end: None,
        };
        assert!(missing.resolve(&layout).is_none());
    }
}
