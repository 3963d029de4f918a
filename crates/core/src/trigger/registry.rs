use scrollreel_protocol::Boundary;
use tracing::debug;

use super::{Direction, Trigger, TriggerEvent, TriggerEventKind, TriggerHandle};
use crate::arena::Arena;
use crate::layout::Layout;

#[derive(Debug)]
struct Entry {
    trigger: Trigger,
    /// `None` until resolved against the layout.
    boundary: Option<Boundary>,
    inside: bool,
    last_offset: Option<f64>,
}

/// Owned set of scroll triggers, evaluated once per published offset.
///
/// Boundaries are resolved lazily: registering a trigger or invalidating the
/// layout only marks work, and the next [`update`](Self::update) resolves
/// before it compares offsets. A boundary is therefore never older than the
/// update in which the layout changed.
#[derive(Debug, Default)]
pub struct TriggerRegistry {
    entries: Arena<Entry>,
    layout_epoch: u64,
    resolved_epoch: u64,
}

/// Events of one update, bucketed by phase before being flattened.
#[derive(Default)]
struct Phases {
    detached: Vec<TriggerEvent>,
    leaves: Vec<TriggerEvent>,
    passes: Vec<TriggerEvent>,
    enters: Vec<TriggerEvent>,
    progress: Vec<TriggerEvent>,
}

impl Phases {
    fn push(bucket: &mut Vec<TriggerEvent>, handle: TriggerHandle, kind: TriggerEventKind) {
        bucket.push(TriggerEvent { handle, kind });
    }

    fn into_events(self) -> Vec<TriggerEvent> {
        let mut events = self.detached;
        events.extend(self.leaves);
        events.extend(self.passes);
        events.extend(self.enters);
        events.extend(self.progress);
        events
    }
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trigger. It is first evaluated on the next update; if the
    /// offset is already inside its range it fires `Enter(Forward)` then.
    pub fn register(&mut self, trigger: Trigger) -> TriggerHandle {
        TriggerHandle(self.entries.insert(Entry {
            trigger,
            boundary: None,
            inside: false,
            last_offset: None,
        }))
    }

    /// Remove a trigger. No leave is fired even if it is currently entered.
    /// Returns `false` for unknown or already removed handles.
    pub fn unregister(&mut self, handle: TriggerHandle) -> bool {
        self.entries.remove(handle.0).is_some()
    }

    pub fn contains(&self, handle: TriggerHandle) -> bool {
        self.entries.contains(handle.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Boundary as of the last update.
    pub fn boundary(&self, handle: TriggerHandle) -> Option<Boundary> {
        self.entries.get(handle.0).and_then(|e| e.boundary)
    }

    pub fn is_inside(&self, handle: TriggerHandle) -> bool {
        self.entries.get(handle.0).is_some_and(|e| e.inside)
    }

    /// Mark every boundary stale (viewport resize, content reflow).
    pub fn invalidate_layout(&mut self) {
        self.layout_epoch += 1;
    }

    /// Evaluate all triggers against `offset`.
    ///
    /// Events come back in a fixed order: detachments, leaves,
    /// pass-throughs (enter then leave of a range skipped in one step),
    /// enters, then progress. Inside each phase triggers appear in
    /// registration order, so under overlap the last-registered trigger's
    /// enter is the last one reported. Callbacks run in that same order.
    pub fn update(&mut self, offset: f64, layout: &dyn Layout) -> Vec<TriggerEvent> {
        let mut phases = Phases::default();
        let relayout = self.resolved_epoch != self.layout_epoch;

        for key in self.entries.keys() {
            let handle = TriggerHandle(key);
            let Some(entry) = self.entries.get_mut(key) else {
                continue;
            };

            if relayout || entry.boundary.is_none() {
                entry.boundary = entry.trigger.anchor.resolve(layout);
            }
            let Some(boundary) = entry.boundary else {
                debug!(?handle, anchor = ?entry.trigger.anchor, "Dropping trigger with missing element");
                self.entries.remove(key);
                Phases::push(&mut phases.detached, handle, TriggerEventKind::Detached);
                continue;
            };

            let direction = match entry.last_offset {
                Some(last) if offset < last => Direction::Backward,
                _ => Direction::Forward,
            };
            let now_inside = boundary.contains(offset);

            let mut crossed = false;
            match (entry.inside, now_inside) {
                (false, true) => {
                    Phases::push(&mut phases.enters, handle, TriggerEventKind::Enter(direction));
                }
                (true, false) => {
                    Phases::push(&mut phases.leaves, handle, TriggerEventKind::Leave(direction));
                    crossed = true;
                }
                (false, false) => {
                    if let Some(last) = entry.last_offset {
                        let skipped = match direction {
                            Direction::Forward => last < boundary.start && offset >= boundary.end,
                            Direction::Backward => last >= boundary.end && offset < boundary.start,
                        };
                        if skipped {
                            Phases::push(
                                &mut phases.passes,
                                handle,
                                TriggerEventKind::Enter(direction),
                            );
                            Phases::push(
                                &mut phases.passes,
                                handle,
                                TriggerEventKind::Leave(direction),
                            );
                            crossed = true;
                        }
                    }
                }
                (true, true) => {}
            }

            // Progress is reported while inside, plus one final clamped value
            // when the range is left so scrubbed animations settle at an end.
            if entry.trigger.tracks_progress && (now_inside || crossed) {
                Phases::push(
                    &mut phases.progress,
                    handle,
                    TriggerEventKind::Progress(boundary.progress_at(offset)),
                );
            }

            entry.inside = now_inside;
            entry.last_offset = Some(offset);
        }

        self.resolved_epoch = self.layout_epoch;

        let events = phases.into_events();
        self.dispatch(&events);
        events
    }

    fn dispatch(&mut self, events: &[TriggerEvent]) {
        for event in events {
            let Some(entry) = self.entries.get_mut(event.handle.0) else {
                continue;
            };
            let trigger = &mut entry.trigger;
            match event.kind {
                TriggerEventKind::Enter(direction) => {
                    if let Some(f) = trigger.on_enter.as_mut() {
                        f(direction);
                    }
                }
                TriggerEventKind::Leave(direction) => {
                    if let Some(f) = trigger.on_leave.as_mut() {
                        f(direction);
                    }
                }
                TriggerEventKind::Progress(progress) => {
                    if let Some(f) = trigger.on_progress.as_mut() {
                        f(progress);
                    }
                }
                TriggerEventKind::Detached => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::layout::PageLayout;
    use crate::trigger::TriggerPoint;
    use scrollreel_protocol::Viewport;

    fn layout() -> PageLayout {
        let mut layout = PageLayout::new(Viewport::new(1000.0, 500.0));
        layout.upsert_section("a".into(), 100.0);
        layout.upsert_section("b".into(), 150.0);
        layout.upsert_section("c".into(), 1000.0);
        layout
    }

    fn recorder(log: &Rc<RefCell<Vec<String>>>, name: &'static str) -> Trigger {
        let enter = Rc::clone(log);
        let leave = Rc::clone(log);
        Trigger::element(
            name,
            TriggerPoint::new(0.0, 0.0),
            Some(TriggerPoint::new(1.0, 0.0)),
        )
        .on_enter(move |d| enter.borrow_mut().push(format!("{name}.enter:{d:?}")))
        .on_leave(move |d| leave.borrow_mut().push(format!("{name}.leave:{d:?}")))
    }

    #[test]
    fn enter_leave_order_across_shared_edge() {
        let layout = layout();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = TriggerRegistry::new();
        registry.register(recorder(&log, "a"));
        registry.register(recorder(&log, "b"));

        for offset in [0.0, 50.0, 100.0, 150.0] {
            registry.update(offset, &layout);
        }
        assert_eq!(
            *log.borrow(),
            vec!["a.enter:Forward", "a.leave:Forward", "b.enter:Forward"]
        );
    }

    #[test]
    fn scrolling_back_fires_enter_back_and_leave_back() {
        let layout = layout();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = TriggerRegistry::new();
        registry.register(recorder(&log, "b"));

        registry.update(120.0, &layout);
        registry.update(300.0, &layout);
        registry.update(200.0, &layout);
        registry.update(50.0, &layout);
        assert_eq!(
            *log.borrow(),
            vec![
                "b.enter:Forward",
                "b.leave:Forward",
                "b.enter:Backward",
                "b.leave:Backward",
            ]
        );
    }

    #[test]
    fn skipping_over_a_range_passes_through() {
        let layout = layout();
        let mut registry = TriggerRegistry::new();
        let b = registry.register(Trigger::fixed(100.0, 250.0).track_progress());

        registry.update(0.0, &layout);
        let events = registry.update(900.0, &layout);
        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TriggerEventKind::Enter(Direction::Forward),
                TriggerEventKind::Leave(Direction::Forward),
                TriggerEventKind::Progress(1.0),
            ]
        );
        assert!(events.iter().all(|e| e.handle == b));
        assert!(!registry.is_inside(b));
    }

    #[test]
    fn progress_is_reported_while_inside() {
        let layout = layout();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut registry = TriggerRegistry::new();
        registry.register(Trigger::fixed(100.0, 300.0).on_progress(move |p| sink.borrow_mut().push(p)));

        for offset in [0.0, 100.0, 200.0, 250.0] {
            registry.update(offset, &layout);
        }
        assert_eq!(*seen.borrow(), vec![0.0, 0.5, 0.75]);
    }

    #[test]
    fn unregister_while_entered_is_silent() {
        let layout = layout();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = TriggerRegistry::new();
        let b = registry.register(recorder(&log, "b"));

        registry.update(120.0, &layout);
        assert!(registry.is_inside(b));
        assert!(registry.unregister(b));
        assert!(!registry.unregister(b));
        registry.update(400.0, &layout);
        registry.update(120.0, &layout);
        assert_eq!(*log.borrow(), vec!["b.enter:Forward"]);
        assert!(registry.is_empty());
    }

    #[test]
    fn layout_change_is_picked_up_on_next_update() {
        let mut layout = layout();
        let mut registry = TriggerRegistry::new();
        let c = registry.register(Trigger::element(
            "c",
            TriggerPoint::new(0.0, 0.0),
            None,
        ));

        registry.update(200.0, &layout);
        assert!(!registry.is_inside(c));

        layout.set_section_height("a", 10.0);
        registry.invalidate_layout();
        let events = registry.update(200.0, &layout);
        assert_eq!(events[0].kind, TriggerEventKind::Enter(Direction::Forward));
        assert_eq!(registry.boundary(c).unwrap().start, 160.0);
    }

    #[test]
    fn missing_element_is_dropped_not_fatal() {
        let mut layout = layout();
        let mut registry = TriggerRegistry::new();
        let b = registry.register(Trigger::element(
            "b",
            TriggerPoint::new(0.0, 0.0),
            None,
        ));
        layout.remove_section("b");
        registry.invalidate_layout();

        let events = registry.update(0.0, &layout);
        assert_eq!(
            events,
            vec![TriggerEvent {
                handle: b,
                kind: TriggerEventKind::Detached
            }]
        );
        assert!(!registry.contains(b));
    }

    #[test]
    fn already_inside_fires_on_first_update() {
        let layout = layout();
        let mut registry = TriggerRegistry::new();
        registry.update(120.0, &layout);
        let b = registry.register(Trigger::fixed(100.0, 250.0));
        let events = registry.update(120.0, &layout);
        assert_eq!(
            events,
            vec![TriggerEvent {
                handle: b,
                kind: TriggerEventKind::Enter(Direction::Forward)
            }]
        );
    }
}
