use std::collections::{BTreeMap, HashMap};
use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
};
use scrollreel_core::layout::Layout as _;
use scrollreel_core::page::PROGRESS_BAR_TARGET;
use scrollreel_core::{
    FrameOutput, InputEvent, Orchestrator, OrchestratorConfig, PagePhase, PageSpec, ScrollKey,
    loading,
};
use scrollreel_protocol::{FrameCommand, Property, SharedStr, Viewport};
use tracing::{debug, warn};

/// Page pixels per terminal cell.
const COL_PX: f64 = 10.0;
const ROW_PX: f64 = 20.0;
const WHEEL_PX: f64 = 100.0;
const DOCK_WIDTH: u16 = 22;

fn viewport_for(cols: u16, rows: u16) -> Viewport {
    Viewport::new(f64::from(cols) * COL_PX, f64::from(rows) * ROW_PX)
}

/// Element state rebuilt from frame commands.
#[derive(Debug, Default)]
struct Surface {
    properties: HashMap<(SharedStr, Property), f64>,
    texts: HashMap<SharedStr, SharedStr>,
}

impl Surface {
    fn apply(&mut self, commands: &[FrameCommand]) {
        for cmd in commands {
            match cmd {
                FrameCommand::SetProperty {
                    target,
                    property,
                    value,
                } => {
                    self.properties.insert((target.clone(), *property), *value);
                }
                FrameCommand::SetText { target, text } => {
                    self.texts.insert(target.clone(), text.clone());
                }
                FrameCommand::SetActiveSection { .. }
                | FrameCommand::SetDockVisible { .. }
                | FrameCommand::LoadingComplete => {}
            }
        }
    }

    fn value(&self, target: &str, property: Property) -> f64 {
        self.properties
            .get(&(SharedStr::from(target), property))
            .copied()
            .unwrap_or_else(|| property.rest_value())
    }

    fn text(&self, target: &str) -> &str {
        self.texts.get(target).map_or("", SharedStr::as_str)
    }

    /// Targets under `section.`, in name order.
    fn section_targets(&self, section: &str) -> BTreeMap<&str, ()> {
        let prefix = format!("{section}.");
        self.properties
            .keys()
            .map(|(target, _)| target.as_str())
            .chain(self.texts.keys().map(SharedStr::as_str))
            .filter(|t| t.starts_with(&prefix))
            .map(|t| (t, ()))
            .collect()
    }
}

pub fn run_tui(config: OrchestratorConfig, spec: PageSpec) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, config, spec);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    config: OrchestratorConfig,
    spec: PageSpec,
) -> Result<()> {
    let size = terminal.size()?;
    let mut page = Orchestrator::new(config, spec, viewport_for(size.width, size.height))?;
    let mut surface = Surface::default();
    let started = Instant::now();

    loop {
        let out = page.frame(started.elapsed().as_secs_f64() * 1000.0);
        surface.apply(&out.commands);

        terminal.draw(|frame| draw(frame, &page, &out, &surface))?;

        if !event::poll(Duration::from_millis(16))? {
            continue;
        }
        let input = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Up => Some(InputEvent::Key(ScrollKey::LineUp)),
                KeyCode::Down => Some(InputEvent::Key(ScrollKey::LineDown)),
                KeyCode::PageUp => Some(InputEvent::Key(ScrollKey::PageUp)),
                KeyCode::PageDown | KeyCode::Char(' ') => Some(InputEvent::Key(ScrollKey::PageDown)),
                KeyCode::Home => Some(InputEvent::Key(ScrollKey::Home)),
                KeyCode::End => Some(InputEvent::Key(ScrollKey::End)),
                KeyCode::Char(c) if c.is_ascii_digit() => {
                    jump_to_entry(&mut page, c);
                    None
                }
                _ => None,
            },
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollDown => Some(InputEvent::Wheel { delta_y: WHEEL_PX }),
                MouseEventKind::ScrollUp => Some(InputEvent::Wheel { delta_y: -WHEEL_PX }),
                MouseEventKind::Moved => Some(InputEvent::PointerMove {
                    x: f64::from(mouse.column) * COL_PX,
                    y: f64::from(mouse.row) * ROW_PX,
                }),
                _ => None,
            },
            Event::Resize(cols, rows) => {
                let viewport = viewport_for(cols, rows);
                Some(InputEvent::Resize {
                    width: viewport.width,
                    height: viewport.height,
                })
            }
            _ => None,
        };
        if let Some(input) = input {
            if let Err(err) = page.handle_input(input) {
                warn!("Input rejected: {err}");
            }
        }
    }
    Ok(())
}

/// Digits pick dock entries: `1` is the first, `0` the tenth.
fn jump_to_entry(page: &mut Orchestrator, digit: char) {
    let Some(n) = digit.to_digit(10) else {
        return;
    };
    let index = if n == 0 { 9 } else { n as usize - 1 };
    let Some(entry) = page.dock_view().entries.get(index).cloned() else {
        return;
    };
    match page.navigate_to(&entry.id) {
        Ok(target) => debug!(section = %entry.id, target, "Dock jump"),
        Err(err) => debug!("Dock jump ignored: {err}"),
    }
}

fn draw(frame: &mut Frame<'_>, page: &Orchestrator, out: &FrameOutput, surface: &Surface) {
    if out.phase == PagePhase::Loading {
        draw_loading(frame, surface);
        return;
    }

    let [header, progress, body] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(frame.area());

    let section = out.active.current_section.as_deref().unwrap_or("-");
    let title = Paragraph::new(format!(
        " scrollreel | {section} | {:.0}px | ↑↓ scroll | 1-0 jump | q quit ",
        out.scroll.smoothed_offset
    ))
    .style(Style::default().fg(Color::White).bg(Color::DarkGray));
    frame.render_widget(title, header);

    let ratio = (surface.value(PROGRESS_BAR_TARGET, Property::Width) / 100.0).clamp(0.0, 1.0);
    frame.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
            .ratio(ratio)
            .label(""),
        progress,
    );

    let body = if out.active.dock_visible && body.width > DOCK_WIDTH * 2 {
        let [dock, rest] =
            Layout::horizontal([Constraint::Length(DOCK_WIDTH), Constraint::Min(0)]).areas(body);
        draw_dock(frame, page, dock);
        rest
    } else {
        body
    };
    draw_sections(frame, page, out.scroll.smoothed_offset, surface, body);
}

fn draw_loading(frame: &mut Frame<'_>, surface: &Surface) {
    let area = frame.area();
    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(5),
        Constraint::Fill(1),
    ])
    .areas(area);
    let [counter, bar, status] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(middle);

    let opacity = surface.value(loading::CONTAINER, Property::Opacity);
    let fg = if opacity < 0.5 { Color::DarkGray } else { Color::White };
    let count = surface.value(loading::COUNTER, Property::Value);
    frame.render_widget(
        Paragraph::new(format!("{count:>3.0}%"))
            .centered()
            .style(Style::default().fg(fg)),
        counter,
    );
    frame.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL))
            .gauge_style(Style::default().fg(Color::Green))
            .ratio((surface.value(loading::BAR, Property::Width) / 100.0).clamp(0.0, 1.0))
            .label(""),
        bar,
    );
    frame.render_widget(
        Paragraph::new(surface.text(loading::STATUS))
            .centered()
            .style(Style::default().fg(Color::Gray)),
        status,
    );
}

fn draw_dock(frame: &mut Frame<'_>, page: &Orchestrator, area: Rect) {
    let items: Vec<ListItem<'_>> = page
        .dock_view()
        .entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let style = if entry.active {
                Style::default().fg(Color::Black).bg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            };
            ListItem::new(format!("{} {}", (i + 1) % 10, entry.label)).style(style)
        })
        .collect();
    frame.render_widget(
        List::new(items).block(Block::default().borders(Borders::RIGHT).title(" dock ")),
        area,
    );
}

/// Lay each section out at its page position relative to the scroll offset.
fn draw_sections(
    frame: &mut Frame<'_>,
    page: &Orchestrator,
    offset: f64,
    surface: &Surface,
    area: Rect,
) {
    let layout = page.layout();
    let labels: HashMap<&str, &str> = page
        .spec()
        .sections
        .iter()
        .map(|s| (s.id.as_str(), s.label.as_str()))
        .collect();

    for id in layout.section_ids() {
        let Some(element) = layout.element_box(id) else {
            continue;
        };
        let top = ((element.top - offset) / ROW_PX).floor() as i32;
        let bottom = ((element.bottom() - offset) / ROW_PX).floor() as i32;
        let visible_top = top.max(0);
        let visible_bottom = bottom.min(i32::from(area.height));
        if visible_bottom <= visible_top {
            continue;
        }
        let rect = Rect::new(
            area.x,
            area.y + visible_top as u16,
            area.width,
            (visible_bottom - visible_top) as u16,
        );

        let active = page.active_state().current_section.as_ref() == Some(id);
        let border = if active { Color::Green } else { Color::DarkGray };
        let label = labels.get(id.as_str()).copied().unwrap_or(id.as_str());
        let lines: Vec<Line<'_>> = surface
            .section_targets(id)
            .into_keys()
            .map(|target| target_line(surface, id, target))
            .skip((visible_top - top).max(0) as usize)
            .collect();

        let block = Block::default()
            .borders(Borders::TOP)
            .title(format!(" {label} "))
            .border_style(Style::default().fg(border));
        frame.render_widget(Paragraph::new(lines).block(block), rect);
    }
}

fn target_line<'a>(surface: &'a Surface, section: &str, target: &'a str) -> Line<'a> {
    let name = target
        .strip_prefix(section)
        .and_then(|t| t.strip_prefix('.'))
        .unwrap_or(target);
    let opacity = surface.value(target, Property::Opacity);
    let indent = (surface.value(target, Property::X) / COL_PX).round().clamp(-2.0, 20.0);
    let pad = " ".repeat((2.0 + indent).max(0.0) as usize);

    let text = surface.text(target);
    let body = if !text.is_empty() {
        format!("{pad}{name}: {text}")
    } else if let Some(value) = surface.properties.get(&(SharedStr::from(target), Property::Value))
    {
        format!("{pad}{name}: {value:.0}")
    } else {
        format!("{pad}{name}")
    };

    let style = match opacity {
        o if o >= 0.9 => Style::default().fg(Color::White),
        o if o >= 0.4 => Style::default().fg(Color::Gray),
        _ => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM),
    };
    Line::styled(body, style)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_keeps_latest_write() {
        let mut surface = Surface::default();
        surface.apply(&[
            FrameCommand::SetProperty {
                target: "about.title".into(),
                property: Property::Opacity,
                value: 0.0,
            },
            FrameCommand::SetProperty {
                target: "about.title".into(),
                property: Property::Opacity,
                value: 0.7,
            },
            FrameCommand::SetText {
                target: "hero.role.text".into(),
                text: "Data".into(),
            },
        ]);
        assert_eq!(surface.value("about.title", Property::Opacity), 0.7);
        assert_eq!(surface.value("about.title", Property::Scale), 1.0);
        assert_eq!(surface.text("hero.role.text"), "Data");
        assert_eq!(
            surface.section_targets("hero").into_keys().collect::<Vec<_>>(),
            vec!["hero.role.text"]
        );
    }
}
