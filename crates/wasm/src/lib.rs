use std::cell::RefCell;

use scrollreel_core::{InputEvent, Orchestrator, OrchestratorConfig, PageSpec, ScrollKey};
use scrollreel_protocol::Viewport;
use serde::Serialize;
use wasm_bindgen::prelude::*;

thread_local! {
    static PAGES: RefCell<Vec<Option<Orchestrator>>> = const { RefCell::new(Vec::new()) };
}

fn with_page<R>(
    handle: usize,
    f: impl FnOnce(&mut Orchestrator) -> Result<R, JsError>,
) -> Result<R, JsError> {
    PAGES.with_borrow_mut(|pages| {
        let page = pages
            .get_mut(handle)
            .and_then(Option::as_mut)
            .ok_or_else(|| JsError::new("invalid page handle"))?;
        f(page)
    })
}

fn to_json(value: &impl Serialize) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&e.to_string()))
}

/// Create a page. `config_toml` may be empty for defaults; an empty
/// `page_json` mounts the built-in portfolio. Returns a handle.
#[wasm_bindgen]
pub fn create_page(
    config_toml: &str,
    page_json: &str,
    width: f64,
    height: f64,
) -> Result<usize, JsError> {
    let config = if config_toml.trim().is_empty() {
        OrchestratorConfig::default()
    } else {
        OrchestratorConfig::from_toml_str(config_toml).map_err(|e| JsError::new(&e.to_string()))?
    };
    let spec = if page_json.trim().is_empty() {
        PageSpec::portfolio()
    } else {
        PageSpec::from_json(page_json).map_err(|e| JsError::new(&e.to_string()))?
    };
    let page = Orchestrator::new(config, spec, Viewport::new(width, height))
        .map_err(|e| JsError::new(&e.to_string()))?;

    Ok(PAGES.with_borrow_mut(|pages| {
        pages.push(Some(page));
        pages.len() - 1
    }))
}

/// Tear a page down, releasing all its triggers and timelines.
#[wasm_bindgen]
pub fn destroy_page(handle: usize) -> bool {
    PAGES.with_borrow_mut(|pages| {
        pages
            .get_mut(handle)
            .and_then(Option::take)
            .is_some()
    })
}

/// Advance one display frame; returns the `FrameOutput` as JSON.
#[wasm_bindgen]
pub fn frame(handle: usize, timestamp_ms: f64) -> Result<String, JsError> {
    with_page(handle, |page| to_json(&page.frame(timestamp_ms)))
}

/// Drain commands produced outside `frame` as JSON.
#[wasm_bindgen]
pub fn take_commands(handle: usize) -> Result<String, JsError> {
    with_page(handle, |page| to_json(&page.take_commands()))
}

#[wasm_bindgen]
pub fn wheel(handle: usize, delta_y: f64) -> Result<(), JsError> {
    send(handle, InputEvent::Wheel { delta_y })
}

#[wasm_bindgen]
pub fn touch(handle: usize, delta_y: f64) -> Result<(), JsError> {
    send(handle, InputEvent::Touch { delta_y })
}

/// Feed a DOM key name. Returns whether the key scrolls the page.
#[wasm_bindgen]
pub fn key(handle: usize, name: &str) -> Result<bool, JsError> {
    let Some(key) = ScrollKey::from_key_name(name) else {
        return Ok(false);
    };
    send(handle, InputEvent::Key(key))?;
    Ok(true)
}

#[wasm_bindgen]
pub fn resize(handle: usize, width: f64, height: f64) -> Result<(), JsError> {
    send(handle, InputEvent::Resize { width, height })
}

#[wasm_bindgen]
pub fn reflow(handle: usize, section: &str, height: f64) -> Result<(), JsError> {
    send(
        handle,
        InputEvent::Reflow {
            section: section.into(),
            height,
        },
    )
}

/// Pointer position in viewport pixels; drives the cursor and card tilt.
#[wasm_bindgen]
pub fn pointer_move(handle: usize, x: f64, y: f64) -> Result<(), JsError> {
    send(handle, InputEvent::PointerMove { x, y })
}

fn send(handle: usize, event: InputEvent) -> Result<(), JsError> {
    with_page(handle, |page| {
        page.handle_input(event)
            .map_err(|e| JsError::new(&e.to_string()))
    })
}

/// Switch to immediate mode when the host has no frame callback.
#[wasm_bindgen]
pub fn set_frames_available(handle: usize, available: bool) -> Result<(), JsError> {
    with_page(handle, |page| {
        page.set_frames_available(available);
        Ok(())
    })
}

/// Scroll to a section through the dock. Returns the target offset.
#[wasm_bindgen]
pub fn navigate_to(handle: usize, section: &str) -> Result<f64, JsError> {
    with_page(handle, |page| {
        page.navigate_to(section)
            .map_err(|e| JsError::new(&e.to_string()))
    })
}

#[wasm_bindgen]
pub fn mount_section(handle: usize, section: &str) -> Result<(), JsError> {
    with_page(handle, |page| {
        page.mount_section(section)
            .map_err(|e| JsError::new(&e.to_string()))
    })
}

#[wasm_bindgen]
pub fn unmount_section(handle: usize, section: &str) -> Result<(), JsError> {
    with_page(handle, |page| {
        page.unmount_section(section)
            .map_err(|e| JsError::new(&e.to_string()))
    })
}

#[wasm_bindgen]
pub fn dock_view(handle: usize) -> Result<String, JsError> {
    with_page(handle, |page| to_json(&page.dock_view()))
}

#[wasm_bindgen]
pub fn active_state(handle: usize) -> Result<String, JsError> {
    with_page(handle, |page| to_json(page.active_state()))
}
