use serde::{Deserialize, Serialize};

use crate::property::Property;
use crate::shared_str::SharedStr;

/// A single, stateless instruction produced by one orchestrator frame.
///
/// Each frame yields a `Vec<FrameCommand>` in a fixed order: section and
/// dock state changes first, then property and text writes. Hosts apply
/// them sequentially; every command carries all the data it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FrameCommand {
    /// Write an animated property on a target element.
    SetProperty {
        target: SharedStr,
        property: Property,
        value: f64,
    },

    /// Replace the text content of a target element (typewriter banner,
    /// loading status line).
    SetText { target: SharedStr, text: SharedStr },

    /// The section considered active changed.
    SetActiveSection { section: SharedStr },

    /// The navigation dock was revealed or hidden.
    SetDockVisible { visible: bool },

    /// The loading sequence finished; the page is interactive from now on.
    LoadingComplete,
}

impl FrameCommand {
    /// Target element of a write, if the command is one.
    pub fn target(&self) -> Option<&SharedStr> {
        match self {
            FrameCommand::SetProperty { target, .. } | FrameCommand::SetText { target, .. } => {
                Some(target)
            }
            _ => None,
        }
    }
}
