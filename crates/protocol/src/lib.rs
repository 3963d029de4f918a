pub mod commands;
pub mod ease;
pub mod property;
pub mod shared_str;
pub mod types;

pub use commands::FrameCommand;
pub use ease::{Ease, EaseParseError};
pub use property::{Property, PropertyValues};
pub use shared_str::SharedStr;
pub use types::{Boundary, ScrollState, Viewport};
