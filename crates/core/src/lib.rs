pub mod arena;
pub mod config;
pub mod dock;
pub mod error;
pub mod layout;
pub mod loading;
pub mod orchestrator;
pub mod page;
pub mod scroll;
pub mod timeline;
pub mod tracker;
pub mod trigger;
pub mod typewriter;

pub use config::{OrchestratorConfig, load_config};
pub use error::{ConfigError, OrchestratorError, ParseError};
pub use orchestrator::{FrameOutput, InputEvent, Orchestrator, PagePhase, ScrollKey};
pub use page::PageSpec;
