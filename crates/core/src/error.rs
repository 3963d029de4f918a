use scrollreel_protocol::{EaseParseError, SharedStr};
use thiserror::Error;

/// Malformed authoring strings (`"-=0.4"`, `"top 80%"`, `"power3.out"`, ...).
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Ease(#[from] EaseParseError),
    #[error("invalid timeline position `{0}`")]
    Position(String),
    #[error("invalid trigger point `{0}`")]
    TriggerPoint(String),
    #[error("invalid toggle actions `{0}`")]
    ToggleActions(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum OrchestratorError {
    #[error("unknown section `{0}`")]
    UnknownSection(SharedStr),
    #[error("section `{0}` is already mounted")]
    AlreadyMounted(SharedStr),
    #[error("section `{0}` appears more than once in the page")]
    DuplicateSection(SharedStr),
    #[error("section `{id}` has invalid height {height}")]
    InvalidHeight { id: SharedStr, height: f64 },
    #[error("invalid viewport {width}x{height}")]
    InvalidViewport { width: f64, height: f64 },
    #[error("tilt on `{target}` has invalid divisor {divisor}")]
    InvalidTilt { target: SharedStr, divisor: f64 },
    #[error("page has no sections")]
    EmptyPage,
    #[error("page is still loading")]
    NotReady,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Page(#[from] OrchestratorError),
}
