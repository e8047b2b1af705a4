//! Error types for the game core.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failure reported by a key-value storage backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage unavailable")]
    Unavailable,

    #[error("storage write rejected for key '{key}': {reason}")]
    WriteRejected { key: String, reason: String },
}

/// Errors surfaced by the game core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    /// A caller passed a value outside an enumerated domain. This is a contract
    /// violation, not a runtime condition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("browser error: {0}")]
    Web(String),
}

impl From<GameError> for JsValue {
    fn from(e: GameError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GameError>;
