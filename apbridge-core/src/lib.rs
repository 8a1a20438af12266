use std::path::PathBuf;
use thiserror::Error;

pub mod automation;
pub mod bridge;
pub mod checks;
pub mod config;
pub mod dispatch;
pub mod flags;
pub mod host;
pub mod items;
pub mod pending;
pub mod prefs;
pub mod protocol;
pub mod session;
pub mod sim;
pub mod transcript;

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use dispatch::{ItemBatch, ItemDispatcher, Outcome};
pub use flags::{FlagChange, FlagStore, FlagValue};
pub use items::{Category, ItemTable, PokemonId, Resolved};
pub use session::{ClientError, ServiceClient, Session};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("item table error: {0}")]
    Table(String),
    #[error("client error: {0}")]
    Client(#[from] ClientError),
    #[error("transcript {}: {message}", path.display())]
    Transcript { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, BridgeError>;
