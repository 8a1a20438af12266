use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::protocol::LoginRequest;
use crate::{BridgeError, Result};

/// Bit set asking the server to send items from other worlds, our own world
/// and our starting inventory.
pub const ITEMS_HANDLING_ALL: u8 = 0b111;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub server_url: String,
    pub player_name: String,
    pub game: String,
    pub password: Option<String>,
    pub connect_poll_attempts: u32,
    pub connect_poll_interval_ms: u64,
    pub ready_poll_attempts: u32,
    pub ready_poll_interval_ms: u64,
    pub items_handling: u8,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://localhost:38281".to_string(),
            player_name: "Player".to_string(),
            game: "Pokeclicker".to_string(),
            password: None,
            connect_poll_attempts: 25,
            connect_poll_interval_ms: 200,
            ready_poll_attempts: 50,
            ready_poll_interval_ms: 200,
            items_handling: ITEMS_HANDLING_ALL,
        }
    }
}

impl BridgeConfig {
    pub fn default_path() -> Option<PathBuf> {
        let mut base = dirs::config_dir().or_else(dirs::data_dir)?;
        base.push("APBridge");
        base.push("bridge_config.json");
        Some(base)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config: BridgeConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Falls back to defaults when there is no config file or it can't be read.
    pub fn load_or_default() -> Self {
        match Self::default_path() {
            Some(path) if path.exists() => match Self::load(&path) {
                Ok(config) => config,
                Err(err) => {
                    log::warn!("ignoring {}: {err}", path.display());
                    Self::default()
                }
            },
            _ => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.server_url.trim().is_empty() {
            return Err(BridgeError::Config("server_url is empty".to_string()));
        }
        if self.player_name.trim().is_empty() {
            return Err(BridgeError::Config("player_name is empty".to_string()));
        }
        Ok(())
    }

    pub fn login_request(&self) -> LoginRequest {
        LoginRequest {
            server_url: self.server_url.clone(),
            game: self.game.clone(),
            player_name: self.player_name.clone(),
            password: self.password.clone().filter(|p| !p.is_empty()),
            items_handling: self.items_handling,
        }
    }
}

/// Hosts that already carry a websocket scheme are used as-is; bare hosts
/// get a secure scheme.
pub fn server_url(host: &str, port: u16) -> String {
    if host.starts_with("ws") {
        format!("{host}:{port}")
    } else {
        format!("wss://{host}:{port}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_secure_scheme() {
        assert_eq!(server_url("archipelago.gg", 38281), "wss://archipelago.gg:38281");
        assert_eq!(server_url("ws://localhost", 38281), "ws://localhost:38281");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge_config.json");
        fs::write(&path, r#"{"player_name": "Blue"}"#).unwrap();
        let config = BridgeConfig::load(&path).unwrap();
        assert_eq!(config.player_name, "Blue");
        assert_eq!(config.connect_poll_attempts, 25);
        assert_eq!(config.items_handling, ITEMS_HANDLING_ALL);
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("bridge_config.json");
        let config = BridgeConfig {
            password: Some("hunter2".to_string()),
            ..BridgeConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(BridgeConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn empty_player_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge_config.json");
        fs::write(&path, r#"{"player_name": " "}"#).unwrap();
        assert!(matches!(BridgeConfig::load(&path), Err(BridgeError::Config(_))));
    }

    #[test]
    fn empty_password_is_not_sent() {
        let config = BridgeConfig {
            password: Some(String::new()),
            ..BridgeConfig::default()
        };
        assert_eq!(config.login_request().password, None);
    }
}
