use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use utility_mcp::protocol::ServerInfo;

/// Server identity handed to clients at initialize time. Loaded once at
/// startup from an optional TOML file; defaults match the stock
/// utility-server deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default = "default_instructions")]
    pub instructions: String,
}

fn default_name() -> String {
    "utility-server".to_string()
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_instructions() -> String {
    "A general-purpose utility server providing time lookup and timestamp \
     conversion tools."
        .to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            version: default_version(),
            instructions: default_instructions(),
        }
    }
}

impl ServerConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            toml::from_str(&content).context("Failed to parse configuration file")
        } else {
            tracing::info!("Configuration file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn server_info(&self) -> ServerInfo {
        ServerInfo {
            name: self.name.clone(),
            version: self.version.clone(),
        }
    }

    pub fn instructions(&self) -> Option<String> {
        if self.instructions.is_empty() {
            None
        } else {
            Some(self.instructions.clone())
        }
    }
}
