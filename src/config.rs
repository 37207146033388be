// SPDX-License-Identifier: MPL-2.0

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::usermanager_dbus::{OBJECT_PATH, SERVICE_NAME};

pub const APP_NAME: &str = "cosmic-ext-users";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bus {
    #[default]
    System,
    Session,
}

impl Bus {
    pub async fn connect(&self) -> zbus::Result<zbus::Connection> {
        match self {
            Bus::System => zbus::Connection::system().await,
            Bus::Session => zbus::Connection::session().await,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bus: Bus,
    /// Well-known name of the user manager.
    pub service: String,
    pub path: String,
    /// Group whose members are listed at startup.
    pub users_group: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bus: Bus::default(),
            service: SERVICE_NAME.to_string(),
            path: OBJECT_PATH.to_string(),
            users_group: "users".to_string(),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.toml"))
    }

    /// Reads `path`, or the default location when `None`.
    ///
    /// A missing file at the default location yields the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
