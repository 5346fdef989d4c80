//! Server configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/landrop/landropd.toml`
//! - Windows: `%APPDATA%/landrop/landropd.toml`

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use landrop_protocol::size::parse_size;
use landrop_transfer::DEFAULT_CHUNK_SIZE;

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Display name of this server (hostname by default).
    #[serde(default = "default_name")]
    pub name: String,

    /// Address to bind the HTTP server to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory all managed files live under.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,

    /// Chunk threshold for uploads, as a human-readable size ("5MB").
    #[serde(default = "default_chunk_size")]
    pub chunk_size: String,

    /// Maximum upload size; empty or unparseable means unlimited.
    #[serde(default)]
    pub max_upload_size: String,

    /// Age in hours after which orphaned temp files are reaped.
    #[serde(default = "default_temp_max_age_hours")]
    pub temp_max_age_hours: u64,
}

fn default_name() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "landrop".into())
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8736
}

fn default_storage_path() -> String {
    "~/LanDrop".into()
}

fn default_chunk_size() -> String {
    "5MB".into()
}

fn default_temp_max_age_hours() -> u64 {
    24
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: default_name(),
            listen_addr: default_listen_addr(),
            port: default_port(),
            storage_path: default_storage_path(),
            chunk_size: default_chunk_size(),
            max_upload_size: String::new(),
            temp_max_age_hours: default_temp_max_age_hours(),
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Writes the configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Chunk threshold in bytes; falls back to the built-in default
    /// when the configured string does not parse.
    pub fn chunk_size_bytes(&self) -> u64 {
        match parse_size(&self.chunk_size) {
            0 => DEFAULT_CHUNK_SIZE,
            bytes => bytes,
        }
    }

    /// Maximum upload size in bytes; 0 means unlimited.
    pub fn max_upload_bytes(&self) -> u64 {
        parse_size(&self.max_upload_size)
    }

    /// Storage root with `~` expanded.
    pub fn storage_root(&self) -> PathBuf {
        expand_path(&self.storage_path)
    }
}

fn config_path() -> anyhow::Result<PathBuf> {
    let base = if cfg!(windows) {
        std::env::var("APPDATA").map(PathBuf::from)?
    } else {
        expand_path("~/.config")
    };
    Ok(base.join("landrop").join("landropd.toml"))
}

/// Expands a leading `~` to the user's home directory.
fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Ok(home) = std::env::var("HOME")
    {
        return PathBuf::from(home).join(rest);
    }
    PathBuf::from(path)
}
