//! # Configuration Discovery / 配置发现
//!
//! Resolution order:
//!
//! 1. an explicit path (must exist and parse)
//! 2. `<config dir>/selkit/config.toml` when present
//! 3. built-in defaults
//!
//! Validation happens when the session is created, not here.

use std::path::{Path, PathBuf};

use anyhow::Context;
use sel_core::SessionConfig;
use sel_infra::load_config;
use tracing::{debug, info};

const APP_DIR: &str = "selkit";
const CONFIG_FILE: &str = "config.toml";

/// Default location of the configuration file, if the platform has a
/// config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

pub fn resolve_config(explicit: Option<&Path>) -> anyhow::Result<SessionConfig> {
    resolve_config_from(explicit, default_config_path().as_deref())
}

fn resolve_config_from(
    explicit: Option<&Path>,
    fallback: Option<&Path>,
) -> anyhow::Result<SessionConfig> {
    if let Some(path) = explicit {
        info!(path = %path.display(), "loading configuration");
        return load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }
    match fallback {
        Some(path) if path.is_file() => {
            info!(path = %path.display(), "loading configuration");
            load_config(path)
        }
        _ => {
            debug!("no configuration file found, using defaults");
            Ok(SessionConfig::default())
        }
    }
}
