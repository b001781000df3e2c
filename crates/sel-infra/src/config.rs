//! # Configuration Loader / 配置加载器
//!
//! Pure data loading: read the file, parse TOML, map it onto
//! [`SessionConfig`]. Missing sections take their defaults; range checks are
//! left to [`SessionConfig::validate`].

use std::path::Path;

use anyhow::Context;
use sel_core::SessionConfig;

/// Load configuration from a TOML file
/// 从 TOML 文件加载配置
///
/// # Errors / 错误
///
/// - the file cannot be read
/// - the content is not valid TOML, or does not match the config shape
pub fn load_config(config_path: &Path) -> anyhow::Result<SessionConfig> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
}
