//! # Session configuration / 会话配置
//!
//! Plain data mapped from TOML. Every section is optional and falls back to
//! its defaults; range checks live in [`SessionConfig::validate`] and are
//! the caller's responsibility.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::selection::MimeType;

pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;
pub const DEFAULT_MAX_TEXT_BYTES: u64 = 4 * 1024 * 1024;
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 200 * 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub transfer: TransferConfig,
    pub persistence: PersistenceConfig,
    pub dnd: DndConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Bytes copied per read/write step.
    pub chunk_size: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Clipboard persistence
/// 剪贴板持久化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub enabled: bool,
    pub max_text_bytes: u64,
    pub max_image_bytes: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_text_bytes: DEFAULT_MAX_TEXT_BYTES,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DndConfig {
    /// Complete drags released over no surface when the source advertises
    /// one of `desktop_drop_mime_types`.
    pub desktop_drop: bool,
    pub desktop_drop_mime_types: Vec<MimeType>,
}

impl Default for DndConfig {
    fn default() -> Self {
        Self {
            desktop_drop: false,
            desktop_drop_mime_types: vec![MimeType::uri_list()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for `selkit.log`; the platform data dir when unset.
    pub log_dir: Option<PathBuf>,
    pub file_logging: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("transfer.chunk_size must be greater than zero")]
    ZeroChunkSize,
    #[error("dnd.desktop_drop is enabled but dnd.desktop_drop_mime_types is empty")]
    NoDesktopDropMimeTypes,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transfer.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.dnd.desktop_drop && self.dnd.desktop_drop_mime_types.is_empty() {
            return Err(ConfigError::NoDesktopDropMimeTypes);
        }
        Ok(())
    }
}
