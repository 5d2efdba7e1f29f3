//! 配置解析模块
//!
//! 文件格式由扩展名决定：TOML (主要) 或 JSON。

use std::fmt;
use std::path::Path;

use contracts::{ContractError, RemoteStorageConfig};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式（大小写不敏感）
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("toml") {
            Some(Self::Toml)
        } else if ext.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else {
            None
        }
    }

    /// 从文件路径推断格式
    ///
    /// # Errors
    /// 没有扩展名或扩展名不受支持
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse(format!(
                "cannot determine config format of '{}'",
                path.display()
            ))
        })?;
        Self::from_extension(ext)
            .ok_or_else(|| ContractError::config_parse(format!("unsupported config format: .{ext}")))
    }

    /// 把 `content` 解析为 `RemoteStorageConfig`，不做语义校验
    pub fn parse(self, content: &str) -> Result<RemoteStorageConfig, ContractError> {
        let parsed = match self {
            Self::Toml => toml::from_str(content)
                .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) }),
            Self::Json => serde_json::from_str(content)
                .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) }),
        };
        parsed.map_err(|e| ContractError::ConfigParse {
            message: format!("{self} parse error: {e}"),
            source: Some(e),
        })
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Toml => f.write_str("TOML"),
            Self::Json => f.write_str("JSON"),
        }
    }
}
