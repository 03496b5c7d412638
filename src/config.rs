//! 客户端配置
//!
//! 所有值都有默认值；构建时可以通过环境变量覆盖
//! （浏览器端没有运行时环境变量，只能在编译期注入）。

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =========================================================
// 默认值 (Defaults)
// =========================================================

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_ACCESS_KEY: &str = "access";
pub const DEFAULT_REFRESH_KEY: &str = "refresh";
pub const DEFAULT_SCAN_COOLDOWN_MS: u64 = 1400;
pub const DEFAULT_LOG_LEVEL: &str = "info";

const ENV_API_BASE_URL: Option<&str> = option_env!("UNIEVENT_API_BASE_URL");
const ENV_LOG_LEVEL: Option<&str> = option_env!("UNIEVENT_LOG_LEVEL");

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API base URL must start with http:// or https://, got `{0}`")]
    InvalidBaseUrl(String),
    #[error("unknown log level `{0}`")]
    InvalidLogLevel(String),
    #[error("storage keys must be non-empty and distinct")]
    InvalidStorageKeys,
}

/// 客户端配置结构体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// 后端地址（不带结尾的 `/`）
    pub api_base_url: String,
    /// localStorage 中访问令牌的键
    pub access_key: String,
    /// localStorage 中刷新令牌的键
    pub refresh_key: String,
    /// 扫码去重窗口
    pub scan_cooldown_ms: u64,
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            access_key: DEFAULT_ACCESS_KEY.to_string(),
            refresh_key: DEFAULT_REFRESH_KEY.to_string(),
            scan_cooldown_ms: DEFAULT_SCAN_COOLDOWN_MS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ClientConfig {
    /// 读取编译期注入的覆盖值，读不到就用默认值
    pub fn from_build_env() -> Result<Self, ConfigError> {
        Self::from_overrides(ENV_API_BASE_URL, ENV_LOG_LEVEL)
    }

    pub fn from_overrides(
        api_base_url: Option<&str>,
        log_level: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(url) = api_base_url.map(str::trim).filter(|s| !s.is_empty()) {
            config.api_base_url = url.to_string();
        }
        if let Some(level) = log_level.map(str::trim).filter(|s| !s.is_empty()) {
            config.log_level = level.to_ascii_lowercase();
        }
        config.normalize()
    }

    /// 校验并规范化（去掉 base url 结尾的 `/`）
    pub fn normalize(mut self) -> Result<Self, ConfigError> {
        self.api_base_url = self.api_base_url.trim_end_matches('/').to_string();
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.api_base_url));
        }
        if !matches!(
            self.log_level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(ConfigError::InvalidLogLevel(self.log_level));
        }
        if self.access_key.is_empty()
            || self.refresh_key.is_empty()
            || self.access_key == self.refresh_key
        {
            return Err(ConfigError::InvalidStorageKeys);
        }
        Ok(self)
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.api_base_url, path)
        } else {
            format!("{}/{}", self.api_base_url, path)
        }
    }

    /// 后端返回的媒体路径：绝对地址原样使用，否则补上 `/media` 前缀
    pub fn media_url(&self, path: &str) -> Option<String> {
        let path = path.trim();
        if path.is_empty() {
            return None;
        }
        if path.starts_with("http") {
            return Some(path.to_string());
        }
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        let path = if path.starts_with("/media") {
            path
        } else {
            format!("/media{path}")
        };
        Some(self.url(&path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.access_key, "access");
        assert_eq!(config.refresh_key, "refresh");
        assert_eq!(config.scan_cooldown_ms, 1400);
        assert_eq!(config.url("/api/events/"), "http://localhost:8000/api/events/");
        assert_eq!(config.url("api/events/"), "http://localhost:8000/api/events/");
    }

    #[test]
    fn media_paths() {
        let config = ClientConfig::default();
        assert_eq!(
            config.media_url("events/a.png").as_deref(),
            Some("http://localhost:8000/media/events/a.png")
        );
        assert_eq!(
            config.media_url("/media/events/a.png").as_deref(),
            Some("http://localhost:8000/media/events/a.png")
        );
        assert_eq!(
            config.media_url("https://cdn.usv.ro/a.png").as_deref(),
            Some("https://cdn.usv.ro/a.png")
        );
        assert_eq!(config.media_url(""), None);
    }

    #[test]
    fn overrides_are_normalized() {
        let config = ClientConfig::from_overrides(Some(" https://api.usv.ro/ "), Some("DEBUG")).unwrap();
        assert_eq!(config.api_base_url, "https://api.usv.ro");
        assert_eq!(config.log_level, "debug");

        let config = ClientConfig::from_overrides(Some(""), None).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert_eq!(
            ClientConfig::from_overrides(Some("ftp://x"), None),
            Err(ConfigError::InvalidBaseUrl("ftp://x".into()))
        );
        assert_eq!(
            ClientConfig::from_overrides(None, Some("loud")),
            Err(ConfigError::InvalidLogLevel("loud".into()))
        );

        let config = ClientConfig {
            refresh_key: "access".into(),
            ..Default::default()
        };
        assert_eq!(config.normalize(), Err(ConfigError::InvalidStorageKeys));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"scan_cooldown_ms": 2000}"#).unwrap();
        assert_eq!(config.scan_cooldown_ms, 2000);
        assert_eq!(config.access_key, "access");
    }
}
