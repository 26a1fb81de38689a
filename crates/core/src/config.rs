//! Roster 配置系统
//!
//! 支持 YAML 配置文件和环境变量

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Environment variable overriding `storage.backend`
pub const ENV_STORAGE_BACKEND: &str = "ROSTER_STORAGE_BACKEND";
/// Environment variable overriding `storage.db_path`
pub const ENV_DB_PATH: &str = "ROSTER_DB_PATH";
/// Environment variable overriding `preferences.path`
pub const ENV_PREFS_PATH: &str = "ROSTER_PREFS_PATH";

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Roster 主配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterConfig {
    /// 成员存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 偏好存储配置
    #[serde(default)]
    pub preferences: PreferencesConfig,
}

impl RosterConfig {
    /// Parse a YAML document
    pub fn from_yaml(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(input)?)
    }

    /// Check cross-field constraints the type system cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == StorageBackend::Sqlite
            && self.storage.db_path.as_os_str().is_empty()
        {
            return Err(ConfigError::Invalid(
                "storage.db_path must be set for the sqlite backend".to_string(),
            ));
        }
        if self.preferences.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "preferences.path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// 存储后端类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// 内存存储（进程退出即丢失）
    Memory,
    /// SQLite 文件存储
    #[default]
    Sqlite,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Memory => f.write_str("memory"),
            StorageBackend::Sqlite => f.write_str("sqlite"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "sqlite" => Ok(StorageBackend::Sqlite),
            other => Err(ConfigError::Invalid(format!(
                "unknown storage backend '{other}' (expected 'memory' or 'sqlite')"
            ))),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 存储类型
    #[serde(default)]
    pub backend: StorageBackend,

    /// 数据库路径
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// 写锁等待时间 (毫秒)
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// 是否启用 WAL 模式
    #[serde(default = "default_true")]
    pub wal: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".roster/members.db")
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            db_path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            wal: true,
        }
    }
}

impl StorageConfig {
    pub fn memory() -> Self {
        Self {
            backend: StorageBackend::Memory,
            ..Self::default()
        }
    }

    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            db_path: path.into(),
            ..Self::default()
        }
    }
}

/// 偏好存储配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferencesConfig {
    /// 偏好文件路径
    #[serde(default = "default_prefs_path")]
    pub path: PathBuf,
}

fn default_prefs_path() -> PathBuf {
    PathBuf::from(".roster/preferences.json")
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_prefs_path(),
        }
    }
}

/// Layered config loader: defaults, then YAML file, then environment
#[derive(Debug, Default)]
pub struct RosterConfigLoader {
    config: RosterConfig,
}

impl RosterConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current values with a YAML file; fields the file omits
    /// take their defaults. A missing file is ignored.
    pub fn load_file(&mut self, path: &Path) -> Result<&mut Self, ConfigError> {
        if !path.exists() {
            debug!("Config file {:?} not found, using defaults", path);
            return Ok(self);
        }
        let content = std::fs::read_to_string(path)?;
        self.config = RosterConfig::from_yaml(&content)?;
        debug!("Loaded config from {:?}", path);
        Ok(self)
    }

    /// Apply `ROSTER_*` overrides from the process environment
    pub fn load_env(&mut self) -> Result<&mut Self, ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<&mut Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup(ENV_STORAGE_BACKEND) {
            self.config.storage.backend = backend.parse()?;
        }
        if let Some(path) = lookup(ENV_DB_PATH) {
            self.config.storage.db_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_PREFS_PATH) {
            self.config.preferences.path = PathBuf::from(path);
        }
        Ok(self)
    }

    pub fn config(&self) -> &RosterConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut RosterConfig {
        &mut self.config
    }

    /// Validate and hand out the final config
    pub fn finish(self) -> Result<RosterConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
