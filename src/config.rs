//! 应用配置模块

use crate::logging::LogConfig;
use crate::storage::filter::default_exclude_patterns;
use crate::storage::{FtpOptions, ScanFilter, CONNECT_TIMEOUT_SECS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 远程 FTP 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// 远程根目录
    #[serde(default = "default_root")]
    pub root: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_port() -> u16 {
    21
}

fn default_username() -> String {
    "anonymous".to_string()
}

fn default_root() -> String {
    "/".to_string()
}

fn default_connect_timeout() -> u64 {
    CONNECT_TIMEOUT_SECS
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            username: default_username(),
            password: String::new(),
            root: default_root(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl RemoteConfig {
    pub fn ftp_options(&self) -> FtpOptions {
        FtpOptions {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }
}

/// 配置文件 config.json 的全部内容
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub remote: RemoteConfig,
    /// 本地根目录
    #[serde(default = "default_local_root")]
    pub local_root: PathBuf,
    /// 排除规则（glob），两边共用
    #[serde(default = "default_exclude_patterns")]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_local_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            local_root: default_local_root(),
            exclude: default_exclude_patterns(),
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从配置文件加载；文件不存在时使用默认值，格式错误时报错
    pub fn load(config_file: &Path) -> Result<Self> {
        if !config_file.exists() {
            tracing::debug!("配置文件不存在，使用默认配置: {:?}", config_file);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_file)
            .with_context(|| format!("读取配置文件失败: {}", config_file.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("配置文件格式错误: {}", config_file.display()))
    }

    /// 保存配置（格式化输出）
    pub fn save(&self, config_file: &Path) -> Result<()> {
        if let Some(parent) = config_file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(config_file, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("写入配置文件失败: {}", config_file.display()))
    }

    pub fn scan_filter(&self) -> ScanFilter {
        ScanFilter::new(self.exclude.clone())
    }
}

/// 默认配置目录 `<系统配置目录>/ftpsync`
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|p| p.join("ftpsync"))
        .unwrap_or_else(|| PathBuf::from(".ftpsync"))
}

pub fn default_config_file() -> PathBuf {
    default_config_dir().join("config.json")
}

mod dirs {
    use std::path::PathBuf;

    pub fn config_dir() -> Option<PathBuf> {
        if cfg!(target_os = "windows") {
            std::env::var("APPDATA").ok().map(PathBuf::from)
        } else if cfg!(target_os = "macos") {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library").join("Application Support"))
        } else {
            std::env::var("XDG_CONFIG_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
        }
    }
}
