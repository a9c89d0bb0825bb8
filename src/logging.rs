//! 日志模块 - 文件日志（按大小轮转）+ 控制台输出

use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "ftpsync.log";

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// 是否写日志文件
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// 最大日志文件大小（MB）
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u32,
    /// 文件日志级别: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_enabled() -> bool {
    true
}

fn default_max_size_mb() -> u32 {
    5
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_size_mb: default_max_size_mb(),
            level: default_level(),
        }
    }
}

impl LogConfig {
    /// 将配置的日志级别转换为 tracing Level
    pub fn tracing_level(&self) -> tracing::Level {
        level_from_str(&self.level)
    }
}

fn level_from_str(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "error" => tracing::Level::ERROR,
        "warn" => tracing::Level::WARN,
        "debug" => tracing::Level::DEBUG,
        "trace" => tracing::Level::TRACE,
        _ => tracing::Level::INFO,
    }
}

/// 控制台日志级别，跟随 -v 的次数
pub fn console_level(verbose: u8) -> tracing::Level {
    match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

/// 超过大小后轮转为 `.old` 的日志文件
pub struct SizeRotatingWriter {
    file_path: PathBuf,
    max_size: u64,
    written: u64,
    file: File,
}

impl SizeRotatingWriter {
    pub fn new(log_dir: &Path, max_size_mb: u32) -> io::Result<Self> {
        fs::create_dir_all(log_dir)?;
        let file_path = log_dir.join(LOG_FILE_NAME);
        let max_size = u64::from(max_size_mb) * 1024 * 1024;

        let written = fs::metadata(&file_path).map(|m| m.len()).unwrap_or(0);
        if max_size > 0 && written > max_size {
            Self::rotate(&file_path)?;
        }
        let file = Self::open(&file_path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            file_path,
            max_size,
            written,
            file,
        })
    }

    fn open(file_path: &Path) -> io::Result<File> {
        OpenOptions::new().create(true).append(true).open(file_path)
    }

    /// 当前日志改名为 ftpsync.log.old，覆盖旧备份
    fn rotate(file_path: &Path) -> io::Result<()> {
        let backup_path = file_path.with_extension("log.old");
        if backup_path.exists() {
            fs::remove_file(&backup_path)?;
        }
        fs::rename(file_path, &backup_path)
    }
}

impl Write for SizeRotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.max_size > 0 && self.written + buf.len() as u64 > self.max_size {
            self.file.flush()?;
            Self::rotate(&self.file_path)?;
            self.file = Self::open(&self.file_path)?;
            self.written = 0;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// 初始化日志系统
///
/// 返回的 guard 必须活到程序结束，否则文件日志会丢失尾部。
pub fn init(config: &LogConfig, log_dir: &Path, verbose: u8) -> Option<WorkerGuard> {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::new(console_level(verbose).to_string()));

    let file_writer = if config.enabled {
        match SizeRotatingWriter::new(log_dir, config.max_size_mb) {
            Ok(w) => Some(w),
            Err(e) => {
                eprintln!("无法创建日志文件 {:?}: {}", log_dir, e);
                None
            }
        }
    } else {
        None
    };

    let (file_layer, guard) = match file_writer {
        Some(writer) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(writer);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(false)
                .with_filter(file_filter(config.tracing_level()));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // 文件日志关闭时 file_layer 为 None
    let _ = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init();
    guard
}

/// 文件日志过滤：RUST_LOG 优先，未指定时用配置级别，suppaftp 压到 warn
fn file_filter(level: tracing::Level) -> EnvFilter {
    let mut directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    if !directives.is_empty() {
        directives.push(',');
    }
    directives.push_str("suppaftp=warn");

    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .parse_lossy(directives)
}
