//! 核心错误类型

use std::path::PathBuf;
use thiserror::Error;

/// 对比过程中的错误，任何一个都会中止整次对比
#[derive(Debug, Error)]
pub enum SyncError {
    /// 远程端无法连接或登录被拒绝
    #[error("无法连接远程端 {target}: {message}")]
    Connection { target: String, message: String },

    /// 本地根目录不存在
    #[error("本地路径不存在: {0}")]
    NotFound(PathBuf),

    /// 远程时间戳不是 YYYYMMDDHHMMSS 格式
    #[error("无法解析远程时间戳 {path}: {value:?}")]
    TimestampParse { path: String, value: String },

    /// 两边都存在的文件缺少远程时间戳
    #[error("远程文件缺少修改时间: {path}")]
    MissingTimestamp { path: String },

    /// 会话中途的远程命令失败
    #[error("远程命令 {op} 失败: {message}")]
    Remote { op: &'static str, message: String },

    /// 目录栈已经回到起点，不能再向上
    #[error("目录导航越过起点: {0}")]
    Navigation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
