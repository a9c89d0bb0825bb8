pub mod filter;
pub mod ftp;
pub mod local;
#[cfg(test)]
pub mod memory;
pub mod remote;

use crate::error::{Result, SyncError};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

pub use filter::ScanFilter;
pub use ftp::{FtpOptions, FtpSession};
pub use local::LocalTree;
pub use remote::{RemoteCursor, RemoteTree};

// ============ 公共常量 ============

/// 远程时间戳格式（MLSD modify 字段）
pub const REMOTE_TIME_FORMAT: &str = "%Y%m%d%H%M%S";
/// 默认连接超时（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// 修改时间，精确到秒
pub type Timestamp = DateTime<Utc>;

/// 规范化的相对路径，作为两边对比的键
///
/// 各段以 `/` 连接，没有首尾斜杠，也没有空段或 `.` 段。
/// 段内的其它字符（包括 `\`）原样保留，属于名称的一部分。
/// 相等判断区分大小写，显示排序不区分大小写。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PathEntry(String);

impl PathEntry {
    /// 解析 `/` 分隔的相对路径
    pub fn new(raw: &str) -> Self {
        Self::from_segments(raw.split('/'))
    }

    /// 由名称段构造，不再拆分段内内容
    pub fn from_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> Self {
        let normalized = segments
            .into_iter()
            .filter(|s| !s.is_empty() && *s != ".")
            .collect::<Vec<_>>()
            .join("/");
        Self(normalized)
    }

    /// 空路径表示起点本身
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// 追加一段名称，名称整体作为一段
    pub fn join(&self, name: &str) -> Self {
        if name.is_empty() || name == "." {
            self.clone()
        } else if self.is_root() {
            Self(name.to_string())
        } else {
            Self(format!("{}/{}", self.0, name))
        }
    }

    /// 拼接另一个相对路径
    pub fn join_path(&self, other: &PathEntry) -> Self {
        other.segments().fold(self.clone(), |path, segment| path.join(segment))
    }

    /// 显示用排序：先不区分大小写，再按原始字节
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        self.0
            .to_lowercase()
            .cmp(&other.0.to_lowercase())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl fmt::Display for PathEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for PathEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// 远程列表中的一行（尚未解析时间）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub is_directory: bool,
    /// 原始 YYYYMMDDHHMMSS 字符串
    pub modified: Option<String>,
}

impl RemoteEntry {
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
            modified: None,
        }
    }

    pub fn file(name: impl Into<String>, modified: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
            modified: Some(modified.into()),
        }
    }
}

/// 一棵树中的文件或目录记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub path: PathEntry,
    pub is_directory: bool,
    /// 只有远程记录带时间，本地在对比时才去 stat
    pub modified_at: Option<Timestamp>,
}

/// 一次遍历的结果
#[derive(Debug, Clone, Default)]
pub struct TreeListing {
    pub directories: Vec<PathEntry>,
    pub files: Vec<FileRecord>,
}

impl TreeListing {
    /// 目录和文件合成一份记录，目录在前
    pub fn into_records(self) -> Vec<FileRecord> {
        let directories = self.directories.into_iter().map(|path| FileRecord {
            path,
            is_directory: true,
            modified_at: None,
        });
        directories.chain(self.files).collect()
    }
}

/// 树的来源：本地文件系统或远程会话
pub trait TreeSource {
    /// 递归遍历 root 下的所有条目，路径相对于 root
    fn walk(&mut self, root: &PathEntry) -> Result<TreeListing>;

    /// 获取来源名称（用于日志）
    fn name(&self) -> &str;

    fn list_directories(&mut self, root: &PathEntry) -> Result<Vec<PathEntry>> {
        Ok(self.walk(root)?.directories)
    }

    fn list_files(&mut self, root: &PathEntry) -> Result<Vec<FileRecord>> {
        Ok(self.walk(root)?.files)
    }
}

/// 有状态的远程列表会话：切换目录 + 列出当前目录
pub trait RemoteSession {
    /// 切换到绝对或相对路径
    fn change_dir(&mut self, path: &str) -> Result<()>;

    /// 列出当前目录的条目
    fn list_current(&mut self) -> Result<Vec<RemoteEntry>>;

    fn name(&self) -> &str;
}

/// 解析远程时间戳，必须恰好是 14 位数字
pub fn parse_remote_timestamp(path: &str, value: &str) -> Result<Timestamp> {
    let invalid = || SyncError::TimestampParse {
        path: path.to_string(),
        value: value.to_string(),
    };

    if value.len() != 14 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    NaiveDateTime::parse_from_str(value, REMOTE_TIME_FORMAT)
        .map(|t| t.and_utc())
        .map_err(|_| invalid())
}
