use super::{RemoteEntry, RemoteSession, CONNECT_TIMEOUT_SECS};
use crate::error::{Result, SyncError};
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;
use suppaftp::FtpStream;

/// FTP 连接参数
#[derive(Debug, Clone)]
pub struct FtpOptions {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub connect_timeout: Duration,
}

impl Default for FtpOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 21,
            username: "anonymous".to_string(),
            password: String::new(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
        }
    }
}

/// 基于 MLSD 的 FTP 列表会话
pub struct FtpSession {
    stream: FtpStream,
    name: String,
}

impl FtpSession {
    /// 连接并登录，失败时返回 Connection 错误
    pub fn connect(options: &FtpOptions) -> Result<Self> {
        let target = format!("{}:{}", options.host, options.port);
        let connection_error = |message: String| SyncError::Connection {
            target: target.clone(),
            message,
        };

        let addr: SocketAddr = target
            .to_socket_addrs()
            .map_err(|e| connection_error(e.to_string()))?
            .next()
            .ok_or_else(|| connection_error("无法解析地址".to_string()))?;

        tracing::info!("连接 FTP: {} ({})", target, addr);
        let mut stream = FtpStream::connect_timeout(addr, options.connect_timeout)
            .map_err(|e| connection_error(e.to_string()))?;

        stream
            .login(&options.username, &options.password)
            .map_err(|e| connection_error(format!("登录失败: {}", e)))?;
        tracing::debug!("已登录: {}", options.username);

        Ok(Self {
            stream,
            name: format!("ftp://{}", target),
        })
    }

    /// 退出会话
    pub fn quit(mut self) -> Result<()> {
        self.stream.quit().map_err(|e| SyncError::Remote {
            op: "QUIT",
            message: e.to_string(),
        })
    }
}

impl RemoteSession for FtpSession {
    fn change_dir(&mut self, path: &str) -> Result<()> {
        tracing::trace!("CWD {}", path);
        self.stream.cwd(path).map_err(|e| SyncError::Remote {
            op: "CWD",
            message: format!("{}: {}", path, e),
        })
    }

    fn list_current(&mut self) -> Result<Vec<RemoteEntry>> {
        let lines = self.stream.mlsd(None).map_err(|e| SyncError::Remote {
            op: "MLSD",
            message: e.to_string(),
        })?;
        Ok(lines.iter().filter_map(|line| parse_mlsd_line(line)).collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 解析一行 MLSD 输出：`fact=value;fact=value; name`
///
/// 只保留 `type=dir` 和 `type=file`，`cdir`/`pdir` 等其它类型返回 None。
pub fn parse_mlsd_line(line: &str) -> Option<RemoteEntry> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (facts, name) = line.split_once(' ')?;
    if name.is_empty() {
        return None;
    }

    let mut kind = None;
    let mut modified = None;
    for fact in facts.split(';').filter(|f| !f.is_empty()) {
        let Some((key, value)) = fact.split_once('=') else {
            continue;
        };
        match key.to_ascii_lowercase().as_str() {
            "type" => kind = Some(value.to_ascii_lowercase()),
            "modify" => modified = Some(value.to_string()),
            _ => {}
        }
    }

    match kind.as_deref() {
        Some("dir") => Some(RemoteEntry::directory(name)),
        Some("file") => Some(RemoteEntry {
            name: name.to_string(),
            is_directory: false,
            modified,
        }),
        _ => None,
    }
}
