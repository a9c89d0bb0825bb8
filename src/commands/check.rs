use crate::config::RemoteConfig;
use crate::storage::{FtpSession, RemoteCursor};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct TestConnectionResult {
    pub success: bool,
    pub message: String,
    pub details: Option<String>,
}

impl TestConnectionResult {
    fn failed(message: &str, details: String) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            details: Some(details),
        }
    }
}

/// 测试 FTP 连接：连接、登录、进入远程根目录并列出
pub fn test_connection(remote: &RemoteConfig) -> TestConnectionResult {
    if remote.host.trim().is_empty() {
        return TestConnectionResult {
            success: false,
            message: "FTP 主机不能为空".to_string(),
            details: None,
        };
    }

    let mut session = match FtpSession::connect(&remote.ftp_options()) {
        Ok(s) => s,
        Err(e) => return TestConnectionResult::failed("FTP 连接失败", e.to_string()),
    };

    let listed = RemoteCursor::open(&mut session, &remote.root).and_then(|mut c| c.list());
    let result = match listed {
        Ok(entries) => {
            let dirs = entries.iter().filter(|e| e.is_directory).count();
            TestConnectionResult {
                success: true,
                message: "FTP 连接成功".to_string(),
                details: Some(format!(
                    "{}: {} 个目录, {} 个文件",
                    remote.root,
                    dirs,
                    entries.len() - dirs
                )),
            }
        }
        Err(e) => TestConnectionResult::failed("无法列出远程根目录", e.to_string()),
    };

    if let Err(e) = session.quit() {
        tracing::debug!("QUIT 失败: {}", e);
    }
    result
}
