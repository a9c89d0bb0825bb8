//! 命令行子命令的实现
//!
//! 这里的函数都是阻塞的，由 main 放到 `spawn_blocking` 里执行。

pub mod check;
pub mod diff;
pub mod ls;

use crate::config::AppConfig;
use crate::core::{ReconciliationResult, TreeReconciler};
use crate::storage::{FtpSession, LocalTree, PathEntry, RemoteTree};
use anyhow::{Context, Result};

pub use check::{test_connection, TestConnectionResult};
pub use diff::{render, report_lines, Direction};
pub use ls::{list_tree, Side};

fn connect(config: &AppConfig) -> Result<FtpSession> {
    if config.remote.host.trim().is_empty() {
        anyhow::bail!("未配置 FTP 主机（--host 或配置文件 remote.host）");
    }
    FtpSession::connect(&config.remote.ftp_options())
        .with_context(|| format!("连接 {} 失败", config.remote.host))
}

fn close(session: FtpSession) {
    if let Err(e) = session.quit() {
        tracing::debug!("QUIT 失败: {}", e);
    }
}

/// 对比本地与远程的 root 子树
pub fn run_diff(config: &AppConfig, root: &PathEntry) -> Result<ReconciliationResult> {
    let mut session = connect(config)?;
    let result = TreeReconciler::new(&config.local_root, &mut session, &config.remote.root)
        .with_filter(config.scan_filter())
        .reconcile(root)
        .context("对比失败");
    close(session);
    result
}

/// 列出一边的 root 子树
pub fn run_ls(config: &AppConfig, side: Side, root: &PathEntry) -> Result<Vec<String>> {
    match side {
        Side::Local => {
            let mut tree = LocalTree::new(&config.local_root).with_filter(config.scan_filter());
            Ok(list_tree(&mut tree, root)?)
        }
        Side::Remote => {
            let mut session = connect(config)?;
            let lines = {
                let mut tree = RemoteTree::new(&mut session, &config.remote.root)
                    .with_filter(config.scan_filter());
                list_tree(&mut tree, root)
            };
            close(session);
            Ok(lines?)
        }
    }
}
