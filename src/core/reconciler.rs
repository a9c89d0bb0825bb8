use crate::error::{Result, SyncError};
use crate::storage::{
    LocalTree, PathEntry, RemoteSession, RemoteTree, ScanFilter, Timestamp, TreeSource,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tracing::{debug, info};

/// 一次对比的六个分类，互不相交
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    pub dirs_added_local: Vec<PathEntry>,
    pub dirs_added_remote: Vec<PathEntry>,
    pub files_added_local: Vec<PathEntry>,
    pub files_added_remote: Vec<PathEntry>,
    pub files_modified_local: Vec<PathEntry>,
    pub files_modified_remote: Vec<PathEntry>,
}

/// 各分类的数量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub dirs_added_local: usize,
    pub dirs_added_remote: usize,
    pub files_added_local: usize,
    pub files_added_remote: usize,
    pub files_modified_local: usize,
    pub files_modified_remote: usize,
}

impl ResultSummary {
    pub fn total(&self) -> usize {
        self.dirs_added_local
            + self.dirs_added_remote
            + self.files_added_local
            + self.files_added_remote
            + self.files_modified_local
            + self.files_modified_remote
    }
}

impl ReconciliationResult {
    pub fn is_empty(&self) -> bool {
        self.summary().total() == 0
    }

    pub fn summary(&self) -> ResultSummary {
        ResultSummary {
            dirs_added_local: self.dirs_added_local.len(),
            dirs_added_remote: self.dirs_added_remote.len(),
            files_added_local: self.files_added_local.len(),
            files_added_remote: self.files_added_remote.len(),
            files_modified_local: self.files_modified_local.len(),
            files_modified_remote: self.files_modified_remote.len(),
        }
    }

    /// 按显示顺序排序（不区分大小写）
    pub fn sort(&mut self) {
        for list in [
            &mut self.dirs_added_local,
            &mut self.dirs_added_remote,
            &mut self.files_added_local,
            &mut self.files_added_remote,
            &mut self.files_modified_local,
            &mut self.files_modified_remote,
        ] {
            list.sort_by(|a, b| a.display_cmp(b));
        }
    }
}

/// 双向差集：(只在本地, 只在远程)，输出顺序不定
pub fn diff(
    local: &HashSet<PathEntry>,
    remote: &HashSet<PathEntry>,
) -> (Vec<PathEntry>, Vec<PathEntry>) {
    let added_local = local.difference(remote).cloned().collect();
    let added_remote = remote.difference(local).cloned().collect();
    (added_local, added_remote)
}

/// 对两边都有的路径比较修改时间
///
/// 本地严格更新进第一个列表，远程严格更新进第二个，相等的不分类。
/// 任何一次取时间失败都会中止。
pub fn classify_modifications<'a, I, L, R>(
    common: I,
    mut local_mtime_of: L,
    mut remote_mtime_of: R,
) -> Result<(Vec<PathEntry>, Vec<PathEntry>)>
where
    I: IntoIterator<Item = &'a PathEntry>,
    L: FnMut(&PathEntry) -> Result<Timestamp>,
    R: FnMut(&PathEntry) -> Result<Timestamp>,
{
    let mut modified_local = Vec::new();
    let mut modified_remote = Vec::new();

    for path in common {
        let local = local_mtime_of(path)?;
        let remote = remote_mtime_of(path)?;

        if local > remote {
            debug!("本地较新: {} ({} > {})", path, local, remote);
            modified_local.push(path.clone());
        } else if remote > local {
            debug!("远程较新: {} ({} > {})", path, remote, local);
            modified_remote.push(path.clone());
        }
    }

    Ok((modified_local, modified_remote))
}

/// 本地树与远程树的对比器
///
/// 持有远程会话的独占借用，一次 `reconcile` 内不会有其它人使用它。
pub struct TreeReconciler<'s, S: RemoteSession + ?Sized> {
    local: LocalTree,
    remote: RemoteTree<'s, S>,
}

impl<'s, S: RemoteSession + ?Sized> TreeReconciler<'s, S> {
    pub fn new(local_base: impl Into<PathBuf>, session: &'s mut S, remote_base: &str) -> Self {
        Self {
            local: LocalTree::new(local_base),
            remote: RemoteTree::new(session, remote_base),
        }
    }

    pub fn with_filter(self, filter: ScanFilter) -> Self {
        Self {
            local: self.local.with_filter(filter.clone()),
            remote: self.remote.with_filter(filter),
        }
    }

    /// 对比 root 子树，每次都重新遍历两边
    pub fn reconcile(&mut self, root: &PathEntry) -> Result<ReconciliationResult> {
        info!(
            "开始对比: {} <-> {}, root: {:?}",
            self.local.name(),
            self.remote.name(),
            root.as_str()
        );

        // 远程先走，连接问题尽早暴露
        let remote = self.remote.walk(root)?;
        let local = self.local.walk(root)?;

        let local_dirs: HashSet<_> = local.directories.into_iter().collect();
        let remote_dirs: HashSet<_> = remote.directories.into_iter().collect();
        let (dirs_added_local, dirs_added_remote) = diff(&local_dirs, &remote_dirs);

        let local_files: HashSet<_> = local.files.into_iter().map(|f| f.path).collect();
        let remote_times: HashMap<PathEntry, Option<Timestamp>> = remote
            .files
            .into_iter()
            .map(|f| (f.path, f.modified_at))
            .collect();
        let remote_files: HashSet<_> = remote_times.keys().cloned().collect();
        let (files_added_local, files_added_remote) = diff(&local_files, &remote_files);

        let mut common: Vec<_> = local_files.intersection(&remote_files).collect();
        common.sort_by(|a, b| a.display_cmp(b));

        let local_tree = &self.local;
        let (files_modified_local, files_modified_remote) = classify_modifications(
            common,
            |path| local_tree.modified_at(root, path),
            |path| {
                remote_times
                    .get(path)
                    .copied()
                    .flatten()
                    .ok_or_else(|| SyncError::MissingTimestamp {
                        path: path.to_string(),
                    })
            },
        )?;

        let mut result = ReconciliationResult {
            dirs_added_local,
            dirs_added_remote,
            files_added_local,
            files_added_remote,
            files_modified_local,
            files_modified_remote,
        };
        result.sort();

        let summary = result.summary();
        info!(
            "对比完成: 目录 +{}/-{}, 文件 +{}/-{}, 修改 本地{}/远程{}",
            summary.dirs_added_local,
            summary.dirs_added_remote,
            summary.files_added_local,
            summary.files_added_remote,
            summary.files_modified_local,
            summary.files_modified_remote
        );
        Ok(result)
    }
}
