//! 内存中的远程会话，测试用

use super::{RemoteEntry, RemoteSession};
use crate::error::{Result, SyncError};
use std::collections::{BTreeMap, BTreeSet};

pub struct MemorySession {
    dirs: BTreeMap<String, Vec<RemoteEntry>>,
    cwd: String,
    offline: bool,
    /// 在这些目录里 MLSD 会失败
    failing: BTreeSet<String>,
}

impl MemorySession {
    pub fn new() -> Self {
        let mut dirs = BTreeMap::new();
        dirs.insert("/".to_string(), Vec::new());
        Self {
            dirs,
            cwd: "/".to_string(),
            offline: false,
            failing: BTreeSet::new(),
        }
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// 让某个目录的列表请求失败，CWD 仍然成功
    pub fn fail_listing_in(&mut self, dir: &str) {
        let dir = self.resolve(dir);
        self.failing.insert(dir);
    }

    /// 创建目录（包括所有父目录）
    pub fn add_dir(&mut self, path: &str) {
        let mut current = String::from("/");
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let child = join(&current, segment);
            if !self.dirs.contains_key(&child) {
                self.insert_entry(&current, RemoteEntry::directory(segment));
                self.dirs.insert(child.clone(), Vec::new());
            }
            current = child;
        }
    }

    pub fn add_file(&mut self, path: &str, modified: &str) {
        let (parent, name) = path.rsplit_once('/').unwrap_or(("", path));
        let parent = if parent.is_empty() { "/" } else { parent };
        self.add_dir(parent);
        self.insert_entry(parent, RemoteEntry::file(name, modified));
    }

    pub fn insert_entry(&mut self, dir: &str, entry: RemoteEntry) {
        self.dirs.entry(dir.to_string()).or_default().push(entry);
    }

    fn resolve(&self, path: &str) -> String {
        let start = if path.starts_with('/') { "/" } else { self.cwd.as_str() };
        let mut segments: Vec<&str> = start.split('/').filter(|s| !s.is_empty()).collect();
        for segment in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
            if segment == ".." {
                segments.pop();
            } else {
                segments.push(segment);
            }
        }
        format!("/{}", segments.join("/"))
    }

    fn check_online(&self) -> Result<()> {
        if self.offline {
            return Err(SyncError::Connection {
                target: "memory".to_string(),
                message: "offline".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

fn join(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

impl RemoteSession for MemorySession {
    fn change_dir(&mut self, path: &str) -> Result<()> {
        self.check_online()?;
        let target = self.resolve(path);
        if !self.dirs.contains_key(&target) {
            return Err(SyncError::Remote {
                op: "CWD",
                message: format!("550 {}: no such directory", target),
            });
        }
        self.cwd = target;
        Ok(())
    }

    fn list_current(&mut self) -> Result<Vec<RemoteEntry>> {
        self.check_online()?;
        if self.failing.contains(&self.cwd) {
            return Err(SyncError::Remote {
                op: "MLSD",
                message: format!("451 {}: transfer aborted", self.cwd),
            });
        }
        Ok(self.dirs.get(&self.cwd).cloned().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
