//! 远程树遍历
//!
//! 会话只有一个"当前目录"，所以导航用显式的目录栈表示：
//! 每次 descend/ascend 都切换到由栈算出的绝对路径，
//! 兄弟目录的遍历不会落在错误的目录里。

use super::{
    parse_remote_timestamp, FileRecord, PathEntry, RemoteSession, ScanFilter, TreeListing,
    TreeSource,
};
use crate::error::{Result, SyncError};

/// 会话上的目录栈
pub struct RemoteCursor<'s, S: RemoteSession + ?Sized> {
    session: &'s mut S,
    base: String,
    stack: Vec<String>,
}

impl<'s, S: RemoteSession + ?Sized> RemoteCursor<'s, S> {
    /// 切换到 base 并以它为栈底
    pub fn open(session: &'s mut S, base: &str) -> Result<Self> {
        let base = normalize_base(base);
        session.change_dir(&base)?;
        Ok(Self {
            session,
            base,
            stack: Vec::new(),
        })
    }

    pub fn current_path(&self) -> String {
        self.stack.iter().fold(self.base.clone(), |mut path, segment| {
            if !path.ends_with('/') {
                path.push('/');
            }
            path.push_str(segment);
            path
        })
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn descend(&mut self, name: &str) -> Result<()> {
        self.stack.push(name.to_string());
        let path = self.current_path();
        if let Err(e) = self.session.change_dir(&path) {
            self.stack.pop();
            return Err(e);
        }
        Ok(())
    }

    pub fn ascend(&mut self) -> Result<()> {
        if self.stack.pop().is_none() {
            return Err(SyncError::Navigation(self.base.clone()));
        }
        let path = self.current_path();
        self.session.change_dir(&path)
    }

    pub fn list(&mut self) -> Result<Vec<super::RemoteEntry>> {
        self.session.list_current()
    }
}

/// 把远程根目录规范成以 `/` 开头的绝对路径
fn normalize_base(base: &str) -> String {
    let entry = PathEntry::new(base);
    format!("/{}", entry.as_str())
}

/// 通过远程会话遍历的树
pub struct RemoteTree<'s, S: RemoteSession + ?Sized> {
    session: &'s mut S,
    base: String,
    filter: ScanFilter,
    name: String,
}

impl<'s, S: RemoteSession + ?Sized> RemoteTree<'s, S> {
    pub fn new(session: &'s mut S, base: &str) -> Self {
        let base = normalize_base(base);
        let name = format!("{}{}", session.name(), base);
        Self {
            session,
            base,
            filter: ScanFilter::default(),
            name,
        }
    }

    pub fn with_filter(mut self, filter: ScanFilter) -> Self {
        self.filter = filter;
        self
    }

    /// `root` 只用于排除判断，记录的路径相对 root
    fn walk_dir(
        cursor: &mut RemoteCursor<'_, S>,
        filter: &ScanFilter,
        root: &PathEntry,
        prefix: &PathEntry,
        listing: &mut TreeListing,
    ) -> Result<()> {
        let mut entries = cursor.list()?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        for entry in entries {
            if entry.name.is_empty() || entry.name == "." || entry.name == ".." {
                continue;
            }
            let path = prefix.join(&entry.name);
            if filter.is_excluded(root.join_path(&path).as_str()) {
                tracing::debug!("排除: {}", path);
                continue;
            }

            if entry.is_directory {
                listing.directories.push(path.clone());
                cursor.descend(&entry.name)?;
                Self::walk_dir(cursor, filter, root, &path, listing)?;
                cursor.ascend()?;
            } else {
                let modified_at = entry
                    .modified
                    .as_deref()
                    .map(|value| parse_remote_timestamp(path.as_str(), value))
                    .transpose()?;
                listing.files.push(FileRecord {
                    path,
                    is_directory: false,
                    modified_at,
                });
            }
        }
        Ok(())
    }
}

impl<S: RemoteSession + ?Sized> TreeSource for RemoteTree<'_, S> {
    fn walk(&mut self, root: &PathEntry) -> Result<TreeListing> {
        let start = if root.is_root() {
            self.base.clone()
        } else {
            format!("{}/{}", self.base.trim_end_matches('/'), root)
        };

        let mut cursor = RemoteCursor::open(&mut *self.session, &start)?;
        let mut listing = TreeListing::default();
        Self::walk_dir(&mut cursor, &self.filter, root, &PathEntry::root(), &mut listing)?;
        debug_assert_eq!(cursor.depth(), 0);

        tracing::info!(
            "{}: {} 个目录, {} 个文件",
            self.name,
            listing.directories.len(),
            listing.files.len()
        );
        Ok(listing)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemorySession;
    use crate::storage::RemoteEntry;

    fn session() -> MemorySession {
        let mut s = MemorySession::new();
        s.add_dir("/site/a");
        s.add_dir("/site/a/deep");
        s.add_dir("/site/b");
        s.add_file("/site/a/x.txt", "20240101000000");
        s.add_file("/site/a/deep/y.txt", "20240102000000");
        s.add_file("/site/b/z.txt", "20240103000000");
        s
    }

    #[test]
    fn test_cursor_paths_are_absolute() {
        let mut s = session();
        let mut cursor = RemoteCursor::open(&mut s, "site/").unwrap();
        assert_eq!(cursor.current_path(), "/site");
        cursor.descend("a").unwrap();
        cursor.descend("deep").unwrap();
        assert_eq!(cursor.current_path(), "/site/a/deep");
        cursor.ascend().unwrap();
        cursor.ascend().unwrap();
        assert_eq!(cursor.depth(), 0);
        assert!(matches!(cursor.ascend(), Err(SyncError::Navigation(_))));
        drop(cursor);
        assert_eq!(s.cwd(), "/site");
    }

    #[test]
    fn test_failed_descend_keeps_stack() {
        let mut s = session();
        let mut cursor = RemoteCursor::open(&mut s, "/site").unwrap();
        assert!(cursor.descend("missing").is_err());
        assert_eq!(cursor.depth(), 0);
        cursor.descend("b").unwrap();
        let names: Vec<_> = cursor.list().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["z.txt"]);
    }

    #[test]
    fn test_walk_visits_siblings_in_right_directory() {
        let mut s = session();
        let mut tree = RemoteTree::new(&mut s, "/site");
        let listing = tree.walk(&PathEntry::root()).unwrap();

        let dirs: Vec<_> = listing.directories.iter().map(|p| p.as_str()).collect();
        assert_eq!(dirs, vec!["a", "a/deep", "b"]);
        let files: Vec<_> = listing.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(files, vec!["a/deep/y.txt", "a/x.txt", "b/z.txt"]);
        assert!(listing.files.iter().all(|f| f.modified_at.is_some()));
        assert_eq!(s.cwd(), "/site");
    }

    #[test]
    fn test_walk_subtree() {
        let mut s = session();
        let mut tree = RemoteTree::new(&mut s, "/site");
        let files = tree.list_files(&PathEntry::new("a")).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(names, vec!["deep/y.txt", "x.txt"]);
    }

    #[test]
    fn test_exclude_is_relative_to_base_not_root() {
        let mut s = session();
        let filter = ScanFilter::new(vec!["a/deep/**".to_string()]);
        let mut tree = RemoteTree::new(&mut s, "/site").with_filter(filter);

        let listing = tree.walk(&PathEntry::new("a")).unwrap();
        assert!(listing.directories.is_empty());
        let files: Vec<_> = listing.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(files, vec!["x.txt"]);
    }

    #[test]
    fn test_backslash_in_remote_names() {
        let mut s = MemorySession::new();
        s.add_file("/site/a\\b.txt", "20240101000000");
        s.add_file("/site/x\\y/f.txt", "20240101000000");
        let mut tree = RemoteTree::new(&mut s, "/site");

        let listing = tree.walk(&PathEntry::root()).unwrap();
        assert_eq!(listing.directories, vec![PathEntry::root().join("x\\y")]);
        let files: Vec<_> = listing.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(files, vec!["a\\b.txt", "x\\y/f.txt"]);
        assert_eq!(listing.directories[0].segments().count(), 1);
    }

    #[test]
    fn test_listing_failure_in_subdirectory_aborts_walk() {
        let mut s = session();
        s.fail_listing_in("/site/b");
        let mut tree = RemoteTree::new(&mut s, "/site");
        let err = tree.walk(&PathEntry::root()).unwrap_err();
        assert!(matches!(err, SyncError::Remote { op: "MLSD", .. }));
    }

    #[test]
    fn test_bad_timestamp_aborts_walk() {
        let mut s = session();
        s.add_file("/site/b/bad.txt", "2024-01-01");
        let mut tree = RemoteTree::new(&mut s, "/site");
        let err = tree.walk(&PathEntry::root()).unwrap_err();
        assert!(matches!(err, SyncError::TimestampParse { ref path, .. } if path == "b/bad.txt"));
    }

    #[test]
    fn test_file_without_timestamp_is_kept() {
        let mut s = session();
        s.insert_entry(
            "/site",
            RemoteEntry {
                name: "plain.txt".to_string(),
                is_directory: false,
                modified: None,
            },
        );
        let mut tree = RemoteTree::new(&mut s, "/site");
        let files = tree.list_files(&PathEntry::root()).unwrap();
        let plain = files.iter().find(|f| f.path.as_str() == "plain.txt").unwrap();
        assert!(plain.modified_at.is_none());
    }

    #[test]
    fn test_unreachable_remote_fails() {
        let mut s = session();
        s.set_offline(true);
        let mut tree = RemoteTree::new(&mut s, "/site");
        let err = tree.walk(&PathEntry::root()).unwrap_err();
        assert!(matches!(err, SyncError::Connection { .. }));
    }
}
