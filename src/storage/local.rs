use super::{FileRecord, PathEntry, ScanFilter, Timestamp, TreeListing, TreeSource};
use crate::error::{Result, SyncError};
use chrono::{DateTime, SubsecRound, Utc};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// 本地文件系统，只读
pub struct LocalTree {
    base_path: PathBuf,
    filter: ScanFilter,
    name: String,
}

impl LocalTree {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let base_path = path.into();
        let name = format!("local:{}", base_path.display());
        Self {
            base_path,
            filter: ScanFilter::default(),
            name,
        }
    }

    pub fn with_filter(mut self, filter: ScanFilter) -> Self {
        self.filter = filter;
        self
    }

    /// 逐段拼到 base_path 上，段内的字符不当作分隔符
    fn resolve_path(&self, path: &PathEntry) -> PathBuf {
        path.segments().fold(self.base_path.clone(), |mut full, segment| {
            full.push(segment);
            full
        })
    }

    /// 查询文件的修改时间（截断到秒，与远程精度一致）
    pub fn modified_at(&self, root: &PathEntry, path: &PathEntry) -> Result<Timestamp> {
        let full_path = self.resolve_path(&root.join_path(path));
        let modified = std::fs::metadata(&full_path)?.modified()?;
        Ok(DateTime::<Utc>::from(modified).trunc_subsecs(0))
    }

    /// 按路径组件转换（统一使用 /），名称里的 `\` 保留
    fn relative_entry(base: &Path, path: &Path) -> Option<PathEntry> {
        let relative = path.strip_prefix(base).ok()?;
        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(name) => segments.push(name.to_str()?),
                Component::CurDir => {}
                _ => return None,
            }
        }
        let entry = PathEntry::from_segments(segments);
        (!entry.is_root()).then_some(entry)
    }
}

impl TreeSource for LocalTree {
    fn walk(&mut self, root: &PathEntry) -> Result<TreeListing> {
        let base = self.resolve_path(root);
        if !base.is_dir() {
            return Err(SyncError::NotFound(base));
        }

        let mut listing = TreeListing::default();
        let filter = &self.filter;
        let mut walker = WalkDir::new(&base)
            .follow_links(false)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = entry?;
            let Some(path) = Self::relative_entry(&base, entry.path()) else {
                tracing::warn!("跳过无法转换的路径: {:?}", entry.path());
                continue;
            };

            // 排除规则相对 base_path，与 root 无关
            if filter.is_excluded(root.join_path(&path).as_str()) {
                tracing::debug!("排除: {}", path);
                if entry.file_type().is_dir() {
                    walker.skip_current_dir();
                }
                continue;
            }

            if entry.file_type().is_dir() {
                listing.directories.push(path);
            } else if entry.file_type().is_file() {
                listing.files.push(FileRecord {
                    path,
                    is_directory: false,
                    modified_at: None,
                });
            }
        }

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
    use std::fs;

    fn sample_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/deep")).unwrap();
        fs::create_dir_all(dir.path().join(".git/objects")).unwrap();
        fs::write(dir.path().join("a/x.txt"), b"x").unwrap();
        fs::write(dir.path().join("a/deep/y.txt"), b"y").unwrap();
        fs::write(dir.path().join("top.txt"), b"t").unwrap();
        fs::write(dir.path().join(".git/HEAD"), b"ref").unwrap();
        dir
    }

    #[test]
    fn test_walk_lists_dirs_and_files() {
        let dir = sample_tree();
        let mut tree = LocalTree::new(dir.path());

        let dirs = tree.list_directories(&PathEntry::root()).unwrap();
        let names: Vec<_> = dirs.iter().map(|p| p.as_str()).collect();
        assert_eq!(names, vec![".git", ".git/objects", "a", "a/deep"]);

        let files = tree.list_files(&PathEntry::root()).unwrap();
        assert!(files.iter().all(|f| f.modified_at.is_none()));
        let names: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(names, vec![".git/HEAD", "a/deep/y.txt", "a/x.txt", "top.txt"]);
    }

    #[test]
    fn test_walk_is_relative_to_root() {
        let dir = sample_tree();
        let mut tree = LocalTree::new(dir.path());
        let listing = tree.walk(&PathEntry::new("a")).unwrap();
        assert_eq!(listing.directories, vec![PathEntry::new("deep")]);
        assert_eq!(listing.files.len(), 2);
        assert_eq!(listing.files[0].path, PathEntry::new("deep/y.txt"));
    }

    #[test]
    fn test_excluded_directory_is_not_descended() {
        let dir = sample_tree();
        let mut tree = LocalTree::new(dir.path())
            .with_filter(ScanFilter::new(vec![".git/**".to_string()]));
        let listing = tree.walk(&PathEntry::root()).unwrap();
        assert!(listing.directories.iter().all(|d| !d.as_str().starts_with(".git")));
        assert!(listing.files.iter().all(|f| !f.path.as_str().starts_with(".git")));
    }

    #[test]
    fn test_exclude_is_relative_to_base_not_root() {
        let dir = sample_tree();
        fs::create_dir_all(dir.path().join("a/deep/cache")).unwrap();
        fs::write(dir.path().join("a/deep/cache/c.bin"), b"c").unwrap();
        let mut tree = LocalTree::new(dir.path())
            .with_filter(ScanFilter::new(vec!["a/deep/**".to_string()]));

        let listing = tree.walk(&PathEntry::new("a")).unwrap();
        assert!(listing.directories.is_empty());
        let names: Vec<_> = listing.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(names, vec!["x.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_backslash_in_name_is_one_segment() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("x\\y")).unwrap();
        fs::write(dir.path().join("x\\y/f.txt"), b"f").unwrap();
        fs::write(dir.path().join("a\\b.txt"), b"ab").unwrap();
        let mut tree = LocalTree::new(dir.path());

        let listing = tree.walk(&PathEntry::root()).unwrap();
        assert_eq!(listing.directories, vec![PathEntry::root().join("x\\y")]);
        let files: Vec<_> = listing.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(files, vec!["a\\b.txt", "x\\y/f.txt"]);

        let file = PathEntry::root().join("a\\b.txt");
        assert!(tree.modified_at(&PathEntry::root(), &file).is_ok());
    }

    #[test]
    fn test_missing_root_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut tree = LocalTree::new(dir.path().join("nope"));
        let err = tree.walk(&PathEntry::root()).unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));
    }

    #[test]
    fn test_modified_at_truncates_to_seconds() {
        let dir = sample_tree();
        let tree = LocalTree::new(dir.path());
        let t = tree
            .modified_at(&PathEntry::root(), &PathEntry::new("a/x.txt"))
            .unwrap();
        assert_eq!(t.timestamp_subsec_nanos(), 0);
    }
}
