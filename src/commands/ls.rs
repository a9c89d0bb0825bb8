use crate::error::Result;
use crate::storage::{PathEntry, TreeSource};
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Side {
    Local,
    Remote,
}

/// 列出一边的树：先目录（带 `/`），再文件
pub fn list_tree(source: &mut dyn TreeSource, root: &PathEntry) -> Result<Vec<String>> {
    let mut records = source.walk(root)?.into_records();
    records.sort_by(|a, b| {
        b.is_directory
            .cmp(&a.is_directory)
            .then_with(|| a.path.display_cmp(&b.path))
    });

    let lines = records
        .iter()
        .map(|r| match (r.is_directory, r.modified_at) {
            (true, _) => format!("{}/", r.path),
            (false, Some(t)) => format!("{}  {}", r.path, t.format("%Y-%m-%d %H:%M:%S")),
            (false, None) => r.path.to_string(),
        })
        .collect();
    Ok(lines)
}
