//! 对比结果的展示

use crate::core::ReconciliationResult;
use crate::storage::PathEntry;
use clap::ValueEnum;
use owo_colors::OwoColorize;
use std::fmt;

/// 以哪一边为准来描述差异
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Direction {
    /// 本地为准：只在本地的是 ADDED，只在远程的是 DELETED
    #[default]
    Upload,
    /// 远程为准：只在远程的是 ADDED，只在本地的是 DELETED
    Download,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Added,
    Deleted,
    Changed,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Label::Added => "ADDED",
            Label::Deleted => "DELETED",
            Label::Changed => "CHANGED",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub label: Label,
    /// 目录带结尾的 `/`
    pub path: String,
    pub note: Option<&'static str>,
}

pub fn report_lines(result: &ReconciliationResult, direction: Direction) -> Vec<ReportLine> {
    let (local_only, remote_only) = match direction {
        Direction::Upload => (Label::Added, Label::Deleted),
        Direction::Download => (Label::Deleted, Label::Added),
    };

    let mut lines = Vec::with_capacity(result.summary().total());
    let mut push = |label: Label, paths: &[PathEntry], is_dir: bool, note: Option<&'static str>| {
        lines.extend(paths.iter().map(|p| ReportLine {
            label,
            path: if is_dir { format!("{}/", p) } else { p.to_string() },
            note,
        }));
    };

    push(local_only, &result.dirs_added_local, true, None);
    push(remote_only, &result.dirs_added_remote, true, None);
    push(local_only, &result.files_added_local, false, None);
    push(remote_only, &result.files_added_remote, false, None);
    push(Label::Changed, &result.files_modified_local, false, Some("local newer"));
    push(Label::Changed, &result.files_modified_remote, false, Some("remote newer"));

    lines
}

pub fn render(lines: &[ReportLine], color: bool) -> String {
    let mut out = String::new();
    for line in lines {
        let label = format!("{:<7}", line.label.to_string());
        let label = match (color, line.label) {
            (false, _) => label,
            (true, Label::Added) => label.green().to_string(),
            (true, Label::Deleted) => label.red().to_string(),
            (true, Label::Changed) => label.yellow().to_string(),
        };
        out.push_str(&label);
        out.push(' ');
        out.push_str(&line.path);
        if let Some(note) = line.note {
            out.push_str(&format!(" ({})", note));
        }
        out.push('\n');
    }
    out
}
