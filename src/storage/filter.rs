use regex::Regex;

/// 默认排除规则
pub fn default_exclude_patterns() -> Vec<String> {
    vec![
        ".git/**".to_string(),
        ".svn/**".to_string(),
        ".DS_Store".to_string(),
        "Thumbs.db".to_string(),
        "*.tmp".to_string(),
    ]
}

/// 排除规则（glob），两边使用同一份
#[derive(Debug, Clone, Default)]
pub struct ScanFilter {
    compiled: Vec<CompiledPattern>,
}

#[derive(Debug, Clone)]
struct CompiledPattern {
    regex: Regex,
    /// 不含 `/` 的规则只匹配最后一段
    name_only: bool,
}

impl ScanFilter {
    pub fn new(patterns: Vec<String>) -> Self {
        let compiled = patterns
            .iter()
            .filter_map(|p| match glob_to_regex(p) {
                Ok(regex) => Some(CompiledPattern {
                    regex,
                    name_only: !p.contains('/'),
                }),
                Err(e) => {
                    tracing::warn!("忽略无效的排除规则 {}: {}", p, e);
                    None
                }
            })
            .collect();
        Self { compiled }
    }

    /// 检查相对路径是否应该被排除
    ///
    /// 路径相对于树的 base（本地根目录或远程根目录），而不是本次的起点。
    pub fn is_excluded(&self, path: &str) -> bool {
        let name = path.rsplit('/').next().unwrap_or(path);
        self.compiled.iter().any(|p| {
            if p.name_only {
                p.regex.is_match(name)
            } else {
                p.regex.is_match(path)
            }
        })
    }
}

/// 把 glob 转成不区分大小写的正则
fn glob_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let pattern = pattern.trim_start_matches('/');
    let (body, any_suffix) = match pattern.strip_suffix("/**") {
        Some(prefix) => (prefix, true),
        None => (pattern, false),
    };

    let mut out = String::from("(?i)^");
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                out.push_str(".*");
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            c => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    if any_suffix {
        out.push_str("(/.*)?");
    }
    out.push('$');

    Regex::new(&out)
}
