//! Directory listing parsing.
//!
//! Image directories are served either as an HTML index (Apache, nginx
//! autoindex) or as a plain text file with one name per line.

use regex::Regex;
use std::sync::LazyLock;

static HREF_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)href\s*=\s*["']([^"']+)["']"#).expect("valid href regex")
});

/// Extract file names from a directory listing body.
///
/// Links to parent or sub-directories, sort links and absolute URLs to
/// other hosts are ignored. Order of first appearance is kept and names
/// are de-duplicated.
pub fn parse_listing(body: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();

    let hrefs: Vec<&str> = HREF_REGEX
        .captures_iter(body)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    let candidates: Vec<&str> = if hrefs.is_empty() && !body.contains('<') {
        body.lines().map(str::trim).collect()
    } else {
        hrefs
    };

    for raw in candidates {
        if let Some(name) = entry_name(raw) {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }

    names
}

fn entry_name(raw: &str) -> Option<&str> {
    if raw.is_empty() || raw.starts_with('?') || raw.starts_with('#') || raw.ends_with('/') {
        return None;
    }
    if raw.contains("://") || raw.starts_with("..") {
        return None;
    }
    let name = raw.rsplit('/').next()?;
    (!name.is_empty()).then_some(name)
}

/// Join a directory URL and an entry name.
pub fn join_url(directory: &str, name: &str) -> String {
    if directory.ends_with('/') {
        format!("{}{}", directory, name)
    } else {
        format!("{}/{}", directory, name)
    }
}
