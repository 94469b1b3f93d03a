//! Shell-style file-name patterns (`OG*_hits.tsv`) for picking batch inputs out of a directory.

use anyhow::{Context, Result};
use log::warn;
use regex::Regex;
use std::path::{Path, PathBuf};

/// A compiled file-name pattern supporting `*` (any run) and `?` (any single char).
#[derive(Debug, Clone)]
pub struct FilePattern {
    source: String,
    re: Regex,
}

impl FilePattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let mut expr = String::with_capacity(pattern.len() + 8);
        expr.push('^');
        for c in pattern.chars() {
            match c {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                other => expr.push_str(&regex::escape(&other.to_string())),
            }
        }
        expr.push('$');
        let re = Regex::new(&expr).with_context(|| format!("Invalid file pattern '{}'", pattern))?;
        Ok(Self { source: pattern.to_string(), re })
    }

    /// Pattern matching every file whose name ends in `suffix`.
    pub fn with_suffix(suffix: &str) -> Result<Self> {
        Self::new(&format!("*{}", suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.re.is_match(file_name)
    }

    /// Regular files directly inside `dir` whose names match, sorted by path.
    pub fn find_in(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory {}", dir.display()))?;
        let mut out = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            let path = entry.path();
            let matched = path
                .file_name()
                .map(|n| self.matches(&n.to_string_lossy()))
                .unwrap_or(false);
            if matched && path.is_file() {
                out.push(path);
            }
        }
        out.sort();
        Ok(out)
    }
}
