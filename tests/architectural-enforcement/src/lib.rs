//! Architectural Enforcement Integration Tests
//!
//! Source-scanning checks for rules the compiler cannot enforce:
//! - The chunking core stays free of I/O, async runtimes, and locks
//! - Async code never performs blocking I/O
//!
//! Helpers here are shared by the tests under `tests/`.

use std::fs;
use std::path::{Path, PathBuf};

/// Root of the workspace this crate lives in
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Every `.rs` file under `dir`, relative to the workspace root
#[must_use]
pub fn rust_sources(dir: &str) -> Vec<PathBuf> {
    let path = workspace_root().join(dir);
    walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// A production line of source: 1-based number and code with comments removed
#[derive(Debug)]
pub struct CodeLine {
    /// 1-based line number
    pub number: usize,
    /// Code before any `//` comment
    pub code: String,
}

/// Production lines of `path`, stopping at the first `#[cfg(test)]`
#[must_use]
pub fn production_lines(path: &Path) -> Vec<CodeLine> {
    let Ok(content) = fs::read_to_string(path) else {
        return Vec::new();
    };
    code_lines(&content)
}

/// Same as [`production_lines`] over in-memory source
#[must_use]
pub fn code_lines(content: &str) -> Vec<CodeLine> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .map(|(idx, line)| CodeLine {
            number: idx + 1,
            code: line.split("//").next().unwrap_or(line).to_string(),
        })
        .filter(|line| !line.code.trim().is_empty())
        .collect()
}

/// `Some(is_async)` if the line opens a function
#[must_use]
pub fn function_kind(code: &str) -> Option<bool> {
    let mut rest = code.trim_start();
    for prefix in ["pub(crate) ", "pub(super) ", "pub "] {
        if let Some(stripped) = rest.strip_prefix(prefix) {
            rest = stripped;
            break;
        }
    }
    if rest.starts_with("async fn ") {
        Some(true)
    } else if rest.starts_with("fn ") {
        Some(false)
    } else {
        None
    }
}

/// Whether the nearest function opened before `idx` is async
#[must_use]
pub fn in_async_function(lines: &[CodeLine], idx: usize) -> bool {
    lines[..=idx]
        .iter()
        .rev()
        .find_map(|line| function_kind(&line.code))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_kind() {
        assert_eq!(function_kind("    pub async fn recv(&mut self) {"), Some(true));
        assert_eq!(function_kind("fn flush(&mut self) {"), Some(false));
        assert_eq!(function_kind("pub(crate) fn helper() {"), Some(false));
        assert_eq!(function_kind("let f = 1;"), None);
    }

    #[test]
    fn test_code_lines_skip_tests_and_comments() {
        let source = "fn a() {} // std::fs here\n\n#[cfg(test)]\nmod tests { fn b() {} }\n";
        let lines = code_lines(source);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].number, 1);
        assert!(!lines[0].code.contains("std::fs"));
    }

    #[test]
    fn test_in_async_function() {
        let lines = code_lines("async fn bad() {\n    std::fs::read(\"x\");\n}\nfn ok() {\n    std::fs::read(\"x\");\n}\n");
        assert!(in_async_function(&lines, 1));
        assert!(!in_async_function(&lines, 4));
    }
}
