//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: async functions in relay production code MUST NOT use
//! blocking I/O or sleep. Use `tokio::fs`, `tokio::io`, `tokio::time`.
//! Blocking calls in plain functions (config loading before the runtime
//! matters, logging setup) are acceptable.

use architectural_enforcement::{in_async_function, production_lines, rust_sources};

const BLOCKING: &[(&str, &str)] = &[
    ("std::fs::", "Blocking file I/O"),
    ("std::net::", "Blocking network I/O"),
    ("std::process::Command", "Blocking process I/O"),
    ("reqwest::blocking", "Blocking HTTP client"),
    ("std::io::stdin()", "Blocking stdin"),
    ("std::io::stdout()", "Blocking stdout"),
    ("thread::sleep", "Thread sleep"),
];

#[test]
fn test_no_blocking_io_in_async_code() {
    let mut violations = Vec::new();

    for dir in ["relay/core/src", "relay/cli/src"] {
        for path in rust_sources(dir) {
            let lines = production_lines(&path);
            for (idx, line) in lines.iter().enumerate() {
                if !in_async_function(&lines, idx) {
                    continue;
                }
                for (pattern, what) in BLOCKING {
                    if line.code.contains(pattern) {
                        violations.push(format!(
                            "{}:{} - {what}: {}",
                            path.display(),
                            line.number,
                            line.code.trim()
                        ));
                    }
                }
            }
        }
    }

    if !violations.is_empty() {
        eprintln!("\n❌ Blocking calls found in async production code!\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        panic!(
            "\nFound {} blocking I/O violation(s) in async code.",
            violations.len()
        );
    }
}

#[test]
fn test_no_sleep_in_production_code() {
    let mut violations = Vec::new();

    for dir in ["relay/core/src", "relay/cli/src"] {
        for path in rust_sources(dir) {
            for line in production_lines(&path) {
                if line.code.contains("sleep(") {
                    violations.push(format!("{}:{}", path.display(), line.number));
                }
            }
        }
    }

    assert!(
        violations.is_empty(),
        "sleep() in production code, wait on I/O instead: {violations:?}"
    );
}
