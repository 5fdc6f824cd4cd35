//! Integration Test: Chunking Core Purity
//!
//! The chunk buffer is pure logic driven by a single owner. It must not do
//! I/O, depend on an async runtime, or take locks; the streaming layer owns
//! all of that.

use architectural_enforcement::{production_lines, rust_sources};

const FORBIDDEN: &[(&str, &str)] = &[
    ("tokio::", "async runtime"),
    ("reqwest", "HTTP client"),
    ("std::fs", "file I/O"),
    ("std::net", "network I/O"),
    ("std::io", "stream I/O"),
    ("std::thread", "threads"),
    ("Mutex", "locking"),
    ("RwLock", "locking"),
    ("async fn", "async code"),
];

#[test]
fn test_chunk_module_is_pure() {
    let sources = rust_sources("relay/core/src/chunk");
    assert!(!sources.is_empty(), "chunk module sources not found");

    let mut violations = Vec::new();
    for path in &sources {
        for line in production_lines(path) {
            for (pattern, what) in FORBIDDEN {
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

    if !violations.is_empty() {
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        panic!(
            "\nFound {} purity violation(s) in the chunking core.",
            violations.len()
        );
    }
}
