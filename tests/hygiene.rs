//! Hygiene: scans the library sources for patterns the editor core must not use.
//!
//! Every rule has a budget of zero. Test files (`*_test.rs`) are exempt; they
//! may unwrap and panic freely.

use std::fs;
use std::path::Path;

struct Rule {
    pattern: &'static str,
    why: &'static str,
}

const RULES: &[Rule] = &[
    // Panics.
    Rule { pattern: ".unwrap()", why: "propagate with `?` or fall back with unwrap_or" },
    Rule { pattern: ".expect(", why: "propagate with `?`" },
    Rule { pattern: "panic!(", why: "return an error" },
    Rule { pattern: "unreachable!(", why: "make the match exhaustive" },
    Rule { pattern: "todo!(", why: "finish the implementation" },
    Rule { pattern: "unimplemented!(", why: "finish the implementation" },
    // Silent loss.
    Rule { pattern: "let _ =", why: "inspect or log the value" },
    Rule { pattern: ".ok()", why: "match on the error and log it" },
    // Output goes through tracing or the console panel.
    Rule { pattern: "println!(", why: "use tracing" },
    Rule { pattern: "eprintln!(", why: "use tracing" },
    Rule { pattern: "dbg!(", why: "remove debug output" },
    // Structure.
    Rule { pattern: "#[allow(dead_code)]", why: "delete the unused item" },
];

struct SourceFile {
    path: String,
    content: String,
}

/// Production `.rs` files under `src/`.
fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect_rs_files(Path::new("src"), &mut files);
    files
}

fn collect_rs_files(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
            continue;
        }
        let path_str = path.to_string_lossy().to_string();
        if path.extension().is_none_or(|e| e != "rs") || path_str.ends_with("_test.rs") {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            out.push(SourceFile { path: path_str, content });
        }
    }
}

/// `path:line` for every line containing `pattern`.
fn hits(files: &[SourceFile], pattern: &str) -> Vec<String> {
    files
        .iter()
        .flat_map(|file| {
            file.content
                .lines()
                .enumerate()
                .filter(|(_, line)| line.contains(pattern))
                .map(|(n, _)| format!("  {}:{}", file.path, n + 1))
        })
        .collect()
}

#[test]
fn sources_are_found() {
    let files = source_files();
    assert!(files.iter().any(|f| f.path.ends_with("lib.rs")), "run from the crate root");
}

#[test]
fn no_banned_patterns() {
    let files = source_files();
    let report: Vec<String> = RULES
        .iter()
        .filter_map(|rule| {
            let found = hits(&files, rule.pattern);
            (!found.is_empty()).then(|| format!("{} ({}):\n{}", rule.pattern, rule.why, found.join("\n")))
        })
        .collect();
    assert!(report.is_empty(), "banned patterns in src/:\n{}", report.join("\n"));
}

#[test]
fn every_test_file_is_attached() {
    let files = source_files();
    let Ok(entries) = fs::read_dir("src") else {
        panic!("src/ is not readable");
    };
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        let Some(module) = name.strip_suffix("_test.rs") else { continue };
        let attr = format!("#[path = \"{name}\"]");
        let owner = files.iter().find(|f| f.path.ends_with(&format!("/{module}.rs")));
        assert!(
            owner.is_some_and(|f| f.content.contains(&attr)),
            "{name} is not attached to {module}.rs with {attr}"
        );
    }
}
