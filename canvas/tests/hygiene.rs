//! Source hygiene for the canvas crate.
//!
//! The canvas model runs inside UI hosts that cannot afford a panic or a
//! stray write to stdout. Each rule below has a budget, currently zero; a
//! rule's budget may only go down.

use std::fs;
use std::path::{Path, PathBuf};

struct Rule {
    pattern: &'static str,
    budget: usize,
    reason: &'static str,
}

const RULES: &[Rule] = &[
    Rule { pattern: ".unwrap()", budget: 0, reason: "propagate or handle the error" },
    Rule { pattern: ".expect(", budget: 0, reason: "propagate or handle the error" },
    Rule { pattern: "panic!(", budget: 0, reason: "return an error or ignore the input" },
    Rule { pattern: "unreachable!(", budget: 0, reason: "make the state unrepresentable" },
    Rule { pattern: "todo!(", budget: 0, reason: "finish the stub" },
    Rule { pattern: "unimplemented!(", budget: 0, reason: "finish the stub" },
    Rule { pattern: "let _ =", budget: 0, reason: "log or handle the discarded result" },
    Rule { pattern: ".ok()", budget: 0, reason: "log or handle the discarded error" },
    Rule { pattern: "println!(", budget: 0, reason: "log through tracing" },
    Rule { pattern: "eprintln!(", budget: 0, reason: "log through tracing" },
    Rule { pattern: "dbg!(", budget: 0, reason: "remove debugging output" },
    Rule { pattern: "#[allow(dead_code)]", budget: 0, reason: "delete the unused code" },
];

/// Production sources under `src/`; `*_test.rs` files are exempt.
fn production_sources(dir: &Path) -> Vec<(PathBuf, String)> {
    let mut out = Vec::new();
    let Ok(entries) = fs::read_dir(dir) else {
        return out;
    };
    for path in entries.flatten().map(|e| e.path()) {
        if path.is_dir() {
            out.extend(production_sources(&path));
            continue;
        }
        let is_test = path.to_string_lossy().ends_with("_test.rs");
        if path.extension().is_some_and(|e| e == "rs") && !is_test {
            if let Ok(content) = fs::read_to_string(&path) {
                out.push((path, content));
            }
        }
    }
    out
}

#[test]
fn sources_are_found() {
    let sources = production_sources(Path::new("src"));
    assert!(sources.iter().any(|(path, _)| path.ends_with("lib.rs")), "scanned from wrong directory");
}

#[test]
fn rule_budgets_hold() {
    let sources = production_sources(Path::new("src"));
    let mut failures = Vec::new();

    for rule in RULES {
        let hits: Vec<String> = sources
            .iter()
            .flat_map(|(path, content)| {
                content
                    .lines()
                    .enumerate()
                    .filter(|(_, line)| line.contains(rule.pattern))
                    .map(move |(n, _)| format!("    {}:{}", path.display(), n + 1))
            })
            .collect();
        if hits.len() > rule.budget {
            failures.push(format!(
                "`{}` found {} times, budget {} ({}):\n{}",
                rule.pattern,
                hits.len(),
                rule.budget,
                rule.reason,
                hits.join("\n")
            ));
        }
    }

    assert!(failures.is_empty(), "hygiene budgets exceeded:\n{}", failures.join("\n"));
}
