//! Structural tests for layer boundaries.
//!
//! These scan the source tree so that a wrong-way import fails the build
//! instead of slipping through review.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Read a file and strip comment lines to avoid false positives.
fn read_non_comment_lines(path: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    content
        .lines()
        .filter(|l| {
            let trimmed = l.trim();
            !trimmed.starts_with("//") && !trimmed.starts_with("/*") && !trimmed.starts_with('*')
        })
        .map(String::from)
        .collect()
}

/// Track brace depth and return whether a line is inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    /// Process a line and return `true` if it's inside a `#[cfg(test)]` block.
    fn process_line(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.contains("#[cfg(test)]") {
            self.in_test_block = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                _ => {}
            }
        }
        self.in_test_block
    }
}

fn src_dir(sub: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src").join(sub)
}

fn relative(file: &Path) -> String {
    file.strip_prefix(env!("CARGO_MANIFEST_DIR"))
        .unwrap_or(file)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Non-test lines of every file under `sub` that contain any of `needles`.
fn production_hits(sub: &str, needles: &[&str]) -> Vec<String> {
    let mut hits = Vec::new();
    for file in collect_rs_files(&src_dir(sub)) {
        let rel = relative(&file);
        if rel.ends_with("test_support.rs") {
            continue;
        }
        let mut tracker = CfgTestTracker::new();
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            if tracker.process_line(line) {
                continue;
            }
            if needles.iter().any(|n| line.contains(n)) {
                hits.push(format!("{rel}:{}: {}", i + 1, line.trim()));
            }
        }
    }
    hits
}

// ── Output routing ───────────────────────────────────────────────────────────

#[test]
fn no_inline_json_branching_in_commands() {
    let mut violations: Vec<String> = Vec::new();

    for file in collect_rs_files(&src_dir("commands")) {
        let rel = relative(&file);
        // `version` runs before any context exists.
        if rel.ends_with("version.rs") {
            continue;
        }
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            let lineno = i + 1;
            if line.contains("json: bool") {
                violations.push(format!(
                    "{rel}:{lineno}: found `json: bool` parameter: {line}"
                ));
            }
            let trimmed = line.trim();
            if trimmed.starts_with("if json") || trimmed.starts_with("if !json") {
                violations.push(format!("{rel}:{lineno}: found inline JSON branch: {line}"));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Found inline JSON branching in commands/; use app.is_json() or app.renderer():\n{}",
        violations.join("\n")
    );
}

#[test]
fn services_and_adapters_never_print() {
    let needles = ["println!", "eprintln!", "print!(", "eprint!("];
    let mut violations = production_hits("application", &needles);
    violations.extend(production_hits("infra", &needles));
    violations.extend(production_hits("domain", &needles));

    assert!(
        violations.is_empty(),
        "Found print macros below the command layer; emit through an EventSink:\n{}",
        violations.join("\n")
    );
}

// ── Process execution ────────────────────────────────────────────────────────

#[test]
fn no_tokio_command_runner_new_outside_infra() {
    let mut violations: Vec<String> = Vec::new();

    for file in collect_rs_files(&src_dir("")) {
        let rel = relative(&file);
        if rel.contains("/infra/") {
            continue;
        }
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            if line.contains("TokioCommandRunner::new") {
                violations.push(format!("{rel}:{}: {}", i + 1, line.trim()));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "TokioCommandRunner must only be built in infra/ (see infra::system):\n{}",
        violations.join("\n")
    );
}

#[test]
fn application_does_not_spawn_processes() {
    let violations = production_hits(
        "application",
        &["std::process::Command", "tokio::process", "Command::new("],
    );

    assert!(
        violations.is_empty(),
        "application/ must run commands through the CommandRunner port:\n{}",
        violations.join("\n")
    );
}

// ── Layer imports ────────────────────────────────────────────────────────────

#[test]
fn domain_is_free_of_io_and_outer_layers() {
    let violations = production_hits(
        "domain",
        &[
            "use tokio",
            "tokio::",
            "std::fs",
            "reqwest",
            "crate::application",
            "crate::infra",
            "crate::commands",
            "crate::output",
        ],
    );

    assert!(
        violations.is_empty(),
        "domain/ must stay pure:\n{}",
        violations.join("\n")
    );
}

#[test]
fn application_does_not_import_adapters_or_presentation() {
    let violations = production_hits(
        "application",
        &["crate::infra", "crate::commands", "crate::output", "crate::app::"],
    );

    assert!(
        violations.is_empty(),
        "application/ may only depend on domain/ and its own ports:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_does_not_import_commands_or_output() {
    let violations = production_hits(
        "infra",
        &["crate::commands", "crate::output", "crate::app::", "crate::application::services"],
    );

    assert!(
        violations.is_empty(),
        "infra/ may only depend on domain/ and application::ports:\n{}",
        violations.join("\n")
    );
}

// ── Command handlers ─────────────────────────────────────────────────────────

#[test]
fn command_handlers_take_app_context() {
    let mut violations: Vec<String> = Vec::new();

    for file in collect_rs_files(&src_dir("commands")) {
        let rel = relative(&file);
        if rel.ends_with("mod.rs") || rel.ends_with("version.rs") || rel.ends_with("internal.rs") {
            continue;
        }
        let lines = read_non_comment_lines(&file);
        let handlers: Vec<&String> = lines
            .iter()
            .filter(|l| l.contains("pub async fn run(") || l.contains("pub fn run("))
            .collect();
        if handlers.is_empty() {
            violations.push(format!("{rel}: no `run` handler"));
        }
        for line in handlers {
            if !line.contains("app: &AppContext") {
                violations.push(format!("{rel}: {}", line.trim()));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Command handlers must take `app: &AppContext` first:\n{}",
        violations.join("\n")
    );
}
