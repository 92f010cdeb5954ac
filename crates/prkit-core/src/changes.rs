//! Change analysis between two branches.
//!
//! Computes the list of changed files and the raw diff per file, then derives
//! higher-level classifications from the diff text. The classification is a
//! text heuristic over diff bodies, not a parser; false positives on generic
//! `<` usage are accepted behavior.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;
use crate::shell::{ProcessRunner, RunRequest};

static SOURCE_JS_RE: OnceLock<Regex> = OnceLock::new();
static JSX_TOKEN_RE: OnceLock<Regex> = OnceLock::new();

fn source_js_re() -> &'static Regex {
    SOURCE_JS_RE.get_or_init(|| Regex::new(r"^src/.*\.js$").unwrap())
}

fn jsx_token_re() -> &'static Regex {
    JSX_TOKEN_RE.get_or_init(|| Regex::new(r"(?i)<[a-z]+|<>").unwrap())
}

/// Everything the analyzer learned about the diff between two branches.
/// `diff_by_file` keys are exactly the entries of `changed_files`.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub changed_files: Vec<String>,
    pub diff_by_file: HashMap<String, String>,
    pub jsx_changed: bool,
}

/// Diff `origin/<destination>..<source>` and classify the result. Any
/// underlying command failure aborts the whole computation; there are no
/// partial results.
pub fn process_changes(
    runner: &dyn ProcessRunner,
    directory: &Path,
    source_branch: &str,
    destination_branch: &str,
) -> Result<ChangeSet> {
    let range = format!("origin/{destination_branch}..{source_branch}");

    let names = runner.run(&RunRequest::new(
        directory,
        "git",
        ["diff", range.as_str(), "--name-only"],
    ))?;
    let changed_files: Vec<String> = names
        .output
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    // One diff invocation per file, strictly in file order. Serialized to
    // bound concurrent process spawns.
    let mut diff_by_file = HashMap::with_capacity(changed_files.len());
    for file in &changed_files {
        let diff = runner.run(&RunRequest::new(
            directory,
            "git",
            ["diff", range.as_str(), "--", file.as_str()],
        ))?;
        diff_by_file.insert(file.clone(), diff.output);
    }

    let jsx_changed = jsx_changed(&changed_files, &diff_by_file);
    Ok(ChangeSet {
        changed_files,
        diff_by_file,
        jsx_changed,
    })
}

fn contains_jsx(diff: &str) -> bool {
    jsx_token_re().is_match(diff)
}

/// True iff some changed file under `src/` with a `.js` extension has a diff
/// containing an HTML/JSX-like tag token.
fn jsx_changed(changed_files: &[String], diff_by_file: &HashMap<String, String>) -> bool {
    changed_files
        .iter()
        .filter(|file| source_js_re().is_match(file))
        .any(|file| {
            diff_by_file
                .get(file.as_str())
                .is_some_and(|diff| contains_jsx(diff))
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
