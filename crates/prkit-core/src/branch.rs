//! Branch inspection: current branch, ticket extraction, and running project
//! checks against a specific branch.
//!
//! Checks work by checking the branch out first, so a verification run has an
//! observable side effect on the working directory. Never run two
//! verification sequences against the same directory at once.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;
use crate::shell::{ProcessRunner, RunOutput, RunRequest};

// ---------------------------------------------------------------------------
// Ticket extraction
// ---------------------------------------------------------------------------

static TICKET_RE: OnceLock<Regex> = OnceLock::new();

fn ticket_re() -> &'static Regex {
    TICKET_RE.get_or_init(|| Regex::new(r"(?i)^[A-Z]{2,3}-\d{1,4}").unwrap())
}

/// Extract a ticket identifier from a branch name: a 2-3 letter prefix
/// followed by `-` and 1-4 digits, anchored at the start of the name.
/// Returns the match upper-cased, e.g. `MK-101` from `mk-101-fix-header`.
pub fn ticket_number(branch: &str) -> Option<String> {
    ticket_re().find(branch).map(|m| m.as_str().to_uppercase())
}

// ---------------------------------------------------------------------------
// Branch queries
// ---------------------------------------------------------------------------

pub fn current_branch(runner: &dyn ProcessRunner, directory: &Path) -> Result<String> {
    let result = runner.run(&RunRequest::new(
        directory,
        "git",
        ["symbolic-ref", "--short", "HEAD"],
    ))?;
    Ok(result.output.trim().to_string())
}

/// Check out `branch`. Checkout failure is always fatal, whatever the fail
/// policy of the check that follows.
pub fn checkout(runner: &dyn ProcessRunner, directory: &Path, branch: &str) -> Result<()> {
    runner.run(&RunRequest::new(directory, "git", ["checkout", branch]))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Project checks
// ---------------------------------------------------------------------------

/// The npm scripts the pipeline knows how to run against a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Lint,
    Coverage,
}

impl Check {
    fn npm_script(self) -> &'static str {
        match self {
            Check::Lint => "lint",
            Check::Coverage => "coverage",
        }
    }
}

/// Check out `branch`, then run `check` under the given fail policy.
pub fn run_on_branch(
    runner: &dyn ProcessRunner,
    directory: &Path,
    branch: &str,
    check: Check,
    fail_on_error: bool,
) -> Result<RunOutput> {
    checkout(runner, directory, branch)?;
    runner.run(
        &RunRequest::new(directory, "npm", ["run", check.npm_script()]).fail_on_error(fail_on_error),
    )
}

/// Lint results for both sides of a pull request.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LintVerification {
    pub destination: RunOutput,
    pub source: RunOutput,
}

/// Lint both branches. The destination (main line) may carry pre-existing
/// lint debt, so its failures are tolerated; the source branch must be clean.
pub fn verify_linting(
    runner: &dyn ProcessRunner,
    directory: &Path,
    source_branch: &str,
    destination_branch: &str,
) -> Result<LintVerification> {
    Ok(LintVerification {
        destination: run_on_branch(
            runner,
            directory,
            &format!("origin/{destination_branch}"),
            Check::Lint,
            false,
        )?,
        source: run_on_branch(runner, directory, source_branch, Check::Lint, true)?,
    })
}

/// Coverage output for both sides. Coverage regressions are informational,
/// not a merge gate, so both sides tolerate failure.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CoverageReport {
    pub destination: String,
    pub source: String,
}

pub fn code_coverage(
    runner: &dyn ProcessRunner,
    directory: &Path,
    source_branch: &str,
    destination_branch: &str,
) -> Result<CoverageReport> {
    Ok(CoverageReport {
        destination: run_on_branch(
            runner,
            directory,
            &format!("origin/{destination_branch}"),
            Check::Coverage,
            false,
        )?
        .output,
        source: run_on_branch(runner, directory, source_branch, Check::Coverage, false)?.output,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
