//! Markdown building blocks for the pull-request description.
//!
//! The final description is the summary block (if any), then the ticket
//! block (if a ticket is found and Jira is configured), then the commits
//! block, then the verification block.

use crate::branch::LintVerification;
use crate::jira::JiraClient;
use crate::shell::RunOutput;

/// Ticket descriptions are trimmed to fit on one screen of the PR body.
pub const MAX_TICKET_DESCRIPTION: usize = 80;

/// Free-form summary text under a `### Summary:` header.
pub fn summary_block(parts: &[String]) -> Option<String> {
    if parts.is_empty() {
        return None;
    }
    Some(format!("### Summary:\n\n{}\n\n", parts.join(" ")))
}

/// Ticket link plus its (truncated) description.
pub fn ticket_block(jira: &JiraClient, ticket: &str) -> String {
    let mut block = format!("Jira: [{ticket}]({})\n\n", jira.issue_url(ticket));
    if let Some(description) = jira.fetch_description(ticket, Some(MAX_TICKET_DESCRIPTION)) {
        if !description.is_empty() {
            block.push_str(&description);
            block.push_str("\n\n");
        }
    }
    block
}

/// One bullet per commit message, newlines flattened to spaces so each
/// message stays on its own line.
pub fn commits_block(messages: &[String]) -> String {
    let bullets = messages
        .iter()
        .map(|message| format!("* {}", message.replace('\n', " ")))
        .collect::<Vec<_>>()
        .join("\n");
    format!("### Commits:\n{bullets}")
}

fn lint_summary(result: &RunOutput) -> String {
    if result.success {
        "Passed linting.\n\n".to_string()
    } else {
        format!("Did _not_ pass linting!\n\n\n```\n{}\n```\n\n\n", result.output)
    }
}

/// Human-readable before/after lint summary for both sides of the request.
pub fn verification_block(lint: &LintVerification) -> String {
    format!(
        "### Before PR:\n{}\n### After PR:\n{}",
        lint_summary(&lint.destination),
        lint_summary(&lint.source)
    )
}

/// Comment body for one checklist.
pub fn checklist_comment(name: &str, tasks: &[String]) -> String {
    let bullets = tasks
        .iter()
        .map(|task| format!("  * {task}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("### Review Checklist: {name}\n{bullets}")
}

/// Default review title derived from the branch name, e.g.
/// `MK-101-fix-header` becomes `Mk 101 Fix Header`.
pub fn title_from_branch(branch: &str) -> String {
    branch
        .split(|c: char| c == '-' || c == '_' || c == '/' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
