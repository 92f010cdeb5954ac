//! The pull-request assembler.
//!
//! A strictly linear pipeline with no retries; any step's failure aborts the
//! remaining steps. Destination-side lint and coverage outcomes are captured
//! as data and surfaced in the description rather than aborting the run.
//! Checkout failures, a source-branch lint failure, a missing repository,
//! and hosting-API rejections abort.

use std::path::PathBuf;

use serde::Serialize;

use crate::bitbucket::{BitbucketClient, CreatedPullRequest, PullRequestDraft};
use crate::branch;
use crate::changes;
use crate::checklist::{ChecklistContext, ChecklistRegistry};
use crate::describe;
use crate::error::{PrkitError, Result};
use crate::jira::JiraClient;
use crate::reviewers::{IndexSampler, ReviewerResolver};
use crate::shell::ProcessRunner;

// ---------------------------------------------------------------------------
// Parameters / report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CreateParams {
    pub directory: PathBuf,
    /// Review title; defaults to the title-cased source branch name.
    pub title: Option<String>,
    /// Reviewer specifiers: names, team names, or integer counts.
    pub reviewers: Vec<String>,
    /// Source branch; defaults to the current branch.
    pub source_branch: Option<String>,
    pub destination_branch: String,
    pub owner: String,
    /// Free-form summary parts, joined under a `### Summary:` header.
    pub summary: Vec<String>,
    /// Force markup checklists on or off, overriding the classification.
    pub jsx: Option<bool>,
    /// Username never invited as a reviewer (usually the author).
    pub exclude_username: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChecklistComment {
    pub name: String,
    pub text: String,
}

/// Everything the caller needs to report on a finished run. Printing lives
/// with the caller, not here.
#[derive(Debug, Clone, Serialize)]
pub struct CreateReport {
    pub pull_request: CreatedPullRequest,
    pub title: String,
    pub source_branch: String,
    pub destination_branch: String,
    /// Resolved reviewers by display name.
    pub reviewers: Vec<String>,
    pub description: String,
    pub coverage: branch::CoverageReport,
    pub checklists: Vec<ChecklistComment>,
    pub dry_run: bool,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
pub fn create_pull_request(
    runner: &dyn ProcessRunner,
    bitbucket: &BitbucketClient,
    jira: Option<&JiraClient>,
    resolver: &mut ReviewerResolver,
    sampler: &mut dyn IndexSampler,
    registry: &mut ChecklistRegistry,
    params: &CreateParams,
) -> Result<CreateReport> {
    // PREPARE: resolve pending defaults.
    let source_branch = match &params.source_branch {
        Some(branch) => branch.clone(),
        None => branch::current_branch(runner, &params.directory)?,
    };
    let title = params
        .title
        .clone()
        .unwrap_or_else(|| describe::title_from_branch(&source_branch));
    let summary = describe::summary_block(&params.summary);

    // VERIFY: lint gates the source branch; coverage is informational.
    let lint = branch::verify_linting(
        runner,
        &params.directory,
        &source_branch,
        &params.destination_branch,
    )?;
    let coverage = branch::code_coverage(
        runner,
        &params.directory,
        &source_branch,
        &params.destination_branch,
    )?;
    let verification = describe::verification_block(&lint);

    // RESOLVE_REVIEWERS
    let reviewers = resolver.resolve(
        &params.reviewers,
        params.exclude_username.as_deref(),
        sampler,
    )?;

    // RESOLVE_REPOSITORY: the project is named after the working directory.
    let project_name = params
        .directory
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let repository_slug = bitbucket
        .repository_slug(&params.owner, &project_name)?
        .ok_or_else(|| PrkitError::RepositoryNotFound(project_name.clone()))?;

    // BUILD_DESCRIPTION: summary, ticket, commits, verification, in order.
    let commits = bitbucket.commit_messages(
        &params.owner,
        &repository_slug,
        &source_branch,
        &params.destination_branch,
    )?;
    let mut description = summary.unwrap_or_default();
    if let (Some(ticket), Some(jira)) = (branch::ticket_number(&source_branch), jira) {
        description.push_str(&describe::ticket_block(jira, &ticket));
    }
    description.push_str(&describe::commits_block(&commits));
    description.push_str("\n\n");
    description.push_str(&verification);

    // SUBMIT
    let draft = PullRequestDraft {
        owner: params.owner.clone(),
        title: title.clone(),
        repository_slug,
        source_branch: source_branch.clone(),
        destination_branch: params.destination_branch.clone(),
        reviewers: reviewers.clone(),
        description: description.clone(),
        dry_run: params.dry_run,
    };
    let pull_request = bitbucket.create_pull_request(&draft)?;

    // ATTACH_CHECKLISTS: one comment per active checklist. The request is
    // never rolled back if a comment fails afterwards.
    let change_set = changes::process_changes(
        runner,
        &params.directory,
        &source_branch,
        &params.destination_branch,
    )?;
    registry.init()?;
    let context = ChecklistContext {
        jsx_changed: change_set.jsx_changed,
        jsx_override: params.jsx,
    };
    let mut checklists = Vec::new();
    for (name, tasks) in registry.evaluate(&context) {
        let text = describe::checklist_comment(&name, &tasks);
        bitbucket.create_comment(&pull_request, &text, params.dry_run)?;
        checklists.push(ChecklistComment { name, text });
    }

    Ok(CreateReport {
        pull_request,
        title,
        source_branch,
        destination_branch: params.destination_branch.clone(),
        reviewers: reviewers
            .into_iter()
            .map(|reviewer| reviewer.display_name)
            .collect(),
        description,
        coverage,
        checklists,
        dry_run: params.dry_run,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
