use anyhow::Context;
use clap::Args;
use prkit_core::{
    assemble::{self, CreateParams, CreateReport},
    bitbucket::BitbucketClient,
    checklist::ChecklistRegistry,
    config::Config,
    jira::JiraClient,
    reviewers::{ReviewerResolver, ThreadRngSampler},
    shell::SystemRunner,
    teams::DEFAULT_TEAMS_URL,
};

use crate::output::print_json;

#[derive(Args)]
pub struct CreateArgs {
    /// Review title (default: the title-cased current branch)
    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// Reviewers to add, matched against display names, usernames, and team
    /// names; an integer adds that many random reviewers
    #[arg(long = "reviewers", short = 'r')]
    pub reviewers: Vec<String>,

    /// The source branch to create the pull request from (default: the
    /// current branch)
    #[arg(long, short = 's', alias = "source-branch")]
    pub source: Option<String>,

    /// The destination branch to create the pull request to
    #[arg(long, short = 'd', alias = "destination-branch")]
    pub destination: Option<String>,

    /// The owner of the repository
    #[arg(long, short = 'o')]
    pub owner: Option<String>,

    /// Summary placed under a "### Summary:" header (markdown allowed)
    #[arg(long, alias = "desc")]
    pub summary: Vec<String>,

    /// Force markup checklists on or off, overriding the change analysis
    #[arg(long)]
    pub jsx: Option<bool>,

    /// Resolve everything but do not create the pull request
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: CreateArgs, json: bool) -> anyhow::Result<()> {
    let config = Config::load(true).context("failed to load configuration")?;
    let bitbucket_auth = config.bitbucket()?.clone();

    let directory = std::env::current_dir().context("cannot resolve working directory")?;
    let owner = args
        .owner
        .or_else(|| config.owner.clone())
        .context("no owner given: pass --owner or set it in the config")?;
    let destination = args
        .destination
        .or_else(|| config.destination.clone())
        .unwrap_or_else(|| "master".to_string());

    let runner = SystemRunner;
    let bitbucket = BitbucketClient::new(bitbucket_auth.clone());
    let jira = config.jira.clone().map(JiraClient::new);
    let mut resolver = ReviewerResolver::new(
        config
            .teams_url
            .clone()
            .unwrap_or_else(|| DEFAULT_TEAMS_URL.to_string()),
    );
    let mut sampler = ThreadRngSampler;
    let mut registry = ChecklistRegistry::with_defaults();

    let params = CreateParams {
        directory,
        title: args.title,
        reviewers: args.reviewers,
        source_branch: args.source,
        destination_branch: destination,
        owner,
        summary: args.summary,
        jsx: args.jsx,
        exclude_username: Some(bitbucket_auth.username),
        dry_run: args.dry_run,
    };

    let report = assemble::create_pull_request(
        &runner,
        &bitbucket,
        jira.as_ref(),
        &mut resolver,
        &mut sampler,
        &mut registry,
        &params,
    )?;

    if json {
        return print_json(&report);
    }
    print_report(&report);
    Ok(())
}

fn print_report(report: &CreateReport) {
    if report.dry_run {
        println!(
            "Would have created pull request '{}' ({} -> {})",
            report.title, report.source_branch, report.destination_branch
        );
        print_reviewers("Reviewers:", &report.reviewers);
        if !report.checklists.is_empty() {
            println!("Would have added the following checklists:");
            for checklist in &report.checklists {
                println!("{}", checklist.text);
            }
        }
        return;
    }

    match &report.pull_request.url {
        Some(url) => println!("Created PR {url}"),
        None => println!("Created PR #{}", report.pull_request.id),
    }
    print_reviewers("Invited reviewers:", &report.reviewers);
    if !report.checklists.is_empty() {
        println!("Added checklists:");
        for checklist in &report.checklists {
            println!("  - {}", checklist.name);
        }
    }
}

fn print_reviewers(header: &str, names: &[String]) {
    if names.is_empty() {
        return;
    }
    println!("{header}");
    for name in names {
        println!("  - {name}");
    }
}
