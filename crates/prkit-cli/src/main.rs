mod cmd;
mod output;

use clap::{Parser, Subcommand};
use prkit_core::PrkitError;

#[derive(Parser)]
#[command(
    name = "prkit",
    about = "Developer workflow automation: create pull requests with reviewers and checklists",
    version,
    propagate_version = true
)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new pull request
    Create(cmd::create::CreateArgs),
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Create(args) => cmd::create::run(args, cli.json),
    };

    if let Err(e) = result {
        // A failed external command already captured its own output; show
        // that instead of the error chain.
        match e.downcast_ref::<PrkitError>() {
            Some(PrkitError::CommandFailed { output, .. }) => eprintln!("{output}"),
            _ => eprintln!("error: {e:#}"),
        }
        std::process::exit(1);
    }
}
