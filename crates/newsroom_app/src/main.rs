//! `newsroom`: fetch container-ecosystem news, turn it into posts and publish
//! each story to WordPress at most once.

mod commands;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use newsroom_logging::news_error;

use crate::logging::LogDestination;

#[derive(Parser)]
#[command(name = "newsroom")]
#[command(about = "News ingest and publishing pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding snapshots, posts, images and the publish ledger
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    /// RON file with sources and selector overrides
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Also write ./newsroom.log
    #[arg(long, global = true)]
    log_file: bool,

    /// Skip politeness delays between requests
    #[arg(long, global = true)]
    no_delay: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Read every source and write per-category snapshots
    Fetch,
    /// Build posts from the latest snapshots
    Generate,
    /// Publish generated posts that are not in the ledger yet
    Publish,
    /// Fetch, generate and publish in one go
    Run,
}

impl Command {
    fn needs_credentials(self) -> bool {
        matches!(self, Command::Publish | Command::Run)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let destination = if cli.log_file {
        LogDestination::Both
    } else {
        LogDestination::Terminal
    };
    logging::initialize(destination, newsroom_logging::run_level(cli.verbose));

    // A missing .env is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();

    match commands::execute(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            news_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
