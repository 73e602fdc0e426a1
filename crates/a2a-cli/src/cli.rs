// a2actl: the command-line surface over the A2A workflow runtime. `run`
// executes a workflow entirely in-process; every other command talks to a
// running `a2actl serve` gateway over HTTP.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{cancel, completion, describe, get, logs, replay, run, serve, submit};
use crate::output;

#[derive(Debug, Parser)]
#[command(name = "a2actl", version, about = "CLI for the A2A bookmark workflow runtime")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a workflow to completion in-process, no server required
    Run(run::RunArgs),
    /// Submit a workflow to a running gateway
    Submit(submit::SubmitArgs),
    /// List tasks, or show one by ID
    Get(get::GetArgs),
    /// Show a task's full detail including artifacts
    Describe(describe::DescribeArgs),
    /// Show a task's message log
    Logs(logs::LogsArgs),
    /// Request cancellation of a running task
    Cancel(cancel::CancelArgs),
    /// Resume a failed or cancelled task
    Replay(replay::ReplayArgs),
    /// Start the HTTP gateway
    Serve(serve::ServeArgs),
    /// Generate shell completion scripts
    Completion {
        #[arg(value_enum)]
        shell: completion::Shell,
    },
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let result = match self.command {
            Commands::Run(args) => run::execute(args).await,
            Commands::Submit(args) => submit::execute(args).await,
            Commands::Get(args) => get::execute(args).await,
            Commands::Describe(args) => describe::execute(args).await,
            Commands::Logs(args) => logs::execute(args).await,
            Commands::Cancel(args) => cancel::execute(args).await,
            Commands::Replay(args) => replay::execute(args).await,
            Commands::Serve(args) => serve::execute(args).await,
            Commands::Completion { shell } => completion::execute(shell),
        };

        if let Err(err) = &result {
            output::print_error(&err.to_string());
        }
        result
    }
}
