// `a2actl logs`: prints a task's message log (the Message Log, not the
// authoritative status - see `a2a_core::Task::status`).

use anyhow::Result;
use clap::Args;

use crate::client::GatewayClient;
use crate::output;

#[derive(Debug, Args)]
pub struct LogsArgs {
    pub task_id: String,

    /// Gateway base URL
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    pub server: String,
}

pub async fn execute(args: LogsArgs) -> Result<()> {
    let client = GatewayClient::new(args.server);
    let messages = client.get_messages(&args.task_id).await?;
    output::message_log(&messages);
    Ok(())
}
