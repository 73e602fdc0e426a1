// `a2actl get`: lists tasks known to a running gateway, optionally filtered
// by status, or prints a single task's status row when given an ID.

use anyhow::Result;
use clap::Args;

use crate::client::GatewayClient;
use crate::output;

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Task ID to look up. Omit to list all tasks.
    pub task_id: Option<String>,

    /// Filter by status (pending, running, completed, failed, cancelled)
    #[arg(long)]
    pub status: Option<String>,

    /// Gateway base URL
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    pub server: String,
}

pub async fn execute(args: GetArgs) -> Result<()> {
    let client = GatewayClient::new(args.server);

    let tasks = match &args.task_id {
        Some(id) => vec![client.get_task(id).await?],
        None => client.list_tasks(args.status.as_deref()).await?,
    };

    output::task_table(&tasks);
    Ok(())
}
