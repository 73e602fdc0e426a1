// `a2actl replay`: resets a failed or cancelled task back to pending and
// resubmits it for execution from its last persisted stage.

use anyhow::Result;
use clap::Args;

use crate::client::GatewayClient;
use crate::output;

#[derive(Debug, Args)]
pub struct ReplayArgs {
    pub task_id: String,

    /// Gateway base URL
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    pub server: String,
}

pub async fn execute(args: ReplayArgs) -> Result<()> {
    let client = GatewayClient::new(args.server);
    let task = client.replay(&args.task_id).await?;
    output::print_success(&format!("replaying task {} from step {}", task.id, task.current_step));
    Ok(())
}
