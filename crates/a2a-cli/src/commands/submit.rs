// `a2actl submit`: submits a workflow to a running gateway and returns
// immediately with the assigned task ID.

use anyhow::Result;
use clap::Args;
use serde_json::Map;

use crate::client::GatewayClient;
use crate::output;

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Workflow to run (e.g. full_import, quick_import)
    pub workflow: String,

    /// Owning user ID
    #[arg(long, default_value = "local")]
    pub user_id: String,

    /// Gateway base URL
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    pub server: String,
}

pub async fn execute(args: SubmitArgs) -> Result<()> {
    let client = GatewayClient::new(args.server);
    let task_id = client.submit(&args.workflow, Map::new(), &args.user_id).await?;
    output::print_success(&format!("task submitted: {task_id}"));
    Ok(())
}
