// `a2actl describe`: detailed single-task view including its artifacts.

use anyhow::Result;
use clap::Args;

use crate::client::GatewayClient;
use crate::output;

#[derive(Debug, Args)]
pub struct DescribeArgs {
    pub task_id: String,

    /// Gateway base URL
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    pub server: String,
}

pub async fn execute(args: DescribeArgs) -> Result<()> {
    let client = GatewayClient::new(args.server);
    let task = client.get_task(&args.task_id).await?;
    let artifacts = client.get_artifacts(&args.task_id).await?;
    output::task_detail(&task, &artifacts);
    Ok(())
}
