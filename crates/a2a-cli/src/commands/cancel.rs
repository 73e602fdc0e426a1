// `a2actl cancel`: requests cooperative cancellation of a running task.

use anyhow::Result;
use clap::Args;

use crate::client::GatewayClient;
use crate::output;

#[derive(Debug, Args)]
pub struct CancelArgs {
    pub task_id: String,

    /// Gateway base URL
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    pub server: String,
}

pub async fn execute(args: CancelArgs) -> Result<()> {
    let client = GatewayClient::new(args.server);
    client.cancel(&args.task_id).await?;
    output::print_success(&format!("cancellation requested for {}", args.task_id));
    Ok(())
}
