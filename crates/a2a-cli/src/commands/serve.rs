// `a2actl serve`: starts the HTTP gateway over either an ephemeral
// in-memory runtime or a durable sled-backed Task Store.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use a2a_gateway::{AppState, GatewayConfig};
use a2a_store::{InMemoryArtifactStore, InMemoryMessageLog, SledTaskStore};

use crate::{output, runtime};

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to bind (host:port)
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub bind: String,

    /// Directory for the durable sled task store. Omit for an in-memory
    /// store that is lost on restart.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Disable permissive CORS
    #[arg(long)]
    pub no_cors: bool,
}

pub async fn execute(args: ServeArgs) -> Result<()> {
    let (host, port) = args
        .bind
        .rsplit_once(':')
        .ok_or_else(|| anyhow::anyhow!("--bind must be host:port, got '{}'", args.bind))?;

    let rt = match &args.data_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let tasks = Arc::new(SledTaskStore::open(dir.join("tasks.sled"))?);
            runtime::build(tasks, Arc::new(InMemoryArtifactStore::new()), Arc::new(InMemoryMessageLog::new()))
        }
        None => runtime::build_in_memory(),
    };

    let config = GatewayConfig {
        host: host.to_string(),
        port: port.parse()?,
        cors: !args.no_cors,
        ..GatewayConfig::default()
    };

    let state = AppState::new(rt.manager, rt.progress, rt.agents, rt.workflows);
    output::print_info(&format!("starting a2a-gateway on {}", config.bind_addr()));
    a2a_gateway::serve(state, config).await
}
