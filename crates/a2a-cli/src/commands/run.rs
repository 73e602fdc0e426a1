// `a2actl run`: submits a workflow against a fully in-process runtime and
// drives it to completion in the same process, printing progress as it
// happens. No server required - this is the one-shot / demo path.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, Value};
use tokio_stream::StreamExt;

use a2a_runtime::progress::ProgressEvent;

use crate::{output, runtime};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Workflow to run (e.g. full_import, quick_import)
    #[arg(long, default_value = "full_import")]
    pub workflow: String,

    /// Bookmark archive to import (Netscape HTML or JSON export)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Owning user ID
    #[arg(long, default_value = "local")]
    pub user_id: String,

    /// Suppress per-stage progress lines, print only the final result
    #[arg(long)]
    pub quiet: bool,
}

pub async fn execute(args: RunArgs) -> Result<()> {
    let file_content = match &args.file {
        Some(path) => {
            Some(std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?)
        }
        None => None,
    };

    let rt = runtime::build_in_memory();

    let mut context = Map::new();
    context.insert("userId".into(), Value::from(args.user_id.clone()));
    context.insert("importId".into(), Value::from(uuid::Uuid::new_v4().to_string()));
    if let Some(content) = file_content {
        context.insert("fileContent".into(), Value::from(content));
    }

    let task_id = rt.manager.submit(&args.workflow, context, Map::new(), &args.user_id).await?;
    output::print_info(&format!("submitted task {task_id} ({})", args.workflow));

    if !args.quiet {
        let task = rt.manager.get_task(&task_id).await?;
        let mut stream = rt.progress.subscribe(task);
        tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                match event {
                    ProgressEvent::Update(msg) => println!("  {}", msg.content),
                    ProgressEvent::Terminal(_) => break,
                    ProgressEvent::Snapshot(_) => {}
                }
            }
        });
    }

    rt.manager.run_to_completion(&task_id).await;

    let task = rt.manager.get_task(&task_id).await?;
    let artifacts = rt.manager.get_artifacts(&task_id, None, None).await?;
    println!();
    output::task_detail(&task, &artifacts);

    if task.status == a2a_core::TaskStatus::Failed {
        anyhow::bail!("workflow failed: {}", task.error_message.unwrap_or_default());
    }
    Ok(())
}
