// Terminal rendering: status-colored tables for task/artifact/message
// listings plus a handful of plain status lines. Kept deliberately plain -
// this is a task-status CLI, not a report generator.

use colored::{Color, Colorize};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use a2a_core::{Artifact, Message, Task, TaskStatus};

fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Pending => Color::Yellow,
        TaskStatus::Running => Color::Cyan,
        TaskStatus::Completed => Color::Green,
        TaskStatus::Failed => Color::Red,
        TaskStatus::Cancelled => Color::BrightBlack,
    }
}

fn status_label(status: TaskStatus) -> String {
    format!("{status:?}").to_lowercase()
}

pub fn task_table(tasks: &[Task]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "WORKFLOW", "STATUS", "AGENT", "PROGRESS", "UPDATED"]);

    for task in tasks {
        table.add_row(vec![
            Cell::new(short_id(&task.id)),
            Cell::new(&task.workflow_type),
            Cell::new(status_label(task.status)).fg(to_comfy(status_color(task.status))),
            Cell::new(task.current_agent.as_deref().unwrap_or("-")),
            Cell::new(format!("{}%", task.progress_percent())),
            Cell::new(task.updated.to_rfc3339()),
        ]);
    }

    println!("{table}");
}

pub fn task_detail(task: &Task, artifacts: &[Artifact]) {
    println!("{}          {}", "ID:".bold(), task.id);
    println!("{}        {}", "Type:".bold(), task.task_type);
    println!("{}    {}", "Workflow:".bold(), task.workflow_type);
    println!("{}      {}", "Status:".bold(), status_label(task.status).color(status_color(task.status)));
    println!("{}     {}", "User ID:".bold(), task.user_id);
    println!(
        "{}       {} / {} ({}%)",
        "Stage:".bold(),
        task.current_step,
        task.total_steps,
        task.progress_percent()
    );
    println!(
        "{}       {}",
        "Agent:".bold(),
        task.current_agent.as_deref().unwrap_or("-")
    );
    println!("{}     {}", "Created:".bold(), task.created.to_rfc3339());
    println!("{}     {}", "Updated:".bold(), task.updated.to_rfc3339());
    if let Some(err) = &task.error_message {
        println!("{}       {}", "Error:".bold().red(), err.red());
    }
    println!("{}   {:?}", "Pipeline:".bold(), task.workflow_agents);

    if !artifacts.is_empty() {
        println!("\n{}", "Artifacts:".bold());
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["AGENT", "TYPE", "CHECKSUM", "CREATED"]);
        for artifact in artifacts {
            table.add_row(vec![
                Cell::new(&artifact.agent_type),
                Cell::new(&artifact.artifact_type),
                Cell::new(short_id(&artifact.checksum)),
                Cell::new(artifact.created.to_rfc3339()),
            ]);
        }
        println!("{table}");
    }
}

pub fn message_log(messages: &[Message]) {
    for message in messages {
        let tag = format!("{:?}", message.message_type).to_lowercase();
        println!("[{}] {:<8} {}", message.timestamp.to_rfc3339(), tag, message.content);
    }
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn to_comfy(color: Color) -> comfy_table::Color {
    match color {
        Color::Yellow => comfy_table::Color::Yellow,
        Color::Cyan => comfy_table::Color::Cyan,
        Color::Green => comfy_table::Color::Green,
        Color::Red => comfy_table::Color::Red,
        _ => comfy_table::Color::DarkGrey,
    }
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "›".cyan(), message);
}
