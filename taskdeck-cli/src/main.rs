use std::io::{self, Write};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use clap::Parser;
use tracing::debug;

use taskdeck_core::{SystemClock, TaskBackend, TaskDraft, TaskFilter, TaskStore};

use crate::cli::{Cli, Commands};
use crate::display::{DisplayMode, format_summary, format_task, supports_color};
use crate::error::{CliError, Result};
use crate::storage::JsonStorage;

mod cli;
mod config;
mod display;
mod error;
mod logging;
mod server;
mod storage;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg: config::Config = confy::load("taskdeck", None)?;
    logging::init(&cfg.log_level);

    let storage = JsonStorage::new(cfg.tasks_path());
    debug!(path = %storage.path().display(), "using task file");

    // Recovery replaces the file wholesale, so it runs before the store loads it
    if let Commands::Recover { force } = cli.command {
        if !storage.backup_exists() {
            return Err(CliError::storage("No backup file found"));
        }

        if !force && !confirm("Restore tasks from backup? Current tasks will be replaced.")? {
            println!("Cancelled.");
            return Ok(());
        }

        let backup_collection = storage.recover()?;
        storage.save(&backup_collection)?;
        println!("Recovered {} tasks from backup.", backup_collection.len());
        return Ok(());
    }

    let store = TaskStore::open(storage, Arc::new(SystemClock))?;

    match cli.command {
        Commands::Add {
            title,
            description,
            category,
            priority,
            due,
        } => {
            let mut draft = TaskDraft::new(title.join(" "), description);
            draft.category = category;
            draft.priority = priority.map(Into::into);
            draft.due_date = due;

            let task = store.create(&draft)?;

            match task.due_date {
                Some(date) => println!(
                    "Task #{} added: {} (due: {})",
                    task.id,
                    task.title,
                    date.format("%Y-%m-%d")
                ),
                None => println!("Task #{} added: {}", task.id, task.title),
            }
        }

        Commands::List {
            category,
            priority,
            status,
            search,
            sort,
            compact,
            detailed,
            no_color,
        } => {
            let filter = TaskFilter::new()
                .with_category(category)
                .with_priority(priority.map(Into::into))
                .with_status(status.into())
                .with_search(search)
                .sort_by(sort.into());

            let result = store.query(&filter)?;
            let use_color = !no_color && supports_color();

            if result.items.is_empty() {
                println!("No tasks found.");
            } else {
                let mode = if compact {
                    DisplayMode::Compact
                } else if detailed {
                    DisplayMode::Detailed
                } else {
                    DisplayMode::Default
                };

                let today = result.as_of.date_naive();
                for view in result.views() {
                    println!("{}", format_task(&view, today, mode, use_color));
                }
            }

            println!();
            println!("{}", format_summary(&result.stats, use_color));
        }

        Commands::Show { id } => {
            let view = store.view(id)?;
            let today = store.now().date_naive();
            println!(
                "{}",
                format_task(&view, today, DisplayMode::Detailed, supports_color())
            );
        }

        Commands::Edit {
            id,
            title,
            description,
            category,
            priority,
            due,
        } => {
            if title.is_none()
                && description.is_none()
                && category.is_none()
                && priority.is_none()
                && due.is_none()
            {
                return Err(CliError::validation(
                    "edit",
                    "At least one of --title, --desc, --category, --priority or --due must be provided",
                ));
            }

            // An update replaces every field, so start from the current values
            let current = store.get(id)?;
            let due_date = match due {
                Some(input) if input.trim().eq_ignore_ascii_case("none") => None,
                Some(input) => Some(input),
                None => current.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
            };

            let draft = TaskDraft {
                title: title.unwrap_or(current.title),
                description: description.unwrap_or(current.description),
                category: Some(category.unwrap_or(current.category)),
                priority: Some(priority.map_or(current.priority, Into::into)),
                due_date,
            };

            let task = store.update(id, &draft)?;
            println!("Updated task #{}: {}", task.id, task.title);
            if let Some(date) = task.due_date {
                println!("  Due: {}", date.format("%Y-%m-%d"));
            }
        }

        Commands::Toggle { id } => {
            let task = store.toggle(id)?;
            let status = if task.completed { "done" } else { "open" };
            println!("Marked task #{} as {}: {}", task.id, status, task.title);
        }

        Commands::Remove { id } => {
            let removed_task = store.delete(id)?;
            println!("Removed: {}", removed_task.title);
        }

        Commands::Clear { completed, force } => {
            if !completed {
                return Err(CliError::validation(
                    "clear",
                    "Use --completed to remove completed tasks",
                ));
            }

            let count = store.stats().completed;
            if count == 0 {
                println!("No completed tasks to remove.");
                return Ok(());
            }

            if !force && !confirm(&format!("Remove {} completed task(s)?", count))? {
                println!("Cancelled.");
                return Ok(());
            }

            let removed = store.delete_all_completed()?;
            println!("Removed {} completed task(s).", removed);
        }

        Commands::Categories => {
            let categories = store.categories();
            if categories.is_empty() {
                println!("No categories yet.");
            }
            for category in categories {
                println!("{}", category);
            }
        }

        Commands::Stats { json } => {
            let stats = store.stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("{}", format_summary(&stats, supports_color()));
            }
        }

        Commands::Serve { host, port } => {
            let host = host.unwrap_or(cfg.server.host);
            let port = port.unwrap_or(cfg.server.port);
            let ip: IpAddr = host
                .parse()
                .map_err(|_| CliError::validation("host", format!("'{}' is not an IP address", host)))?;

            server::serve(Arc::new(store), SocketAddr::new(ip, port)).await?;
        }

        // Handled before the store is opened
        Commands::Recover { .. } => {}
    }

    Ok(())
}

/// Ask user for confirmation
fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().eq_ignore_ascii_case("y"))
}
