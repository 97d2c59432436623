//! Sitelog CLI - log jobsite work and produce estimates.

use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use clap::Parser;
use sitelog::action_log;
use sitelog::cli::{Cli, Commands, JobCommands, TaskCommands};
use sitelog::commands::{self, Output, TaskAddArgs};
use sitelog::config::Config;
use sitelog::store;

fn main() {
    let cli = Cli::parse();
    let config = Config::load();
    let human = cli.human_readable || config.human_output();

    // Determine data dir: --data-dir flag / SLG_DATA_DIR env > config > default
    let data_dir = match resolve_data_dir(cli.data_dir, &config) {
        Ok(dir) => dir,
        Err(e) => {
            report_error(&e, human);
            process::exit(1);
        }
    };

    // Serialize command for logging
    let (cmd_name, args_json) = serialize_command(&cli.command);

    // Execute command
    let start = Instant::now();
    let result = run_command(cli.command, &data_dir, &config, human);
    let duration = start.elapsed().as_millis() as u64;

    // Determine success/error
    let (success, error) = match &result {
        Ok(()) => (true, None),
        Err(e) => (false, Some(e.to_string())),
    };

    // Log the action (silently falls back on errors)
    action_log::log_action(
        &data_dir,
        config.action_log_enabled(),
        &cmd_name,
        args_json,
        success,
        error,
        duration,
    );

    if let Err(e) = result {
        report_error(&e, human);
        process::exit(1);
    }
}

/// Resolve the data directory: explicit flag or env var first, then the
/// config file, then the platform default.
fn resolve_data_dir(explicit: Option<PathBuf>, config: &Config) -> sitelog::Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if let Some(dir) = &config.data_dir {
        return Ok(dir.clone());
    }
    store::default_data_dir()
}

fn run_command(
    command: Commands,
    data_dir: &Path,
    config: &Config,
    human: bool,
) -> sitelog::Result<()> {
    let mut ws = commands::open_workspace(data_dir, config);

    match command {
        Commands::Job { command } => match command {
            JobCommands::Add { address, client } => {
                output(&commands::job_add(&mut ws, &address, client.as_deref())?, human);
            }
            JobCommands::Rm { id } => {
                output(&commands::job_rm(&mut ws, &id)?, human);
            }
            JobCommands::List => {
                output(&commands::job_list(&ws), human);
            }
        },
        Commands::Task { command } => match command {
            TaskCommands::Add {
                job_id,
                title,
                time,
                notes,
                materials,
                tools,
                photos,
            } => {
                let args = TaskAddArgs {
                    title,
                    time,
                    notes,
                    materials,
                    tools,
                    photos,
                };
                output(&commands::task_add(&mut ws, &job_id, args)?, human);
            }
            TaskCommands::Rm { job_id, task_id } => {
                output(&commands::task_rm(&mut ws, &job_id, &task_id)?, human);
            }
        },
        Commands::Show { id } => {
            output(&commands::show(&mut ws, &id)?, human);
        }
        Commands::Summary { id } => {
            output(&commands::job_summary(&ws, &id)?, human);
        }
        Commands::Export { id, out } => {
            output(&commands::export(&ws, &id, &out)?, human);
        }
    }

    Ok(())
}

fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}

fn report_error(e: &sitelog::Error, human: bool) {
    if human {
        eprintln!("Error: {}", e);
    } else {
        eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
    }
}

/// Produce the command name and argument payload for the action log.
fn serialize_command(command: &Commands) -> (String, serde_json::Value) {
    match command {
        Commands::Job { command } => match command {
            JobCommands::Add { address, client } => (
                "job add".to_string(),
                serde_json::json!({ "address": address, "client": client }),
            ),
            JobCommands::Rm { id } => {
                ("job rm".to_string(), serde_json::json!({ "id": id }))
            }
            JobCommands::List => ("job list".to_string(), serde_json::json!({})),
        },
        Commands::Task { command } => match command {
            TaskCommands::Add {
                job_id,
                title,
                time,
                notes,
                materials,
                tools,
                photos,
            } => (
                "task add".to_string(),
                serde_json::json!({
                    "job_id": job_id,
                    "title": title,
                    "time": time,
                    "notes": notes,
                    "materials": materials,
                    "tools": tools,
                    "photos": photos,
                }),
            ),
            TaskCommands::Rm { job_id, task_id } => (
                "task rm".to_string(),
                serde_json::json!({ "job_id": job_id, "task_id": task_id }),
            ),
        },
        Commands::Show { id } => ("show".to_string(), serde_json::json!({ "id": id })),
        Commands::Summary { id } => ("summary".to_string(), serde_json::json!({ "id": id })),
        Commands::Export { id, out } => (
            "export".to_string(),
            serde_json::json!({ "id": id, "out": out }),
        ),
    }
}
