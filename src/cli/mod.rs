//! CLI argument definitions for sitelog.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Sitelog - log jobsite work and produce estimates.
///
/// Start with `slg job add` to record a work site, then `slg task add` to
/// log entries under it. `slg export` writes the printable estimate.
#[derive(Parser, Debug)]
#[command(name = "slg")]
#[command(author, version, about = "A CLI tool for logging jobsite work and producing estimates", long_about = None)]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (", env!("SLG_GIT_COMMIT"), " ", env!("SLG_BUILD_TIMESTAMP"), ")"
))]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Keep data in <path> instead of the default data directory.
    /// Can also be set via the SLG_DATA_DIR environment variable.
    #[arg(short = 'D', long = "data-dir", global = true, env = "SLG_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Job management commands
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },

    /// Work entry commands
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Show a job and its logged entries
    Show {
        /// Job ID (e.g., job-a1b2c3d4)
        id: String,
    },

    /// Show job totals: estimated time, material list, tools needed
    Summary {
        /// Job ID
        id: String,
    },

    /// Write the plain-text estimate for a job
    Export {
        /// Job ID
        id: String,

        /// Directory to write the estimate file into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

/// Job management commands
#[derive(Subcommand, Debug)]
pub enum JobCommands {
    /// Create a new job
    Add {
        /// Job address or site name
        address: String,

        /// Client name
        #[arg(short, long)]
        client: Option<String>,
    },

    /// Remove a job and all its entries
    Rm {
        /// Job ID
        id: String,
    },

    /// List all jobs, newest first
    List,
}

/// Work entry commands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Record a new entry under a job
    Add {
        /// Owning job ID
        job_id: String,

        /// Entry title
        title: String,

        /// Free-text time estimate (e.g. "2 hours", "1h 30m")
        #[arg(short = 't', long = "time")]
        time: Option<String>,

        /// Notes describing the work
        #[arg(short = 'n', long = "notes")]
        notes: Option<String>,

        /// Materials, comma separated (e.g. "Paint, Tape, Primer")
        #[arg(short = 'm', long = "materials")]
        materials: Option<String>,

        /// Tools, comma separated (e.g. "Brush, Roller, Ladder")
        #[arg(long = "tools")]
        tools: Option<String>,

        /// Photo file to attach (repeatable); photos are downscaled and
        /// re-encoded before storage
        #[arg(short = 'p', long = "photo")]
        photos: Vec<PathBuf>,
    },

    /// Remove an entry from a job
    Rm {
        /// Owning job ID
        job_id: String,

        /// Entry ID (e.g., tsk-a1b2c3d4)
        task_id: String,
    },
}
