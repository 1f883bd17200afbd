use clap::{Parser, Subcommand};
use pagegate::Role;
use std::path::PathBuf;

/// `pagegate` - dashboard page and tool access decisions.
#[derive(Parser, Debug)]
#[command(name = "pagegate")]
#[command(version = "0.1.0")]
#[command(about = "Dashboard access decisions and override sync.", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.pagegate/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level regardless of config
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate page and tool access for one subject
    Decide {
        /// Dashboard path to evaluate
        path: String,

        /// Subject role (admin, member); omit for an unknown role
        #[arg(long)]
        role: Option<Role>,

        /// Page granted by the plan (repeatable); omit for an unrestricted plan
        #[arg(long = "plan-page")]
        plan_pages: Vec<String>,

        /// Treat the plan as granting no pages at all
        #[arg(long, conflicts_with = "plan_pages")]
        empty_plan: bool,

        /// Merged add override (repeatable)
        #[arg(long = "add")]
        adds: Vec<String>,

        /// Merged remove override (repeatable)
        #[arg(long = "remove")]
        removes: Vec<String>,

        /// Subject is globally blocked (trial expired)
        #[arg(long)]
        blocked: bool,

        /// Disabled tools as PAGE=tool1,tool2 (repeatable)
        #[arg(long = "disable-tools")]
        disabled_tools: Vec<String>,

        /// Tool to check on the page
        #[arg(long)]
        tool: Option<String>,
    },

    /// Print the normalized tool id list for raw operator input
    Sanitize {
        /// Comma or newline separated tool ids
        raw: String,
    },

    /// Persist a subject override file through the sync pipeline
    Push {
        /// TOML file with [subject] and [overrides] tables
        file: PathBuf,

        /// Skip the auto-save confirmation
        #[arg(short, long)]
        yes: bool,
    },
}
