//! # CyberShield CLI Module
//!
//! This module implements the CLI interface for CyberShield.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Initialize a new database
//! - `compact` - Compact the database file
//! - `stats` - Show dashboard statistics
//! - `user add` / `user show` / `user update` / `user list` - Manage users
//! - `report` - Report an incident
//! - `list` - List incidents
//! - `show` - Show one incident
//! - `escalate` - Escalate one of your incidents to emergency
//! - `set-status` - Change an incident's status
//! - `forward` - Forward an incident to law enforcement
//! - `severity` - Set an incident's severity
//!
//! Commands that act on behalf of a user take `--as <user-id>`.

mod commands;

use crate::error::AppError;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// CyberShield - cybercrime incident reporting and triage
#[derive(Parser, Debug)]
#[command(name = "cybershield")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging (unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the incident database
    #[arg(short = 'D', long, global = true, default_value = "cybershield.db")]
    pub database: PathBuf,

    /// Storage backend
    #[arg(short = 'B', long, global = true, value_enum, default_value_t = Backend::Redb)]
    pub backend: Backend,

    /// Path to a TOML config file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// User id to act as
    #[arg(long = "as", global = true, value_name = "USER_ID")]
    pub acting_as: Option<String>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Volatile in-process maps
    Memory,
    /// redb ACID database file
    Redb,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Compact the database file
    Compact,

    /// Show dashboard statistics (administrator)
    Stats,

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Report a new incident
    Report {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        description: String,

        /// phishing, malware, ransomware, data_breach, identity_theft,
        /// financial_fraud, social_engineering, other
        #[arg(short = 'k', long)]
        category: String,

        /// low, medium, high, emergency
        #[arg(short, long, default_value = "medium")]
        severity: String,
    },

    /// List incidents (all for administrators, own for reporters)
    List {
        /// Comma-separated statuses
        #[arg(long)]
        status: Option<String>,

        /// Comma-separated severities
        #[arg(long)]
        severity: Option<String>,

        /// Comma-separated categories
        #[arg(long)]
        category: Option<String>,

        /// Text search over title and description
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one incident
    Show { id: String },

    /// Escalate one of your incidents to emergency
    Escalate { id: String },

    /// Change an incident's status (administrator)
    SetStatus {
        id: String,

        /// pending, reviewing, resolved, forwarded_to_le, closed
        status: String,

        #[arg(long)]
        notes: Option<String>,

        /// Assign to this user id
        #[arg(long)]
        assign: Option<String>,

        /// Law-enforcement reference (required for forwarded_to_le)
        #[arg(long)]
        reference: Option<String>,
    },

    /// Forward an incident to law enforcement (administrator)
    Forward { id: String, reference: String },

    /// Set an incident's severity (administrator)
    Severity { id: String, severity: String },
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Register a user
    Add {
        id: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,

        /// Register as administrator (requires --badge)
        #[arg(long)]
        admin: bool,

        #[arg(long)]
        badge: Option<String>,

        #[arg(long)]
        department: Option<String>,
    },

    /// Show a user profile
    Show { id: String },

    /// Change a user's name or email (self or administrator)
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },

    /// List all users (administrator)
    List,
}

/// Default log filter when `RUST_LOG` is unset.
const LOG_FILTER: &str = "cybershield=info,tower_http=debug";
const VERBOSE_LOG_FILTER: &str = "cybershield=debug,cybershield_core=debug,tower_http=debug";

impl Cli {
    /// The `EnvFilter` directive used when `RUST_LOG` is unset.
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            VERBOSE_LOG_FILTER
        } else {
            LOG_FILTER
        }
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let ctx = Context {
        database: cli.database,
        backend: cli.backend,
        config: cli.config,
        acting_as: cli.acting_as,
        json_mode: cli.json_mode,
    };

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(&ctx, host, port).await,
        Some(Commands::Init { force }) => cmd_init(&ctx, force),
        Some(Commands::Compact) => cmd_compact(&ctx),
        Some(Commands::Stats) => cmd_stats(&ctx),
        Some(Commands::User { command }) => match command {
            UserCommands::Add {
                id,
                email,
                name,
                admin,
                badge,
                department,
            } => cmd_user_add(&ctx, id, email, name, admin, badge, department),
            UserCommands::Show { id } => cmd_user_show(&ctx, &id),
            UserCommands::Update { id, name, email } => cmd_user_update(&ctx, &id, name, email),
            UserCommands::List => cmd_user_list(&ctx),
        },
        Some(Commands::Report {
            title,
            description,
            category,
            severity,
        }) => cmd_report(&ctx, title, description, &category, &severity),
        Some(Commands::List {
            status,
            severity,
            category,
            search,
            limit,
        }) => cmd_list(&ctx, status, severity, category, search, limit),
        Some(Commands::Show { id }) => cmd_show(&ctx, &id),
        Some(Commands::Escalate { id }) => cmd_escalate(&ctx, &id),
        Some(Commands::SetStatus {
            id,
            status,
            notes,
            assign,
            reference,
        }) => cmd_set_status(&ctx, &id, &status, notes, assign, reference),
        Some(Commands::Forward { id, reference }) => cmd_forward(&ctx, &id, &reference),
        Some(Commands::Severity { id, severity }) => cmd_severity(&ctx, &id, &severity),
        None => cmd_summary(&ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_report_with_global_flags() {
        let cli = Cli::try_parse_from([
            "cybershield",
            "--as",
            "U1",
            "-B",
            "memory",
            "report",
            "-t",
            "Fake bank email",
            "-d",
            "Asked for my PIN",
            "-k",
            "phishing",
        ])
        .expect("parse");

        assert_eq!(cli.acting_as.as_deref(), Some("U1"));
        assert_eq!(cli.backend, Backend::Memory);
        match cli.command {
            Some(Commands::Report {
                category, severity, ..
            }) => {
                assert_eq!(category, "phishing");
                assert_eq!(severity, "medium");
            }
            other => unreachable!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn verbose_raises_log_level() {
        let quiet = Cli::try_parse_from(["cybershield", "stats"]).expect("parse");
        assert_eq!(quiet.log_filter(), LOG_FILTER);

        let verbose = Cli::try_parse_from(["cybershield", "-v", "stats"]).expect("parse");
        assert!(verbose.log_filter().starts_with("cybershield=debug"));
    }

    #[test]
    fn parses_user_update() {
        let cli = Cli::try_parse_from([
            "cybershield",
            "--as",
            "U1",
            "user",
            "update",
            "U1",
            "--email",
            "new@example.com",
        ])
        .expect("parse");
        match cli.command {
            Some(Commands::User {
                command: UserCommands::Update { id, name, email },
            }) => {
                assert_eq!(id, "U1");
                assert!(name.is_none());
                assert_eq!(email.as_deref(), Some("new@example.com"));
            }
            other => unreachable!("unexpected command: {:?}", other),
        }
    }
}
