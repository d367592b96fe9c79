//! # Mezuro CLI Module
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Initialize a new database
//! - `status` - Show record counts
//! - `compact` - Compact the database file
//! - `collectors` - List the metric collectors the server would offer
//! - `user add` - Register a user and print their token
//! - `configuration add|list` - Kalibro configurations
//! - `reading-group add|list` - Reading groups
//! - `reading add|list` - Readings of a reading group

mod commands;

use crate::collector::CollectorError;
use crate::config::{AppConfig, Backend, ConfigError};
use clap::{Parser, Subcommand};
use mezuro_core::MezuroError;
use std::path::PathBuf;
use thiserror::Error;

pub use commands::*;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Catalog(#[from] MezuroError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Collector(#[from] CollectorError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Usage(String),
}

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Mezuro - metric configuration server
///
/// Kalibro configurations, their metric configurations and the ranges that
/// turn metric values into readings.
#[derive(Parser, Debug)]
#[command(name = "mezuro")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (default: ./mezuro.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the database (overrides the config file)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend (overrides the config file)
    #[arg(short = 'B', long, global = true, value_enum)]
    pub backend: Option<Backend>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Initialize a new empty database
    Init {
        /// Overwrite an existing database
        #[arg(short, long)]
        force: bool,
    },

    /// Show record counts
    Status,

    /// Compact the database file
    Compact,

    /// List the configured metric collectors
    Collectors,

    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Manage kalibro configurations
    Configuration {
        #[command(subcommand)]
        action: ConfigurationCommand,
    },

    /// Manage reading groups
    ReadingGroup {
        #[command(subcommand)]
        action: ReadingGroupCommand,
    },

    /// Manage readings
    Reading {
        #[command(subcommand)]
        action: ReadingCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Register a user; the token is printed once
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigurationCommand {
    /// Create a kalibro configuration
    Add {
        /// Email of the owning user
        #[arg(long)]
        owner_email: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Visible to everyone
        #[arg(long)]
        public: bool,
    },
    /// List kalibro configurations
    List,
}

#[derive(Subcommand, Debug)]
pub enum ReadingGroupCommand {
    /// Create a reading group
    Add {
        /// Email of the owning user
        #[arg(long)]
        owner_email: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List reading groups
    List,
}

#[derive(Subcommand, Debug)]
pub enum ReadingCommand {
    /// Add a reading to a reading group
    Add {
        /// Email of the reading group's owner
        #[arg(long)]
        owner_email: String,
        /// Reading group id
        #[arg(long)]
        group: u64,
        #[arg(long)]
        label: String,
        #[arg(long, allow_negative_numbers = true)]
        grade: f64,
        /// Six hex digits, with or without '#'
        #[arg(long)]
        color: String,
    },
    /// List the readings of a reading group
    List {
        #[arg(long)]
        group: u64,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve configuration: file, then environment, then flags.
pub fn resolve_config(cli: &Cli) -> Result<AppConfig, CliError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(path) = &cli.database {
        config.database.path = path.clone();
    }
    if let Some(backend) = cli.backend {
        config.database.backend = backend;
    }
    Ok(config)
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), CliError> {
    let mut config = resolve_config(&cli)?;
    let json_mode = cli.json_mode;
    let db = &config.database;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_server(&config).await
        }
        Some(Commands::Init { force }) => cmd_init(db, force),
        Some(Commands::Status) | None => cmd_status(db, json_mode),
        Some(Commands::Compact) => cmd_compact(db),
        Some(Commands::Collectors) => cmd_collectors(&config.collectors, json_mode).await,
        Some(Commands::User { action }) => match action {
            UserCommand::Add { name, email } => cmd_user_add(db, &name, &email, json_mode),
        },
        Some(Commands::Configuration { action }) => match action {
            ConfigurationCommand::Add {
                owner_email,
                name,
                description,
                public,
            } => cmd_configuration_add(db, &owner_email, &name, &description, public, json_mode),
            ConfigurationCommand::List => cmd_configuration_list(db, json_mode),
        },
        Some(Commands::ReadingGroup { action }) => match action {
            ReadingGroupCommand::Add {
                owner_email,
                name,
                description,
            } => cmd_reading_group_add(db, &owner_email, &name, &description, json_mode),
            ReadingGroupCommand::List => cmd_reading_group_list(db, json_mode),
        },
        Some(Commands::Reading { action }) => match action {
            ReadingCommand::Add {
                owner_email,
                group,
                label,
                grade,
                color,
            } => cmd_reading_add(db, &owner_email, group, &label, grade, &color, json_mode),
            ReadingCommand::List { group } => cmd_reading_list(db, group, json_mode),
        },
    }
}
