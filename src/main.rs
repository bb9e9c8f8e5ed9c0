use anyhow::Result;
use clap::{Parser, Subcommand};

use mmpctl::cli::{self, OutputFormat};
use mmpctl::config;
use mmpctl::console;
use mmpctl::session::SessionStore;

#[derive(Debug, Parser)]
#[command(name = "mmpctl")]
#[command(about = "Terminal admin console for the Multi-Management Platform")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sign in and persist the session
    Login {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign out and clear the persisted session
    Logout,
    /// Show the current session role
    Whoami,
    /// Open the interactive dashboard console
    Console,
    /// List the systems exposed by the backend
    Systems {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Render a system's analytics charts
    Analytics {
        system: String,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Query resource records of one type within a system
    Query {
        system: String,
        /// Resource type, e.g. student
        rtype: String,
        /// JSON filter with dot-addressed keys, e.g. {"data.name": "Alice"}
        #[arg(long, default_value = "")]
        filter: String,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Create a resource record from a JSON data payload
    Create {
        system: String,
        /// Resource type, e.g. student
        rtype: String,
        /// JSON object, e.g. {"name": "Alice"}
        data: String,
    },
    /// Check config, session, and backend reachability
    Health,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective (merged) configuration
    Show,
    /// Write the default config to ~/.mmpctl/config.toml
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Set a config value by dotted key, e.g. backend.base_url
    Set { key: String, value: String },
    /// Reset the config file to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();
    let config = config::load();
    let store = SessionStore::open()?;

    match app.command {
        Commands::Login { email, password } => cli::run_login(&config, &store, email, password),
        Commands::Logout => cli::run_logout(&store),
        Commands::Whoami => cli::run_whoami(&store),
        Commands::Console => console::run(&config, &store),
        Commands::Systems { format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_systems(&config, &store, fmt)
        }
        Commands::Analytics { system, format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_analytics(&config, &store, &system, fmt)
        }
        Commands::Query {
            system,
            rtype,
            filter,
            format,
        } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_query(&config, &store, &system, &rtype, &filter, fmt)
        }
        Commands::Create {
            system,
            rtype,
            data,
        } => cli::run_create(&config, &store, &system, &rtype, &data),
        Commands::Health => cli::run_health(&config, &store),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
