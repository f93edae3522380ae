//! CLI interface for Grovekeeper

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "grovekeeper")]
#[command(author = "Krakaw")]
#[command(version)]
#[command(about = "Site and tree inventory backend", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new grovekeeper.toml configuration file
    Init,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Use the in-memory store regardless of config
        #[arg(long)]
        memory: bool,
    },

    /// Create or update the PostgreSQL schema
    Migrate,

    /// Print a bcrypt hash for a password
    HashPassword {
        /// Password to hash (prompted if omitted)
        password: Option<String>,
    },

    /// Create an admin account
    CreateAdmin {
        /// Display name
        #[arg(long)]
        name: String,

        /// Login email
        #[arg(long)]
        email: String,

        /// Password (prompted if omitted)
        #[arg(long, env = "GROVEKEEPER_ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Site to assign the admin to
        #[arg(long)]
        site: Option<String>,
    },

    /// List registered users
    Users {
        /// Only users assigned to this site
        #[arg(long)]
        site: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Dispatch a parsed command line
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Init => commands::init().await,
        Commands::Serve { host, port, memory } => commands::serve(host, port, memory).await,
        Commands::Migrate => commands::migrate().await,
        Commands::HashPassword { password } => commands::hash_password(password).await,
        Commands::CreateAdmin {
            name,
            email,
            password,
            site,
        } => commands::create_admin(name, email, password, site).await,
        Commands::Users { site, format } => commands::users(site, format).await,
    }
}
