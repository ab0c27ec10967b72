//! Subtrack Server — application entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use subtrack_server::Config;
use subtrack_server::config::LoggingConfig;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "subtrack-server")]
#[command(about = "Subscription tracker API server")]
struct Cli {
    #[arg(short, long, help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Give an existing account the admin role.
    GrantAdmin {
        #[arg(long)]
        email: String,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[actix_web::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging);

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => subtrack_server::serve(config).await,
        Command::GrantAdmin { email } => subtrack_server::grant_admin(&config, &email).await,
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}
