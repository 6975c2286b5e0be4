mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::{cache::CacheSubcommand, config::ConfigSubcommand, supervise::SuperviseArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ogserve",
    about = "Social card service for news articles: serve, render, and probe Open Graph images",
    version,
    propagate_version = true
)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the card service in the foreground
    Serve {
        /// Bind address (overrides OGSERVE_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides OGSERVE_PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Probe a running instance once; exits non-zero when it is unhealthy
    Healthcheck {
        /// Endpoint to probe (default: loopback healthz for the configured port)
        #[arg(long)]
        url: Option<String>,

        /// Seconds to wait for an answer
        #[arg(long, default_value = "30")]
        timeout: u64,
    },

    /// Run a command as a supervised instance with a liveness probe loop
    Supervise(SuperviseArgs),

    /// Render one card to disk without starting the server
    Render {
        /// News slug to render
        slug: String,

        /// Output path (default: the card's cache path under generated/)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Re-render even when a fresh cached card exists
        #[arg(long)]
        force: bool,
    },

    /// Manage the rendered-card cache
    Cache {
        #[command(subcommand)]
        subcommand: CacheSubcommand,
    },

    /// Inspect and validate the runtime configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } | Commands::Supervise(_) => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Serve { host, port } => cmd::serve::run(host, port),
        Commands::Healthcheck { url, timeout } => {
            cmd::healthcheck::run(url.as_deref(), timeout, cli.json)
        }
        Commands::Supervise(args) => cmd::supervise::run(args),
        Commands::Render { slug, out, force } => {
            cmd::render::run(&slug, out.as_deref(), force, cli.json)
        }
        Commands::Cache { subcommand } => cmd::cache::run(subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
