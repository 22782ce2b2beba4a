use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "melt",
    about = "MELT — deployment plane for the ACE-Step music generation stack",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to melt.toml (default: ./melt.toml if present, else built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the platform data directory (volumes live under <data-dir>/volumes)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every model on the registry list into the models volume.
    ///
    /// One downloader run per model, fail-soft: a failed model is reported
    /// and the remaining models are still attempted. The command exits 0
    /// either way; read the report.
    FetchModels,
    /// Provision volumes and launch one service role, waiting for readiness
    Deploy {
        /// Role to deploy: api, experience, or trainer
        role: String,
    },
    /// Render the resolved launch plan without spawning anything
    Plan {
        /// Role to plan: api, experience, or trainer
        role: String,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::FetchModels => commands::fetch::fetch_models(cli.config.as_deref(), cli.data_dir),
        Commands::Deploy { role } => {
            commands::deploy::deploy(&role, cli.config.as_deref(), cli.data_dir).await
        }
        Commands::Plan { role, format } => {
            commands::plan::plan(&role, cli.config.as_deref(), cli.data_dir, &format)
        }
    }
}
