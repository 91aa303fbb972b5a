//! The `echelon` binary: serves the hierarchical agent-team gateway.

use clap::{Parser, Subcommand};
use echelon_gateway::GatewayServer;
use echelon_stream::StreamManager;
use echelon_team::{
    default_hierarchy, describe, SchedulerConfig, SequentialRouter, TaskScheduler,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "echelon", about = "Echelon — Hierarchical agent team orchestration server")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "echelon.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the configured team hierarchy as JSON
    Agents,
}

#[derive(Deserialize, Default)]
struct EchelonConfig {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    orchestrator: OrchestratorConfig,
    #[serde(default)]
    validation: ValidationConfig,
}

#[derive(Deserialize)]
struct ServerConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Deserialize)]
struct OrchestratorConfig {
    #[serde(default = "default_step_limit")]
    step_limit: usize,
    #[serde(default = "default_pacing_ms")]
    pacing_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            step_limit: default_step_limit(),
            pacing_ms: default_pacing_ms(),
        }
    }
}

#[derive(Deserialize)]
struct ValidationConfig {
    #[serde(default = "default_max_task_len")]
    max_task_len: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_task_len: default_max_task_len(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_step_limit() -> usize {
    echelon_team::DEFAULT_STEP_LIMIT
}

fn default_pacing_ms() -> u64 {
    20
}

fn default_max_task_len() -> usize {
    echelon_gateway::MAX_TASK_LEN
}

fn load_config(path: &PathBuf) -> anyhow::Result<EchelonConfig> {
    if path.exists() {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    } else {
        Ok(EchelonConfig::default())
    }
}

fn build_scheduler(config: &EchelonConfig) -> anyhow::Result<Arc<TaskScheduler>> {
    let graph = default_hierarchy(
        Arc::new(SequentialRouter::new()),
        config.orchestrator.step_limit,
    )?;
    Ok(Arc::new(TaskScheduler::new(
        graph,
        SchedulerConfig {
            pacing: Duration::from_millis(config.orchestrator.pacing_ms),
        },
    )))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Serve { host, port } => {
            let scheduler = build_scheduler(&config)?;
            let streams = StreamManager::new();
            let app = GatewayServer::build_with_limit(
                scheduler,
                streams,
                config.validation.max_task_len,
            );

            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            let addr = format!("{host}:{port}");

            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!(addr = %addr, "Echelon gateway listening");
            axum::serve(listener, app).await?;
        }
        Commands::Agents => {
            let scheduler = build_scheduler(&config)?;
            let hierarchy = describe(scheduler.graph());
            println!("{}", serde_json::to_string_pretty(&hierarchy)?);
        }
    }

    Ok(())
}
