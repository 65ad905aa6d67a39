use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use wsswarm::config::{DEFAULT_CONCURRENCY, DEFAULT_ENDPOINT, DEFAULT_IDENTITY_LEN};
use wsswarm::{Swarm, SwarmConfig, WsConnector};

#[derive(Parser, Debug)]
#[command(name = "wsswarm")]
#[command(about = "Open many short-lived WebSocket sessions that disconnect at random stages", long_about = None)]
struct Cli {
    /// Target WebSocket URL
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    url: String,

    /// Number of sessions to launch
    #[arg(short = 'n', long, default_value_t = DEFAULT_CONCURRENCY)]
    sessions: usize,

    /// Stage-3 idle time before disconnecting (milliseconds)
    #[arg(long, default_value_t = 500)]
    hold_ms: u64,

    /// Pause between session launches (milliseconds)
    #[arg(long, default_value_t = 10)]
    stagger_ms: u64,

    /// Length of each session's identity token
    #[arg(long, default_value_t = DEFAULT_IDENTITY_LEN)]
    identity_len: usize,

    /// Seed for reproducible identities and stages
    #[arg(long)]
    seed: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn into_config(self) -> SwarmConfig {
        let config = SwarmConfig::new()
            .with_endpoint(self.url)
            .with_concurrency(self.sessions)
            .with_hold(Duration::from_millis(self.hold_ms))
            .with_stagger(Duration::from_millis(self.stagger_ms))
            .with_identity_len(self.identity_len);
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let config = cli.into_config();
    let connector = WsConnector::new(config.transport.clone());
    let swarm = Swarm::new(config, connector).context("invalid swarm configuration")?;

    let joined = swarm.run().await;
    info!(sessions = joined, "exiting");
    Ok(())
}
