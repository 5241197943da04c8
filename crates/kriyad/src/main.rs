//! `kriyad` — the Kriya daemon.
//!
//! Binary entrypoint that ties all Kriya components together into a
//! running storage node.
//!
//! # Usage
//!
//! ```text
//! kriyad start                               # start a node
//! kriyad start -c kriya.toml                 # start with a config file
//! kriyad start -d ./node2 -l 127.0.0.1:4921  # second instance
//! kriyad start --seed 127.0.0.1:4920         # join an existing cluster
//! kriyad status                              # probe a running node
//! ```

mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kriya_cluster::{
    ClusterContext, HeartbeatMonitor, Rebalancer, RedundancyMaintainer,
    ReplicationCoordinator,
};
use kriya_net::{HttpPeerClient, PeerClient};
use kriya_server::{NodeServer, NodeServerConfig, StaticIdentity};
use kriya_store::{FileStore, MemoryStore, ObjectStore, SealedStore};
use kriya_types::{Node, NodeAddr};
use tracing::{info, warn};

use config::CliConfig;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "kriyad",
    version,
    about = "Kriya distributed object storage daemon"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Kriya node.
    Start {
        /// Override data directory (useful for running multiple instances).
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Override the HTTP listen address (e.g. "127.0.0.1:4921").
        #[arg(short = 'l', long)]
        listen_addr: Option<String>,

        /// Seed node (`host:port`) to announce to on startup.
        #[arg(short, long)]
        seed: Option<String>,

        /// Access key clients must present on mutations.
        #[arg(long, env = "KRIYA_ACCESS_KEY")]
        access_key: Option<String>,

        /// Secret key clients must present on mutations.
        ///
        /// Can also be set via `KRIYA_SECRET_KEY` or `[identity]
        /// secret_key` in the config file. If none is provided, a random
        /// secret is generated and displayed.
        #[arg(long, env = "KRIYA_SECRET_KEY")]
        secret_key: Option<String>,

        /// Run fully in-memory (no disk persistence).
        #[arg(short, long)]
        memory: bool,
    },

    /// Probe a running node and print its load report.
    Status {
        /// Node address to probe.
        #[arg(short, long, default_value = "127.0.0.1:4920")]
        addr: String,
    },
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    setup_tracing(&config.log.level);

    match cli.command {
        Commands::Start {
            data_dir,
            listen_addr,
            seed,
            access_key,
            secret_key,
            memory,
        } => {
            // CLI args override config file values.
            if let Some(dir) = data_dir {
                config.node.data_dir = dir;
            }
            if let Some(addr) = listen_addr {
                config.node.listen_addr = addr;
            }
            if seed.is_some() {
                config.cluster.seed = seed;
            }
            if let Some(key) = access_key {
                config.identity.access_key = key;
            }
            if let Some(key) = secret_key {
                config.identity.secret_key = key;
            }
            if memory {
                config.storage.backend = "memory".to_string();
            }
            cmd_start(config).await
        }
        Commands::Status { addr } => cmd_status(&addr).await,
    }
}

/// Initialize the `tracing` subscriber with the given level filter.
///
/// Respects `RUST_LOG` env var if set, otherwise uses the config value.
fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

// -----------------------------------------------------------------------
// kriyad start
// -----------------------------------------------------------------------

async fn cmd_start(mut config: CliConfig) -> Result<()> {
    info!("starting kriyad");

    let cluster_config = config.cluster_config();
    let memory_mode = config.storage.backend == "memory";
    info!(
        data_dir = %config.node.data_dir.display(),
        listen_addr = %config.node.listen_addr,
        backend = %config.storage.backend,
        heartbeat_secs = cluster_config.heartbeat_interval.as_secs(),
        rebalance_secs = cluster_config.rebalance_interval.as_secs(),
        threshold = cluster_config.consensus_threshold,
        redundancy = cluster_config.redundancy_factor,
        "node configuration"
    );

    // --- Object store ---
    let backend: Arc<dyn ObjectStore> = if memory_mode {
        Arc::new(MemoryStore::new())
    } else {
        std::fs::create_dir_all(&config.node.data_dir)
            .context("failed to create data directory")?;
        Arc::new(
            FileStore::new(config.node.data_dir.join("objects"))
                .context("failed to open object store")?,
        )
    };
    // Objects are compressed and encrypted at rest regardless of backend.
    let store: Arc<dyn ObjectStore> = Arc::new(SealedStore::new(backend));

    // --- Cluster state ---
    let local: NodeAddr = config
        .advertise_addr()
        .parse()
        .context("invalid advertise address")?;
    let ctx = ClusterContext::new(local.clone(), cluster_config.clone())
        .context("invalid cluster configuration")?;
    ctx.add_node(Node::new(local.clone()))
        .context("failed to register local node")?;
    info!(%local, "node identity");

    let client: Arc<dyn PeerClient> = Arc::new(
        HttpPeerClient::new(cluster_config.probe_timeout)
            .context("failed to build peer client")?,
    );

    // --- Join via seed ---
    if let Some(seed) = &config.cluster.seed {
        let seed: NodeAddr = seed.parse().context("invalid seed address")?;
        info!(%seed, "announcing to seed node");
        let members = client
            .join(&seed, &local)
            .await
            .context("join via seed failed")?;
        for member in members {
            if member.addr == local {
                continue;
            }
            if let Err(e) = ctx.add_node(member) {
                warn!(error = %e, "skipping member from seed response");
            }
        }
        info!(members = ctx.registry().len(), "adopted seed's membership view");
    }

    // --- Client identity ---
    if config.identity.secret_key.is_empty() {
        config.identity.secret_key = generate_secret_key();
        // Displayed once so the operator can hand it to clients.
        info!(
            access_key = %config.identity.access_key,
            secret_key = %config.identity.secret_key,
            "generated client credentials"
        );
    }
    let identity = Arc::new(StaticIdentity::new(
        config.identity.access_key.clone(),
        config.identity.secret_key.clone(),
    ));

    // --- Background tasks ---
    let replication = Arc::new(ReplicationCoordinator::new(ctx.clone(), client.clone()));
    let heartbeat = HeartbeatMonitor::new(ctx.clone(), client.clone()).spawn();
    let rebalancer = Rebalancer::new(ctx.clone(), client.clone()).spawn();
    let redundancy =
        RedundancyMaintainer::new(ctx.clone(), store.clone(), client.clone()).spawn();

    // --- HTTP surface ---
    let server = NodeServer::new(NodeServerConfig {
        store,
        ctx: ctx.clone(),
        replication,
        identity,
    });

    info!(addr = %config.node.listen_addr, "node ready");
    server
        .serve_with_shutdown(&config.node.listen_addr, shutdown_signal())
        .await
        .context("node server failed")?;

    info!("shutting down background tasks");
    heartbeat.stop();
    rebalancer.stop();
    redundancy.stop();

    // Best-effort departure announcements; an unreachable peer will learn
    // through its own replication failures instead.
    for peer in ctx.peers() {
        if let Err(e) = client.leave(&peer.addr, &local).await {
            warn!(peer = %peer.addr, error = %e, "departure announcement failed");
        }
    }

    Ok(())
}

/// Resolves when the process receives ctrl-c.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
}

/// Generate a random client secret: 32 lowercase hex characters.
fn generate_secret_key() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// -----------------------------------------------------------------------
// kriyad status
// -----------------------------------------------------------------------

async fn cmd_status(addr: &str) -> Result<()> {
    let addr: NodeAddr = addr.parse().context("invalid node address")?;
    let client = HttpPeerClient::new(Duration::from_secs(3))
        .context("failed to build peer client")?;
    let stats = client
        .fetch_stats(&addr)
        .await
        .with_context(|| format!("node {addr} did not answer"))?;

    println!("node {addr}");
    println!("  objects: {}", stats.object_count);
    Ok(())
}
