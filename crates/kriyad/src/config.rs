//! TOML configuration for the Kriya daemon.

use std::path::{Path, PathBuf};
use std::time::Duration;

use kriya_types::ClusterConfig;
use serde::Deserialize;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Node identity and addresses.
    pub node: NodeSection,
    /// Cluster membership and replication tuning.
    pub cluster: ClusterSection,
    /// Object storage backend.
    pub storage: StorageSection,
    /// Client credentials.
    pub identity: IdentitySection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[node]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NodeSection {
    /// Directory for stored objects.
    pub data_dir: PathBuf,
    /// Address the HTTP server binds to.
    pub listen_addr: String,
    /// Address peers should use to reach this node.
    ///
    /// Defaults to `listen_addr` with a wildcard host rewritten to
    /// `127.0.0.1` — set this when binding `0.0.0.0` on a multi-node
    /// deployment.
    pub advertise_addr: Option<String>,
}

impl Default for NodeSection {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .map(|h| h.join(".kriya"))
            .unwrap_or_else(|| PathBuf::from(".kriya"));
        Self {
            data_dir,
            listen_addr: "0.0.0.0:4920".to_string(),
            advertise_addr: None,
        }
    }
}

/// `[cluster]` section. Unset fields take the built-in defaults
/// (heartbeat 5s, rebalance 60s, threshold 0.5, redundancy 2, probe
/// timeout 3s).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClusterSection {
    /// Seed node (`host:port`) to announce to on startup.
    pub seed: Option<String>,
    /// Seconds between heartbeat probe rounds.
    pub heartbeat_interval_secs: Option<u64>,
    /// Seconds between rebalance passes (and redundancy sweeps).
    pub rebalance_interval_secs: Option<u64>,
    /// Fraction of expected replica writes that must succeed, in `(0, 1]`.
    pub consensus_threshold: Option<f64>,
    /// Target number of copies of each object.
    pub redundancy_factor: Option<u32>,
    /// Seconds before a peer network call is abandoned.
    pub probe_timeout_secs: Option<u64>,
}

/// `[storage]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Backend type: `"file"` (default) or `"memory"`.
    pub backend: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            backend: "file".to_string(),
        }
    }
}

/// `[identity]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IdentitySection {
    /// Access key clients must present on mutations.
    pub access_key: String,
    /// Secret key clients must present on mutations.
    ///
    /// If empty (and not supplied via `KRIYA_SECRET_KEY`), a random secret
    /// is generated at startup and displayed once.
    pub secret_key: String,
}

impl Default for IdentitySection {
    fn default() -> Self {
        Self {
            access_key: "kriya".to_string(),
            secret_key: String::new(),
        }
    }
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file, or take the defaults if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                let config: CliConfig = toml::from_str(&content)?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Effective cluster tuning, with unset fields defaulted.
    pub fn cluster_config(&self) -> ClusterConfig {
        let defaults = ClusterConfig::default();
        ClusterConfig {
            heartbeat_interval: self
                .cluster
                .heartbeat_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.heartbeat_interval),
            rebalance_interval: self
                .cluster
                .rebalance_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.rebalance_interval),
            consensus_threshold: self
                .cluster
                .consensus_threshold
                .unwrap_or(defaults.consensus_threshold),
            redundancy_factor: self
                .cluster
                .redundancy_factor
                .unwrap_or(defaults.redundancy_factor),
            probe_timeout: self
                .cluster
                .probe_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.probe_timeout),
        }
    }

    /// Address peers should dial, derived from `advertise_addr` or the
    /// listen address with a wildcard host rewritten to loopback.
    pub fn advertise_addr(&self) -> String {
        if let Some(addr) = &self.node.advertise_addr {
            return addr.clone();
        }
        self.node
            .listen_addr
            .replacen("0.0.0.0", "127.0.0.1", 1)
            .replacen("[::]", "127.0.0.1", 1)
    }
}
