//! Node configuration
//!
//! Layered as defaults, then an optional JSON file, then environment
//! overrides (`FACECAST_MODE`, `FACECAST_PORT`, `FACECAST_BROADCAST`).

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use facecast_core::{FacecastError, FacecastResult};
use facecast_rig::{builtin_profiles, ProfileRegistry};
use facecast_transport::{DEFAULT_PORT, DEFAULT_SEND_TIMEOUT};

pub const ENV_MODE: &str = "FACECAST_MODE";
pub const ENV_PORT: &str = "FACECAST_PORT";
pub const ENV_BROADCAST: &str = "FACECAST_BROADCAST";

/// Which side of the broadcast this process is
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeMode {
    Sender,
    #[default]
    Receiver,
}

impl fmt::Display for NodeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeMode::Sender => write!(f, "sender"),
            NodeMode::Receiver => write!(f, "receiver"),
        }
    }
}

impl FromStr for NodeMode {
    type Err = FacecastError;

    fn from_str(s: &str) -> FacecastResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sender" | "send" => Ok(NodeMode::Sender),
            "receiver" | "receive" | "recv" => Ok(NodeMode::Receiver),
            other => Err(FacecastError::Config(format!("unknown node mode '{}'", other))),
        }
    }
}

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Durations are written as integer milliseconds
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

fn default_rigs() -> Vec<String> {
    builtin_profiles().into_iter().map(|p| p.id).collect()
}

/// FaceCast node configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    pub mode: NodeMode,
    /// UDP port shared by sender and receiver
    pub port: u16,
    /// Sender destination address
    pub broadcast_addr: IpAddr,
    /// Receiver bind address
    pub bind_addr: IpAddr,
    /// Update tick period
    #[serde(with = "duration_ms")]
    pub tick_interval: Duration,
    /// Bound on a single broadcast send
    #[serde(with = "duration_ms")]
    pub send_timeout: Duration,
    /// Avatar shown at startup; the first roster entry when unset
    pub active_rig: Option<String>,
    /// Avatar roster in switch order
    pub rigs: Vec<String>,
    /// Extra JSON rig profiles loaded on top of the built-in ones
    pub profile_paths: Vec<PathBuf>,
    pub log_format: LogFormat,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            mode: NodeMode::Receiver,
            port: DEFAULT_PORT,
            broadcast_addr: IpAddr::V4(Ipv4Addr::BROADCAST),
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            tick_interval: Duration::from_millis(16),
            send_timeout: DEFAULT_SEND_TIMEOUT,
            active_rig: None,
            rigs: default_rigs(),
            profile_paths: Vec::new(),
            log_format: LogFormat::Pretty,
            log_filter: "info".to_string(),
        }
    }
}

impl NodeConfig {
    /// Parse a JSON config; absent fields keep their defaults
    pub fn from_json(json: &str) -> FacecastResult<Self> {
        serde_json::from_str(json).map_err(|e| FacecastError::Config(e.to_string()))
    }

    /// Load from an optional file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> FacecastResult<Self> {
        let mut config = match path {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .map_err(|e| FacecastError::Config(format!("{}: {}", path.display(), e)))?;
                Self::from_json(&json)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, typically the process environment
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> FacecastResult<()> {
        if let Some(mode) = lookup(ENV_MODE) {
            self.mode = mode.parse()?;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| FacecastError::Config(format!("{}: invalid port '{}'", ENV_PORT, port)))?;
        }
        if let Some(addr) = lookup(ENV_BROADCAST) {
            self.broadcast_addr = addr.trim().parse().map_err(|_| {
                FacecastError::Config(format!("{}: invalid address '{}'", ENV_BROADCAST, addr))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> FacecastResult<()> {
        if self.tick_interval.is_zero() {
            return Err(FacecastError::Config("tick_interval must be non-zero".into()));
        }
        if self.send_timeout.is_zero() {
            return Err(FacecastError::Config("send_timeout must be non-zero".into()));
        }
        if self.rigs.is_empty() {
            return Err(FacecastError::Config("avatar roster is empty".into()));
        }
        if let Some(active) = &self.active_rig {
            if !self.rigs.contains(active) {
                return Err(FacecastError::Config(format!(
                    "active rig '{}' is not in the roster",
                    active
                )));
            }
        }
        Ok(())
    }

    /// Where the sender sends
    pub fn broadcast_target(&self) -> SocketAddr {
        SocketAddr::new(self.broadcast_addr, self.port)
    }

    /// Where the receiver listens
    pub fn bind_target(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Built-in profiles plus every configured profile file
    pub fn load_registry(&self) -> FacecastResult<ProfileRegistry> {
        let mut registry = ProfileRegistry::with_builtin();
        for path in &self.profile_paths {
            let profile = registry.load_file(path)?;
            tracing::info!(profile = %profile.id, path = %path.display(), "loaded rig profile");
        }
        Ok(registry)
    }
}
