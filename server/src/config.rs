//! Configuration management for the server.

use std::env;
use std::time::Duration;

use tandem_engine::{PeerId, StrategyKind, TrackingMode};

/// Link and editing settings for one peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeerConfig {
    /// Delay on the peer's up-link to the relay
    pub up_delay: Duration,
    /// Delay on the relay's down-link to the peer
    pub down_delay: Duration,
    /// Send every drag step instead of one history entry per drag
    pub sync_drag: bool,
}

impl PeerConfig {
    pub fn tracking_mode(&self) -> TrackingMode {
        if self.sync_drag {
            TrackingMode::Live
        } else {
            TrackingMode::History
        }
    }
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Reconciliation strategy run by both peers
    pub strategy: StrategyKind,
    pub peer_a: PeerConfig,
    pub peer_b: PeerConfig,
    /// Compact peer logs after each relayed batch
    pub compact_log: bool,
}

impl Default for Config {
    fn default() -> Self {
        let peer = PeerConfig {
            sync_drag: true,
            ..PeerConfig::default()
        };
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            strategy: StrategyKind::default(),
            peer_a: peer,
            peer_b: peer,
            compact_log: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = lookup("HOST").unwrap_or(defaults.host);

        let port = match lookup("PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::invalid("PORT", value))?,
            None => defaults.port,
        };

        let strategy = match lookup("SYNC_STRATEGY") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::invalid("SYNC_STRATEGY", value))?,
            None => defaults.strategy,
        };

        let peer_a = peer_from_lookup(&lookup, PeerId::A)?;
        let peer_b = peer_from_lookup(&lookup, PeerId::B)?;

        let compact_log = flag(&lookup, "COMPACT_LOG", defaults.compact_log)?;

        Ok(Self {
            host,
            port,
            strategy,
            peer_a,
            peer_b,
            compact_log,
        })
    }

    pub fn peer(&self, id: PeerId) -> &PeerConfig {
        match id {
            PeerId::A => &self.peer_a,
            PeerId::B => &self.peer_b,
        }
    }
}

fn peer_from_lookup(
    lookup: &impl Fn(&str) -> Option<String>,
    id: PeerId,
) -> Result<PeerConfig, ConfigError> {
    let (up, down, drag) = match id {
        PeerId::A => ("PEER_A_UP_DELAY_MS", "PEER_A_DOWN_DELAY_MS", "PEER_A_SYNC_DRAG"),
        PeerId::B => ("PEER_B_UP_DELAY_MS", "PEER_B_DOWN_DELAY_MS", "PEER_B_SYNC_DRAG"),
    };

    Ok(PeerConfig {
        up_delay: delay(lookup, up)?,
        down_delay: delay(lookup, down)?,
        sync_drag: flag(lookup, drag, true)?,
    })
}

fn delay(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Duration, ConfigError> {
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::invalid(var, value)),
        None => Ok(Duration::ZERO),
    }
}

fn flag(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(value) = lookup(var) else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(var, value)),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {var} value: '{value}'")]
    Invalid { var: &'static str, value: String },
}

impl ConfigError {
    fn invalid(var: &'static str, value: String) -> Self {
        ConfigError::Invalid { var, value }
    }
}
