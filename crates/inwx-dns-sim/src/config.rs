//! Simulator configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::script::{normalize_name, within_zone, AnswerSet, ScriptedAnswers};

/// Configuration for a simulator instance, usually read from TOML.
///
/// ```toml
/// listen = "127.0.0.1:5353"
/// zones = ["example.com."]
///
/// [records]
/// "_acme-challenge.example.com." = [[], [], ["abc"], ["abc"]]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// UDP/TCP listen address (default: 127.0.0.1:5353). Port 0 picks a free port.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Zones to answer for. Empty means every name.
    #[serde(default)]
    pub zones: Vec<String>,

    /// Idle timeout for TCP connections.
    #[serde(default = "default_tcp_timeout")]
    pub tcp_timeout_secs: u64,

    /// Answer sets per query name, served in order.
    #[serde(default)]
    pub records: HashMap<String, Vec<AnswerSet>>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            zones: Vec::new(),
            tcp_timeout_secs: default_tcp_timeout(),
            records: HashMap::new(),
        }
    }
}

impl SimulatorConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self =
                toml::from_str(&content).map_err(|e| crate::SimError::Config(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Check that every scripted name would actually be answered.
    pub fn validate(&self) -> crate::Result<()> {
        if self.tcp_timeout_secs == 0 {
            return Err(crate::SimError::Config("tcp_timeout_secs must be positive".into()));
        }

        if self.zones.is_empty() {
            return Ok(());
        }
        let zones: Vec<String> = self.zones.iter().map(|z| normalize_name(z)).collect();
        for name in self.records.keys() {
            let name = normalize_name(name);
            if !zones.iter().any(|zone| within_zone(&name, zone)) {
                return Err(crate::SimError::Config(format!(
                    "record {name} is outside the configured zones"
                )));
            }
        }
        Ok(())
    }

    /// TCP idle timeout as a [`Duration`]
    #[must_use]
    pub const fn tcp_timeout(&self) -> Duration {
        Duration::from_secs(self.tcp_timeout_secs)
    }

    /// Fresh script with every cursor at zero
    #[must_use]
    pub fn script(&self) -> ScriptedAnswers {
        ScriptedAnswers::from_map(self.records.iter().map(|(name, sets)| (name, sets.clone())))
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5353))
}

const fn default_tcp_timeout() -> u64 {
    30
}
