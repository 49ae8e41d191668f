use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub node: NodeConfig,
    pub module: ModuleConfig,
    #[serde(default)]
    pub gas: GasConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub db_path: String,
    pub log_level: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: String,
    #[serde(default = "default_genesis_file")]
    pub genesis_file: String,
}

fn default_chain_id() -> String {
    "abstract-account-1".to_string()
}

fn default_genesis_file() -> String {
    "genesis.json".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ModuleConfig {
    /// The only address allowed to update the module's params
    pub authority: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct GasConfig {
    /// Gas available to a simulated transaction
    pub simulation_gas_limit: u64,
    /// Used when a transaction does not set its own limit
    pub default_tx_gas_limit: u64,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            simulation_gas_limit: 10_000_000,
            default_tx_gas_limit: 200_000,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node: NodeConfig {
                db_path: "./data/abstract-account".to_string(),
                log_level: "info".to_string(),
                chain_id: default_chain_id(),
                genesis_file: default_genesis_file(),
            },
            module: ModuleConfig {
                authority: "gov".to_string(),
            },
            gas: GasConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load_or_default(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            match std::fs::read_to_string(path) {
                Ok(s) => match toml::from_str(&s) {
                    Ok(c) => {
                        info!(path, "config loaded");
                        c
                    }
                    Err(e) => {
                        warn!(path, error = %e, "failed to parse config, using defaults");
                        Self::default()
                    }
                },
                Err(e) => {
                    warn!(path, error = %e, "failed to read config, using defaults");
                    Self::default()
                }
            }
        } else {
            info!(path, "config file not found, creating default");
            let config = Self::default();
            if let Err(e) = config.save(path) {
                warn!(path, error = %e, "failed to write default config");
            }
            config
        }
    }

    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let s = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, s)
    }
}
