use crate::error::{ChurnError, ChurnResult};
use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `CHURNGUARD__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Tunables for the decision engine.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Exploration probability for the standard strategy.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    /// EMA smoothing factor applied to reward and regret updates.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// Fraction of decision traffic served by the standard strategy; the
    /// remainder goes to the game-theory strategy.
    #[serde(default = "default_standard_share")]
    pub standard_share: f64,
    /// Shared intervention budget at startup, in budget units.
    #[serde(default = "default_initial_budget")]
    pub initial_budget: f64,
}

// Default functions
fn default_node_id() -> String {
    "node-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_epsilon() -> f64 {
    0.1
}
fn default_learning_rate() -> f64 {
    0.1
}
fn default_standard_share() -> f64 {
    0.8
}
fn default_initial_budget() -> f64 {
    1000.0
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            epsilon: default_epsilon(),
            learning_rate: default_learning_rate(),
            standard_share: default_standard_share(),
            initial_budget: default_initial_budget(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> ChurnResult<Self> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("CHURNGUARD")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(|e| ChurnError::Config(e.to_string()))?;
        config
            .try_deserialize()
            .map_err(|e| ChurnError::Config(e.to_string()))
    }
}
