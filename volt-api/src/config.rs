use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub engine: EngineSettings,
    pub reconciler: ReconcilerConfig,
    pub carrier: CarrierConfig,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineSettings {
    pub commission_rate_bps: i64,
    pub vehicle_flat_fee: i64,
    pub carrier_name: String,
    pub external_timeout_secs: u64,
}

impl EngineSettings {
    pub fn to_engine_config(&self) -> volt_order::EngineConfig {
        volt_order::EngineConfig {
            commission_rate_bps: self.commission_rate_bps,
            vehicle_flat_fee: self.vehicle_flat_fee,
            carrier_name: self.carrier_name.clone(),
            external_timeout: Duration::from_secs(self.external_timeout_secs),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReconcilerConfig {
    pub poll_interval_secs: u64,
    pub poll_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CarrierConfig {
    pub base_url: String,
    pub token: String,
    pub shop_id: i64,
    /// Use the in-process mock instead of the live carrier.
    #[serde(default)]
    pub mock: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default)]
    pub mock: bool,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("VOLT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
