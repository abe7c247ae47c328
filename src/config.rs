use anyhow::{ensure, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path};

use crate::ingest::GapFill;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "MICROGRID__";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub db: DbConfig,
    pub ingest: IngestConfig,
    pub kpi: KpiConfig,
    pub forecast: ForecastConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub enable_metrics: bool,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8011,
            enable_cors: true,
            enable_metrics: true,
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// Empty selects the in-memory store.
    pub url: String,
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
        }
    }
}

/// Year substitution applied to imported timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRewrite {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub from: i32,
    pub to: i32,
}

fn enabled_by_default() -> bool {
    true
}

impl YearRewrite {
    pub const fn new(from: i32, to: i32) -> Self {
        Self {
            enabled: true,
            from,
            to,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub delimiter: char,
    pub gap_fill: GapFill,
    /// Fixed seed for the gap-repair random source; entropy-seeded when unset.
    pub seed: Option<u64>,
    pub year_rewrite: Option<YearRewrite>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            gap_fill: GapFill::Random,
            seed: None,
            year_rewrite: Some(YearRewrite::new(2022, 2025)),
        }
    }
}

impl IngestConfig {
    /// The rewrite to apply, if any.
    pub fn active_year_rewrite(&self) -> Option<YearRewrite> {
        self.year_rewrite.filter(|r| r.enabled)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.delimiter.is_ascii(),
            "ingest.delimiter must be an ASCII character, got {:?}",
            self.delimiter
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiConfig {
    pub percent_floor: f64,
    pub percent_ceiling: f64,
    pub battery_capacity_kwh: f64,
    pub initial_soc_percent: f64,
    pub low_battery_threshold_percent: f64,
}

impl KpiConfig {
    /// Bounds must satisfy `0 < floor <= ceiling <= 100`, otherwise clamped
    /// shares can add up to more than 100.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.percent_floor > 0.0
                && self.percent_floor <= self.percent_ceiling
                && self.percent_ceiling <= 100.0,
            "kpi bounds must satisfy 0 < percent_floor <= percent_ceiling <= 100, got {} and {}",
            self.percent_floor,
            self.percent_ceiling
        );
        ensure!(
            self.battery_capacity_kwh > 0.0,
            "kpi.battery_capacity_kwh must be positive"
        );
        ensure!(
            (0.0..=100.0).contains(&self.initial_soc_percent),
            "kpi.initial_soc_percent must lie in [0, 100]"
        );
        Ok(())
    }
}

impl Default for KpiConfig {
    fn default() -> Self {
        Self {
            percent_floor: 40.0,
            percent_ceiling: 77.0,
            battery_capacity_kwh: 10_000.0,
            initial_soc_percent: 50.0,
            low_battery_threshold_percent: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub model_path: String,
    pub horizon_days: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            model_path: "ml/voltage_model.json".to_string(),
            horizon_days: 5,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        let cfg: Config = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.ingest.validate()?;
        self.kpi.validate()
    }
}
