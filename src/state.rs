use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{info, warn};

use crate::{
    clock::{Clock, SystemClock},
    config::Config,
    forecast::VoltageForecaster,
    kpi::KpiEngine,
    ml::{self, Regressor},
    repo::Repositories,
};

/// Shared, read-only handles for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub repos: Repositories,
    pub kpis: KpiEngine,
    pub forecaster: VoltageForecaster,
    pub clock: Arc<dyn Clock>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Connect the stores and load the forecast model.
    ///
    /// A model that fails to load only disables the forecast endpoint.
    pub async fn new(cfg: Config) -> Result<Self> {
        let repos = Repositories::new(&cfg).await?;

        let model = match ml::load_model(&cfg.forecast.model_path) {
            Ok(model) => {
                info!(path = %cfg.forecast.model_path, kind = ?model.model_type(), "Forecast model loaded");
                Some(model)
            }
            Err(e) => {
                warn!(path = %cfg.forecast.model_path, error = %e, "Forecast model unavailable");
                None
            }
        };

        Ok(Self::from_parts(cfg, repos, model, Arc::new(SystemClock)))
    }

    pub fn from_parts(
        cfg: Config,
        repos: Repositories,
        model: Option<Arc<dyn Regressor>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let kpis = KpiEngine::new(repos.measurements.clone(), cfg.kpi.clone());
        let forecaster = VoltageForecaster::new(
            repos.measurements.clone(),
            model,
            cfg.forecast.horizon_days,
        );
        Self {
            cfg: Arc::new(cfg),
            repos,
            kpis,
            forecaster,
            clock,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}
