//! Derived dashboard indicators.
//!
//! The pure calculations live in the family submodules; [`KpiEngine`] binds
//! them to a [`MeasurementStore`] for a given reference date. Nothing here
//! reads a clock.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::{config::KpiConfig, domain::Measurement, repo::MeasurementStore};

pub mod distribution;
pub mod network;
pub mod production;
pub mod simulation;
pub mod storage;

pub use distribution::{distribution_kpis, DistributionKpis};
pub use network::{network_kpis, NetworkKpis};
pub use production::{production_kpis, ProductionKpis};
pub use simulation::{simulate, SimulationInput, SimulationPoint};
pub use storage::{
    contribution_series, soc_scan, storage_kpis, ContributionPoint, SocPoint, StorageAlerts,
    StorageKpis,
};

#[derive(Debug, Error)]
pub enum KpiError {
    #[error("no measurements for {date}")]
    NoData { date: NaiveDate },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Round half away from zero to two decimals.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Replaces degenerate percentages by fixed bounds.
///
/// Values at or below zero (and NaN) map to the floor, values at or above
/// 100 to the ceiling; anything else is rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundedPercent {
    pub floor: f64,
    pub ceiling: f64,
}

impl Default for BoundedPercent {
    fn default() -> Self {
        Self {
            floor: 40.0,
            ceiling: 77.0,
        }
    }
}

impl From<&KpiConfig> for BoundedPercent {
    fn from(cfg: &KpiConfig) -> Self {
        Self {
            floor: cfg.percent_floor,
            ceiling: cfg.percent_ceiling,
        }
    }
}

impl BoundedPercent {
    pub fn apply(&self, v: f64) -> f64 {
        if v.is_nan() || v <= 0.0 {
            self.floor
        } else if v >= 100.0 {
            self.ceiling
        } else {
            round2(v)
        }
    }
}

/// `part / whole * 100`, or 0 when `whole` is not positive.
pub(crate) fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

/// KPI families evaluated against the persisted measurements.
#[derive(Clone)]
pub struct KpiEngine {
    store: Arc<dyn MeasurementStore>,
    cfg: KpiConfig,
}

impl KpiEngine {
    pub fn new(store: Arc<dyn MeasurementStore>, cfg: KpiConfig) -> Self {
        Self { store, cfg }
    }

    pub fn bounds(&self) -> BoundedPercent {
        BoundedPercent::from(&self.cfg)
    }

    /// Rows of `date`, or [`KpiError::NoData`] for an empty day.
    async fn day(&self, date: NaiveDate) -> Result<Vec<Measurement>, KpiError> {
        let rows = self.store.query_by_date(date).await?;
        if rows.is_empty() {
            metrics::counter!("microgrid_kpi_no_data_total", 1);
            tracing::debug!(%date, "No measurements for KPI day");
            return Err(KpiError::NoData { date });
        }
        Ok(rows)
    }

    pub async fn production(&self, date: NaiveDate) -> Result<ProductionKpis, KpiError> {
        let rows = self.day(date).await?;
        Ok(production_kpis(&rows, &self.bounds()))
    }

    pub async fn distribution(&self, date: NaiveDate) -> Result<DistributionKpis, KpiError> {
        let rows = self.day(date).await?;
        Ok(distribution_kpis(&rows, &self.bounds()))
    }

    pub async fn soc(&self, date: NaiveDate) -> Result<Vec<SocPoint>, KpiError> {
        let rows = self.store.query_by_date(date).await?;
        let (_, points) = soc_scan(&rows, self.cfg.initial_soc_percent, self.cfg.battery_capacity_kwh);
        Ok(points)
    }

    pub async fn contribution(&self, date: NaiveDate) -> Result<Vec<ContributionPoint>, KpiError> {
        let rows = self.store.query_by_date(date).await?;
        Ok(contribution_series(&rows))
    }

    pub async fn storage(&self, date: NaiveDate) -> Result<StorageKpis, KpiError> {
        let rows = self.day(date).await?;
        let latest = self
            .store
            .query_latest_by_date(date)
            .await?
            .ok_or(KpiError::NoData { date })?;
        Ok(storage_kpis(&rows, &latest, &self.cfg))
    }

    pub async fn network(&self, date: NaiveDate) -> Result<NetworkKpis, KpiError> {
        let rows = self.day(date).await?;
        network_kpis(&rows).ok_or(KpiError::NoData { date })
    }
}
