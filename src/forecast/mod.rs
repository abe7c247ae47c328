//! Multi-day bus voltage forecast.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use thiserror::Error;

use crate::{ml::Regressor, repo::MeasurementStore};

pub mod features;

pub use features::{daily_feature_means, feature_names, DailyFeatures};

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("no measurements stored")]
    NoData,

    #[error("forecast model unavailable")]
    ModelUnavailable,

    #[error("prediction failed: {0}")]
    Prediction(#[source] anyhow::Error),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoltagePrediction {
    pub date: NaiveDate,
    pub mg_lv_voltage_pred: f64,
}

/// Projects the last observed day forward with the loaded regressor.
#[derive(Clone)]
pub struct VoltageForecaster {
    store: Arc<dyn MeasurementStore>,
    model: Option<Arc<dyn Regressor>>,
    horizon_days: u32,
}

impl VoltageForecaster {
    pub fn new(
        store: Arc<dyn MeasurementStore>,
        model: Option<Arc<dyn Regressor>>,
        horizon_days: u32,
    ) -> Self {
        Self {
            store,
            model,
            horizon_days,
        }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    /// One prediction per day following the last day with data, the inputs
    /// being that day's feature means.
    pub async fn predict(&self) -> Result<Vec<VoltagePrediction>, ForecastError> {
        let model = self.model.as_ref().ok_or(ForecastError::ModelUnavailable)?;

        let rows = self.store.query_all().await?;
        let last = daily_feature_means(&rows)
            .pop()
            .ok_or(ForecastError::NoData)?;

        let mut out = Vec::with_capacity(self.horizon_days as usize);
        for offset in 1..=i64::from(self.horizon_days) {
            let value = model
                .predict(&last.features)
                .map_err(ForecastError::Prediction)?;
            if !value.is_finite() {
                return Err(ForecastError::Prediction(anyhow::anyhow!(
                    "model returned a non-finite value"
                )));
            }
            out.push(VoltagePrediction {
                date: last.date + Duration::days(offset),
                mg_lv_voltage_pred: value,
            });
        }

        tracing::debug!(
            last_day = %last.date,
            horizon = self.horizon_days,
            model = ?model.model_type(),
            "Voltage forecast computed"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Measurement, CHANNEL_COUNT},
        ml::{MockRegressor, ModelType},
        repo::memory::MemoryMeasurementStore,
    };
    use chrono::NaiveDateTime;

    fn store_with(days: &[(&str, f64)]) -> Arc<dyn MeasurementStore> {
        let rows = days
            .iter()
            .map(|(at, fill)| {
                let ts = NaiveDateTime::parse_from_str(at, "%Y-%m-%d %H:%M:%S").unwrap();
                Measurement::from_values(ts, [*fill; CHANNEL_COUNT])
            })
            .collect();
        Arc::new(MemoryMeasurementStore::with_rows(rows))
    }

    #[tokio::test]
    async fn test_predicts_following_days_from_last_day() {
        let mut model = MockRegressor::new();
        model
            .expect_predict()
            .withf(|fv| fv.len() == 16 && fv.features.iter().all(|v| *v == 5.0))
            .times(5)
            .returning(|_| Ok(479.5));
        model.expect_model_type().return_const(ModelType::LinearRegression);

        let store = store_with(&[("2025-08-01 10:00:00", 1.0), ("2025-08-02 10:00:00", 5.0)]);
        let forecaster = VoltageForecaster::new(store, Some(Arc::new(model)), 5);

        let preds = forecaster.predict().await.unwrap();
        assert_eq!(preds.len(), 5);
        assert_eq!(preds[0].date, NaiveDate::from_ymd_opt(2025, 8, 3).unwrap());
        assert_eq!(preds[4].date, NaiveDate::from_ymd_opt(2025, 8, 7).unwrap());
        assert!(preds.iter().all(|p| p.mg_lv_voltage_pred == 479.5));
    }

    #[tokio::test]
    async fn test_empty_history_is_no_data() {
        let mut model = MockRegressor::new();
        model.expect_predict().never();
        let forecaster = VoltageForecaster::new(store_with(&[]), Some(Arc::new(model)), 5);
        assert!(matches!(forecaster.predict().await, Err(ForecastError::NoData)));
    }

    #[tokio::test]
    async fn test_missing_model_is_unavailable() {
        let forecaster = VoltageForecaster::new(store_with(&[("2025-08-01 10:00:00", 1.0)]), None, 5);
        assert!(!forecaster.is_available());
        assert!(matches!(forecaster.predict().await, Err(ForecastError::ModelUnavailable)));
    }

    #[tokio::test]
    async fn test_model_failure_is_prediction_error() {
        let mut model = MockRegressor::new();
        model
            .expect_predict()
            .returning(|_| Err(anyhow::anyhow!("shape mismatch")));
        let forecaster =
            VoltageForecaster::new(store_with(&[("2025-08-01 10:00:00", 1.0)]), Some(Arc::new(model)), 5);
        let err = forecaster.predict().await.unwrap_err();
        assert!(matches!(err, ForecastError::Prediction(_)));
        assert!(err.to_string().contains("shape mismatch"));
    }
}
