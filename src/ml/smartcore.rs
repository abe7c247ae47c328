//! Random forest artifacts produced with SmartCore.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use smartcore::linalg::basic::matrix::DenseMatrix;

use super::{FeatureVector, ModelType, Regressor};

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// A fitted forest together with the input columns it expects.
#[derive(Debug, Serialize, Deserialize)]
pub struct SmartcoreRandomForest {
    pub feature_names: Vec<String>,
    model: Forest,
}

impl SmartcoreRandomForest {
    pub fn new(model: Forest, feature_names: Vec<String>) -> Self {
        Self {
            feature_names,
            model,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| anyhow::anyhow!("Failed to deserialize model: {}", e))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| anyhow::anyhow!("Failed to serialize model: {}", e))
    }
}

impl Regressor for SmartcoreRandomForest {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        if features.feature_names != self.feature_names {
            anyhow::bail!(
                "Feature mismatch: model expects {:?}, got {:?}",
                self.feature_names,
                features.feature_names
            );
        }

        let x = DenseMatrix::new(1, features.len(), features.features.clone(), false);
        let predictions = self
            .model
            .predict(&x)
            .map_err(|e| anyhow::anyhow!("Prediction failed: {:?}", e))?;

        predictions
            .first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Model returned empty predictions"))
    }

    fn model_type(&self) -> ModelType {
        ModelType::RandomForest
    }
}
