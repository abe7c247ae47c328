use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{FeatureVector, ModelType, Regressor};

/// Linear model stored as JSON: `intercept + Σ coefficient_i * feature_i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressionModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Expected input columns; empty skips the name check.
    #[serde(default)]
    pub feature_names: Vec<String>,
}

impl LinearRegressionModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64, feature_names: Vec<String>) -> Self {
        Self {
            coefficients,
            intercept,
            feature_names,
        }
    }

    /// Reject artifacts whose shape is inconsistent.
    pub fn check(&self) -> Result<()> {
        if !self.feature_names.is_empty() && self.feature_names.len() != self.coefficients.len() {
            anyhow::bail!(
                "Model declares {} feature names but {} coefficients",
                self.feature_names.len(),
                self.coefficients.len()
            );
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            anyhow::bail!("Model parameters must be finite");
        }
        Ok(())
    }
}

impl Regressor for LinearRegressionModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        if features.len() != self.coefficients.len() {
            anyhow::bail!(
                "Feature count mismatch: expected {}, got {}",
                self.coefficients.len(),
                features.len()
            );
        }
        if !self.feature_names.is_empty() && self.feature_names != features.feature_names {
            anyhow::bail!("Feature order differs from the order the model was trained on");
        }

        Ok(features
            .features
            .iter()
            .zip(&self.coefficients)
            .map(|(f, c)| f * c)
            .sum::<f64>()
            + self.intercept)
    }

    fn model_type(&self) -> ModelType {
        ModelType::LinearRegression
    }
}
