//! Pre-trained voltage regressors.
//!
//! Models are trained offline; this module only loads an artifact and
//! evaluates it on a [`FeatureVector`].

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub mod models;

#[cfg(feature = "ml")]
pub mod smartcore;

pub use models::LinearRegressionModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelType {
    LinearRegression,
    RandomForest,
}

/// Named model inputs in model column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub features: Vec<f64>,
    pub feature_names: Vec<String>,
}

impl FeatureVector {
    pub fn new(features: Vec<f64>, feature_names: Vec<String>) -> Result<Self> {
        if features.len() != feature_names.len() {
            anyhow::bail!(
                "Feature count mismatch: {} features, {} names",
                features.len(),
                feature_names.len()
            );
        }
        Ok(Self {
            features,
            feature_names,
        })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.feature_names
            .iter()
            .position(|n| n == name)
            .map(|i| self.features[i])
    }
}

/// A regressor producing one value per feature vector.
#[cfg_attr(test, mockall::automock)]
pub trait Regressor: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<f64>;

    fn model_type(&self) -> ModelType;
}

/// Load a model artifact, picking the format from the file extension.
///
/// `.json` holds a linear model; `.bin` a bincode random forest (requires
/// the `ml` feature).
pub fn load_model(path: impl AsRef<Path>) -> Result<Arc<dyn Regressor>> {
    let path = path.as_ref();
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();

    match ext {
        "json" => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read model {}", path.display()))?;
            let model: LinearRegressionModel = serde_json::from_str(&raw)
                .with_context(|| format!("invalid linear model {}", path.display()))?;
            model.check()?;
            Ok(Arc::new(model))
        }
        #[cfg(feature = "ml")]
        "bin" => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read model {}", path.display()))?;
            Ok(Arc::new(smartcore::SmartcoreRandomForest::from_bytes(&bytes)?))
        }
        other => anyhow::bail!("unsupported model format {other:?} for {}", path.display()),
    }
}
