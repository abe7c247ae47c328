//! Daily feature aggregation for the voltage model.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::{
    domain::{Channel, Measurement},
    ml::FeatureVector,
};

/// Model input columns, in the order the model was trained on.
pub fn feature_names() -> Vec<String> {
    Channel::forecast_features().map(|c| c.name().to_string()).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyFeatures {
    pub date: NaiveDate,
    pub features: FeatureVector,
}

/// Per-day means of the feature channels, one entry per day with data,
/// oldest first.
pub fn daily_feature_means(rows: &[Measurement]) -> Vec<DailyFeatures> {
    let channels: Vec<Channel> = Channel::forecast_features().collect();
    let mut days: BTreeMap<NaiveDate, (Vec<f64>, usize)> = BTreeMap::new();

    for m in rows {
        let (sums, n) = days
            .entry(m.timestamp.date())
            .or_insert_with(|| (vec![0.0; channels.len()], 0));
        for (sum, ch) in sums.iter_mut().zip(&channels) {
            *sum += m.get(*ch);
        }
        *n += 1;
    }

    let names = feature_names();
    days.into_iter()
        .map(|(date, (sums, n))| DailyFeatures {
            date,
            features: FeatureVector {
                features: sums.into_iter().map(|s| s / n as f64).collect(),
                feature_names: names.clone(),
            },
        })
        .collect()
}
