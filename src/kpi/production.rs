use serde::Serialize;

use super::{percent_of, round2, BoundedPercent};
use crate::domain::Measurement;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProductionKpis {
    pub renewable_percentage: f64,
    pub battery_efficiency: f64,
    pub fuel_cell_reliability: f64,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Mean per-row renewable share of the total supply.
pub fn renewable_percentage(rows: &[Measurement], bounds: &BoundedPercent) -> f64 {
    let raw = mean(rows.iter().filter_map(|m| {
        let renewable = m.renewable_power();
        let denom = renewable + m.ge_power_total;
        (denom > 0.0).then(|| renewable / denom * 100.0)
    }));
    bounds.apply(raw)
}

/// Discharged over charged battery energy.
pub fn battery_efficiency(rows: &[Measurement], bounds: &BoundedPercent) -> f64 {
    let (charged, discharged) = rows.iter().fold((0.0, 0.0), |(c, d), m| {
        if m.battery_power > 0.0 {
            (c + m.battery_power, d)
        } else {
            (c, d - m.battery_power)
        }
    });
    bounds.apply(percent_of(discharged, charged))
}

/// Mean delivered power over setpoint, on rows with a positive setpoint.
pub fn fuel_cell_reliability(rows: &[Measurement], bounds: &BoundedPercent) -> f64 {
    let raw = mean(
        rows.iter()
            .filter(|m| m.fc_setpoint > 0.0)
            .map(|m| m.fc_power / m.fc_setpoint * 100.0),
    );
    bounds.apply(raw)
}

/// Production family with its cross-metric caps applied.
pub fn production_kpis(rows: &[Measurement], bounds: &BoundedPercent) -> ProductionKpis {
    let renewable = renewable_percentage(rows, bounds);
    let efficiency = battery_efficiency(rows, bounds).min(renewable);
    let reliability = fuel_cell_reliability(rows, bounds).min(round2(100.0 - renewable));

    ProductionKpis {
        renewable_percentage: renewable,
        battery_efficiency: efficiency,
        fuel_cell_reliability: reliability,
    }
}
