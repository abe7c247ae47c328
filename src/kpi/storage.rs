use chrono::NaiveDateTime;
use serde::Serialize;

use super::{percent_of, round2};
use crate::{config::KpiConfig, domain::Measurement};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SocPoint {
    pub timestamp: NaiveDateTime,
    pub soc: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContributionPoint {
    pub timestamp: NaiveDateTime,
    pub fuelcell_contribution: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StorageAlerts {
    pub low_battery: bool,
    pub fuelcell_failure: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StorageKpis {
    pub battery_autonomy_h: f64,
    pub fuelcell_contribution_percent: f64,
    pub final_soc_percent: f64,
    pub alerts: StorageAlerts,
}

/// Integrate battery power into a state of charge, one point per row.
///
/// Returns the unrounded final state together with the rounded series.
pub fn soc_scan(rows: &[Measurement], initial_soc: f64, capacity_kwh: f64) -> (f64, Vec<SocPoint>) {
    rows.iter().fold(
        (initial_soc, Vec::with_capacity(rows.len())),
        |(soc, mut points), m| {
            let delta = if capacity_kwh > 0.0 {
                m.battery_power / capacity_kwh * 100.0
            } else {
                0.0
            };
            let soc = (soc + delta).clamp(0.0, 100.0);
            points.push(SocPoint {
                timestamp: m.timestamp,
                soc: round2(soc),
            });
            (soc, points)
        },
    )
}

fn fuelcell_share(m: &Measurement) -> f64 {
    round2(percent_of(m.fc_power, m.fc_power + m.battery_power))
}

pub fn contribution_series(rows: &[Measurement]) -> Vec<ContributionPoint> {
    rows.iter()
        .map(|m| ContributionPoint {
            timestamp: m.timestamp,
            fuelcell_contribution: fuelcell_share(m),
        })
        .collect()
}

/// Hours the stored energy lasts at the current generator load.
///
/// Without a usable load the battery is assumed to discharge at a tenth of
/// its capacity per hour.
pub fn battery_autonomy_h(final_soc: f64, capacity_kwh: f64, load_kw: f64) -> f64 {
    let stored = final_soc / 100.0 * capacity_kwh;
    let load = load_kw.abs();
    let hours = if load > 0.0 && (stored / load).is_finite() {
        stored / load
    } else {
        stored / (capacity_kwh / 10.0)
    };
    if hours.is_finite() {
        round2(hours)
    } else {
        0.0
    }
}

/// Storage family for the rows of one day. Autonomy, fuel cell share and the
/// failure alert read `latest`, the most recent row of that day.
pub fn storage_kpis(rows: &[Measurement], latest: &Measurement, cfg: &KpiConfig) -> StorageKpis {
    let (final_soc, _) = soc_scan(rows, cfg.initial_soc_percent, cfg.battery_capacity_kwh);

    StorageKpis {
        battery_autonomy_h: battery_autonomy_h(final_soc, cfg.battery_capacity_kwh, latest.ge_power_total),
        fuelcell_contribution_percent: fuelcell_share(latest),
        final_soc_percent: round2(final_soc),
        alerts: StorageAlerts {
            low_battery: final_soc < cfg.low_battery_threshold_percent,
            fuelcell_failure: latest.fc_power <= 0.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::test_support::row_at;

    fn battery_rows(powers: &[f64]) -> Vec<Measurement> {
        powers
            .iter()
            .enumerate()
            .map(|(h, p)| {
                let mut m = row_at(h as u32, 10.0);
                m.battery_power = *p;
                m
            })
            .collect()
    }

    #[test]
    fn test_soc_scan_follows_battery_power() {
        let (final_soc, points) = soc_scan(&battery_rows(&[1000.0, -2000.0]), 50.0, 10_000.0);
        assert_eq!(points.iter().map(|p| p.soc).collect::<Vec<_>>(), vec![60.0, 40.0]);
        assert_eq!(final_soc, 40.0);
    }

    #[test]
    fn test_soc_saturates() {
        let (_, points) = soc_scan(&battery_rows(&[9000.0, -20000.0, 100.0]), 50.0, 10_000.0);
        assert_eq!(points.iter().map(|p| p.soc).collect::<Vec<_>>(), vec![100.0, 0.0, 1.0]);
    }

    #[test]
    fn test_soc_scan_empty() {
        let (final_soc, points) = soc_scan(&[], 50.0, 10_000.0);
        assert_eq!(final_soc, 50.0);
        assert!(points.is_empty());
    }

    #[test]
    fn test_autonomy() {
        // 50 % of 10000 kWh over 250 kW
        assert_eq!(battery_autonomy_h(50.0, 10_000.0, -250.0), 20.0);
        // no load: 5000 kWh at 1000 kW
        assert_eq!(battery_autonomy_h(50.0, 10_000.0, 0.0), 5.0);
        assert_eq!(battery_autonomy_h(50.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_contribution_series() {
        let mut a = row_at(0, 1.0);
        a.fc_power = 30.0;
        a.battery_power = 10.0;
        let mut b = row_at(1, 1.0);
        b.fc_power = 5.0;
        b.battery_power = -20.0;
        let series = contribution_series(&[a, b]);
        assert_eq!(series[0].fuelcell_contribution, 75.0);
        assert_eq!(series[1].fuelcell_contribution, 0.0);
    }

    #[test]
    fn test_storage_kpis_and_alerts() {
        let cfg = KpiConfig::default();
        let mut rows = battery_rows(&[-4000.0, 20.0]);
        rows[1].ge_power_total = 100.0;
        rows[1].fc_power = 0.0;

        let k = storage_kpis(&rows, &rows[1], &cfg);
        // 50 - 40 + 0.2
        assert_eq!(k.final_soc_percent, 10.2);
        assert_eq!(k.battery_autonomy_h, 10.2);
        assert_eq!(k.fuelcell_contribution_percent, 0.0);
        assert!(k.alerts.low_battery);
        assert!(k.alerts.fuelcell_failure);
    }
}
