use serde::Serialize;

use super::{percent_of, round2, BoundedPercent};
use crate::domain::Measurement;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistributionKpis {
    pub autoconsommation_percent: f64,
    pub dependance_reseau_percent: f64,
    pub critical_ratio_percent: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct DailyTotals {
    renewable: f64,
    fuel_cell: f64,
    ge_total: f64,
    ge_body: f64,
}

impl DailyTotals {
    fn of(rows: &[Measurement]) -> Self {
        rows.iter().fold(Self::default(), |t, m| Self {
            renewable: t.renewable + m.renewable_power(),
            fuel_cell: t.fuel_cell + m.fc_power,
            ge_total: t.ge_total + m.ge_power_total,
            ge_body: t.ge_body + m.ge_power_body,
        })
    }
}

/// Self-consumption, grid dependence and critical-load share of a day.
///
/// Self-consumption and grid dependence never add up to more than 100, and
/// the critical share never exceeds grid dependence.
pub fn distribution_kpis(rows: &[Measurement], bounds: &BoundedPercent) -> DistributionKpis {
    let t = DailyTotals::of(rows);

    let auto = bounds.apply(percent_of(t.renewable, t.ge_total));
    let mut dependence = bounds.apply(percent_of(t.ge_total - t.renewable - t.fuel_cell, t.ge_total));
    let critical = bounds.apply(percent_of(t.ge_body, t.ge_total).min(dependence));

    if auto + dependence > 100.0 {
        let surplus = auto + dependence - 100.0;
        dependence = round2((dependence - surplus).max(0.0)).min((100.0 - auto).max(0.0));
    }
    let critical = critical.min(dependence);

    DistributionKpis {
        autoconsommation_percent: auto,
        dependance_reseau_percent: dependence,
        critical_ratio_percent: critical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::test_support::row_at;
    use proptest::prelude::*;

    fn row(pv: f64, battery: f64, fc: f64, ge_total: f64, ge_body: f64) -> Measurement {
        let mut m = row_at(0, 1.0);
        m.pv_power = pv;
        m.battery_power = battery;
        m.fc_power = fc;
        m.ge_power_total = ge_total;
        m.ge_power_body = ge_body;
        m
    }

    #[test]
    fn test_plain_ratios() {
        // renewable 50 / 100, dependence (100 - 50 - 5) / 100, critical 30 / 100
        let k = distribution_kpis(&[row(30.0, 20.0, 5.0, 100.0, 30.0)], &BoundedPercent::default());
        assert_eq!(k.autoconsommation_percent, 50.0);
        assert_eq!(k.dependance_reseau_percent, 45.0);
        assert_eq!(k.critical_ratio_percent, 30.0);
    }

    #[test]
    fn test_surplus_is_removed_from_dependence() {
        // auto 70, dependence (100 - 70 - 40) < 0 -> floor 40; 70 + 40 > 100 -> 30
        let k = distribution_kpis(&[row(50.0, 20.0, 40.0, 100.0, 90.0)], &BoundedPercent::default());
        assert_eq!(k.autoconsommation_percent, 70.0);
        assert_eq!(k.dependance_reseau_percent, 30.0);
        assert_eq!(k.critical_ratio_percent, 30.0);
    }

    #[test]
    fn test_zero_supply_uses_floor() {
        let k = distribution_kpis(&[row(0.0, 0.0, 0.0, 0.0, 0.0)], &BoundedPercent::default());
        assert_eq!(k.autoconsommation_percent, 40.0);
        assert_eq!(k.dependance_reseau_percent, 40.0);
        assert_eq!(k.critical_ratio_percent, 40.0);
    }

    proptest! {
        #[test]
        fn prop_distribution_invariants(
            rows in prop::collection::vec(
                (0.0f64..60.0, -120.0f64..120.0, 0.0f64..80.0, 0.0f64..400.0, 0.0f64..300.0),
                1..48,
            )
        ) {
            let rows: Vec<Measurement> = rows
                .into_iter()
                .map(|(pv, bat, fc, ge, body)| row(pv, bat, fc, ge, body))
                .collect();
            let k = distribution_kpis(&rows, &BoundedPercent::default());
            prop_assert!(k.autoconsommation_percent + k.dependance_reseau_percent <= 100.0 + 1e-9);
            prop_assert!(k.critical_ratio_percent <= k.dependance_reseau_percent);
            prop_assert!(k.dependance_reseau_percent >= 0.0);
        }

        #[test]
        fn prop_sum_holds_for_any_valid_bounds(
            floor in 0.01f64..100.0,
            spread in 0.0f64..=1.0,
            rows in prop::collection::vec(
                (0.0f64..60.0, -120.0f64..120.0, 0.0f64..80.0, 0.0f64..400.0, 0.0f64..300.0),
                1..24,
            )
        ) {
            let bounds = BoundedPercent { floor, ceiling: floor + (100.0 - floor) * spread };
            let rows: Vec<Measurement> = rows
                .into_iter()
                .map(|(pv, bat, fc, ge, body)| row(pv, bat, fc, ge, body))
                .collect();
            let k = distribution_kpis(&rows, &bounds);
            prop_assert!(k.autoconsommation_percent + k.dependance_reseau_percent <= 100.0 + 1e-9);
            prop_assert!(k.critical_ratio_percent <= k.dependance_reseau_percent);
        }
    }
}
