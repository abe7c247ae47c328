use serde::Serialize;

use super::round2;
use crate::domain::Measurement;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NetworkKpis {
    pub avg_mg_voltage: f64,
    pub avg_mg_frequency: f64,
    pub max_voltage_diff_mccb_bus: f64,
}

/// Bus voltage and frequency averages plus the worst bus/breaker voltage gap.
pub fn network_kpis(rows: &[Measurement]) -> Option<NetworkKpis> {
    if rows.is_empty() {
        return None;
    }
    let n = rows.len() as f64;
    let avg_voltage = rows.iter().map(|m| m.mg_lv_voltage).sum::<f64>() / n;
    let avg_frequency = rows.iter().map(|m| m.mg_lv_frequency).sum::<f64>() / n;
    let max_diff = rows
        .iter()
        .map(|m| (m.mg_lv_voltage - m.mccb_voltage).abs())
        .fold(0.0, f64::max);

    Some(NetworkKpis {
        avg_mg_voltage: round2(avg_voltage),
        avg_mg_frequency: round2(avg_frequency),
        max_voltage_diff_mccb_bus: round2(max_diff),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::test_support::row_at;

    #[test]
    fn test_network_kpis() {
        let mut a = row_at(0, 1.0);
        a.mg_lv_voltage = 480.0;
        a.mccb_voltage = 478.5;
        a.mg_lv_frequency = 60.1;
        let mut b = row_at(1, 1.0);
        b.mg_lv_voltage = 470.0;
        b.mccb_voltage = 476.25;
        b.mg_lv_frequency = 59.9;

        let k = network_kpis(&[a, b]).unwrap();
        assert_eq!(k.avg_mg_voltage, 475.0);
        assert_eq!(k.avg_mg_frequency, 60.0);
        assert_eq!(k.max_voltage_diff_mccb_bus, 6.25);
    }

    #[test]
    fn test_no_rows() {
        assert!(network_kpis(&[]).is_none());
    }
}
