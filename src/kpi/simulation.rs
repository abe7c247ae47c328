use serde::{Deserialize, Serialize};

use super::round2;

const NOMINAL_VOLTAGE: f64 = 400.0;
const NOMINAL_FREQUENCY: f64 = 50.0;
const ISLAND_FACTOR: f64 = 1.2;
const HOURS: u32 = 24;

/// What-if scenario, powers in kW.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationInput {
    pub consumption: f64,
    pub island_mode: bool,
    pub pv_production: f64,
    pub fc_production: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationPoint {
    pub hour: u32,
    pub simulated_voltage: f64,
    pub simulated_frequency: f64,
}

/// Bus voltage and frequency for a constant imbalance over one day.
///
/// Each 100 kW of deficit drops the voltage by 1 V and each 200 kW the
/// frequency by 1 Hz; island operation amplifies the drop.
pub fn simulate(input: &SimulationInput) -> Vec<SimulationPoint> {
    let net = input.consumption - (input.pv_production + input.fc_production);
    let factor = if input.island_mode { ISLAND_FACTOR } else { 1.0 };
    let voltage = round2(NOMINAL_VOLTAGE - net / 100.0 * factor);
    let frequency = round2(NOMINAL_FREQUENCY - net / 200.0 * factor);

    (0..HOURS)
        .map(|hour| SimulationPoint {
            hour,
            simulated_voltage: voltage,
            simulated_frequency: frequency,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_connected_deficit() {
        let points = simulate(&SimulationInput {
            consumption: 100.0,
            island_mode: false,
            pv_production: 0.0,
            fc_production: 0.0,
        });
        assert_eq!(points.len(), 24);
        assert_eq!(points[0].hour, 0);
        assert_eq!(points[0].simulated_voltage, 399.0);
        assert_eq!(points[0].simulated_frequency, 49.5);
        assert_eq!(points[23].hour, 23);
    }

    #[test]
    fn test_island_mode_amplifies() {
        let points = simulate(&SimulationInput {
            consumption: 300.0,
            island_mode: true,
            pv_production: 50.0,
            fc_production: 50.0,
        });
        assert_eq!(points[5].simulated_voltage, 397.6);
        assert_eq!(points[5].simulated_frequency, 48.8);
    }

    #[test]
    fn test_surplus_raises_voltage() {
        let points = simulate(&SimulationInput {
            consumption: 0.0,
            island_mode: false,
            pv_production: 50.0,
            fc_production: 0.0,
        });
        assert_eq!(points[0].simulated_voltage, 400.5);
        assert_eq!(points[0].simulated_frequency, 50.25);
    }
}
