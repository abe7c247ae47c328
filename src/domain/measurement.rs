use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::channel::{Channel, CHANNEL_COUNT};

/// One cleaned, hourly sensor row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Measurement {
    pub timestamp: NaiveDateTime,
    pub battery_power: f64,
    pub battery_set_response: f64,
    pub pv_power: f64,
    pub ge_power_body: f64,
    pub ge_power_total: f64,
    pub ge_body_set_response: f64,
    pub fc_setpoint: f64,
    pub fc_power: f64,
    pub fc_set_response: f64,
    pub mccb_power: f64,
    pub mg_lv_voltage: f64,
    pub receiving_voltage: f64,
    pub mccb_voltage: f64,
    pub mccb_frequency: f64,
    pub mg_lv_frequency: f64,
    pub temp_inlet: f64,
    pub temp_outlet: f64,
}

impl Measurement {
    /// Build a row from values indexed by [`Channel::index`].
    pub fn from_values(timestamp: NaiveDateTime, v: [f64; CHANNEL_COUNT]) -> Self {
        Self {
            timestamp,
            battery_power: v[Channel::BatteryPower.index()],
            battery_set_response: v[Channel::BatterySetResponse.index()],
            pv_power: v[Channel::PvPower.index()],
            ge_power_body: v[Channel::GePowerBody.index()],
            ge_power_total: v[Channel::GePowerTotal.index()],
            ge_body_set_response: v[Channel::GeBodySetResponse.index()],
            fc_setpoint: v[Channel::FcSetpoint.index()],
            fc_power: v[Channel::FcPower.index()],
            fc_set_response: v[Channel::FcSetResponse.index()],
            mccb_power: v[Channel::MccbPower.index()],
            mg_lv_voltage: v[Channel::MgLvVoltage.index()],
            receiving_voltage: v[Channel::ReceivingVoltage.index()],
            mccb_voltage: v[Channel::MccbVoltage.index()],
            mccb_frequency: v[Channel::MccbFrequency.index()],
            mg_lv_frequency: v[Channel::MgLvFrequency.index()],
            temp_inlet: v[Channel::TempInlet.index()],
            temp_outlet: v[Channel::TempOutlet.index()],
        }
    }

    pub fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::BatteryPower => self.battery_power,
            Channel::BatterySetResponse => self.battery_set_response,
            Channel::PvPower => self.pv_power,
            Channel::GePowerBody => self.ge_power_body,
            Channel::GePowerTotal => self.ge_power_total,
            Channel::GeBodySetResponse => self.ge_body_set_response,
            Channel::FcSetpoint => self.fc_setpoint,
            Channel::FcPower => self.fc_power,
            Channel::FcSetResponse => self.fc_set_response,
            Channel::MccbPower => self.mccb_power,
            Channel::MgLvVoltage => self.mg_lv_voltage,
            Channel::ReceivingVoltage => self.receiving_voltage,
            Channel::MccbVoltage => self.mccb_voltage,
            Channel::MccbFrequency => self.mccb_frequency,
            Channel::MgLvFrequency => self.mg_lv_frequency,
            Channel::TempInlet => self.temp_inlet,
            Channel::TempOutlet => self.temp_outlet,
        }
    }

    pub fn values(&self) -> [f64; CHANNEL_COUNT] {
        let mut out = [0.0; CHANNEL_COUNT];
        for ch in Channel::all() {
            out[ch.index()] = self.get(ch);
        }
        out
    }

    /// Renewable supply at this instant (PV plus battery).
    pub fn renewable_power(&self) -> f64 {
        self.pv_power + self.battery_power
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_from_values_and_get_agree() {
        let ts = NaiveDate::from_ymd_opt(2025, 8, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let mut values = [0.0; CHANNEL_COUNT];
        for (i, v) in values.iter_mut().enumerate() {
            *v = i as f64 * 1.5;
        }

        let m = Measurement::from_values(ts, values);
        for ch in Channel::all() {
            assert_eq!(m.get(ch), ch.index() as f64 * 1.5);
        }
        assert_eq!(m.values(), values);
        assert_eq!(m.mg_lv_voltage, 15.0);
    }
}
