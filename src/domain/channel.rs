use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Number of numeric sensor channels carried by a [`Measurement`](super::Measurement).
pub const CHANNEL_COUNT: usize = 17;

/// Raw column name of the timestamp in data-logger exports.
pub const RAW_TIMESTAMP_COLUMN: &str = "Timestamp";

/// Canonical name of the timestamp field.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// A numeric sensor channel of the microgrid.
///
/// The discriminant doubles as the index into per-row value arrays, so the
/// declaration order is also the column order of the `measurements` table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Channel {
    BatteryPower = 0,
    BatterySetResponse,
    PvPower,
    GePowerBody,
    GePowerTotal,
    GeBodySetResponse,
    FcSetpoint,
    FcPower,
    FcSetResponse,
    MccbPower,
    MgLvVoltage,
    ReceivingVoltage,
    MccbVoltage,
    MccbFrequency,
    MgLvFrequency,
    TempInlet,
    TempOutlet,
}

/// Closed physical range a cleaned channel value must fall into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValidRange {
    pub min: f64,
    pub max: f64,
}

impl ValidRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

impl Channel {
    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical (database / JSON) field name.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Column name as written by the data-logging system.
    pub fn raw_column(self) -> &'static str {
        match self {
            Channel::BatteryPower => "Battery_Active_Power",
            Channel::BatterySetResponse => "Battery_Active_Power_Set_Response",
            Channel::PvPower => "PVPCS_Active_Power",
            Channel::GePowerBody => "GE_Body_Active_Power",
            Channel::GePowerTotal => "GE_Active_Power",
            Channel::GeBodySetResponse => "GE_Body_Active_Power_Set_Response",
            Channel::FcSetpoint => "FC_Active_Power_FC_END_Set",
            Channel::FcPower => "FC_Active_Power",
            Channel::FcSetResponse => "FC_Active_Power_FC_end_Set_Response",
            Channel::MccbPower => "Island_mode_MCCB_Active_Power",
            Channel::MgLvVoltage => "MG-LV-MSB_AC_Voltage",
            Channel::ReceivingVoltage => "Receiving_Point_AC_Voltage",
            Channel::MccbVoltage => "Island_mode_MCCB_AC_Voltage",
            Channel::MccbFrequency => "Island_mode_MCCB_Frequency",
            Channel::MgLvFrequency => "MG-LV-MSB_Frequency",
            Channel::TempInlet => "Inlet_Temperature_of_Chilled_Water",
            Channel::TempOutlet => "Outlet_Temperature",
        }
    }

    pub fn valid_range(self) -> ValidRange {
        match self {
            Channel::BatteryPower => ValidRange::new(-120.0, 120.0),
            Channel::BatterySetResponse => ValidRange::new(-60.0, 80.0),
            Channel::PvPower => ValidRange::new(0.0, 60.0),
            Channel::GePowerBody => ValidRange::new(0.0, 300.0),
            Channel::GePowerTotal => ValidRange::new(0.0, 400.0),
            Channel::GeBodySetResponse => ValidRange::new(0.0, 240.0),
            Channel::FcSetpoint | Channel::FcPower | Channel::FcSetResponse => {
                ValidRange::new(0.0, 80.0)
            }
            Channel::MccbPower => ValidRange::new(0.0, 400.0),
            Channel::MccbVoltage | Channel::ReceivingVoltage | Channel::MgLvVoltage => {
                ValidRange::new(460.0, 500.0)
            }
            Channel::MccbFrequency | Channel::MgLvFrequency => ValidRange::new(59.5, 61.0),
            Channel::TempInlet | Channel::TempOutlet => ValidRange::new(5.0, 35.0),
        }
    }

    /// Whether a source file must carry this column.
    ///
    /// Optional channels missing from a file are repaired like missing cells.
    pub fn is_required(self) -> bool {
        !matches!(
            self,
            Channel::BatterySetResponse
                | Channel::GeBodySetResponse
                | Channel::FcSetResponse
                | Channel::ReceivingVoltage
                | Channel::TempInlet
                | Channel::TempOutlet
        )
    }

    pub fn all() -> impl Iterator<Item = Channel> {
        Channel::iter()
    }

    /// Channels fed to the voltage forecast model, in model column order.
    ///
    /// Every channel except the forecast target `mg_lv_voltage`.
    pub fn forecast_features() -> impl Iterator<Item = Channel> {
        Channel::iter().filter(|c| *c != Channel::MgLvVoltage)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
