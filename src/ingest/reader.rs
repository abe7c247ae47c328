use std::io::Read;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};

use super::{schema::HeaderLayout, IngestError};
use crate::domain::{Channel, CHANNEL_COUNT};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const MISSING_MARKERS: &[&str] = &["nan", "null", "na", "n/a", "none"];

/// One parsed source row before cleaning. `None` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub line: u64,
    pub timestamp: NaiveDateTime,
    pub values: [Option<f64>; CHANNEL_COUNT],
}

impl RawRow {
    pub fn get(&self, channel: Channel) -> Option<f64> {
        self.values[channel.index()]
    }
}

/// Parse every data row of a delimited source.
///
/// A source without a header line yields no rows.
pub fn read_rows<R: Read>(
    reader: R,
    source_name: &str,
    delimiter: u8,
) -> Result<Vec<RawRow>, IngestError> {
    let csv_err = |source| IngestError::Csv {
        source_name: source_name.to_string(),
        source,
    };

    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().map_err(csv_err)?.clone();
    if headers.iter().all(str::is_empty) {
        tracing::debug!(source = source_name, "Empty source");
        return Ok(Vec::new());
    }
    let layout = HeaderLayout::from_headers(&headers, source_name)?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(csv_err)?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(parse_record(&record, &layout, source_name)?);
    }
    Ok(rows)
}

fn parse_record(
    record: &StringRecord,
    layout: &HeaderLayout,
    source_name: &str,
) -> Result<RawRow, IngestError> {
    let line = record.position().map(|p| p.line()).unwrap_or_default();

    let raw_ts = record.get(layout.timestamp).unwrap_or_default();
    let timestamp = parse_timestamp(raw_ts).ok_or_else(|| IngestError::Timestamp {
        source_name: source_name.to_string(),
        line,
        value: raw_ts.to_string(),
    })?;

    let mut values = [None; CHANNEL_COUNT];
    for &(idx, channel) in &layout.channels {
        let cell = record.get(idx).unwrap_or_default();
        values[channel.index()] = parse_cell(cell).map_err(|source| IngestError::Number {
            source_name: source_name.to_string(),
            line,
            column: channel.name(),
            value: cell.to_string(),
            source,
        })?;
    }

    Ok(RawRow {
        line,
        timestamp,
        values,
    })
}

/// Parse a timestamp cell, dropping any UTC offset and keeping wall-clock time.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// `Ok(None)` for empty and missing markers, `Err` for anything unparsable.
pub fn parse_cell(value: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    let value = value.trim();
    if value.is_empty() || MISSING_MARKERS.iter().any(|m| value.eq_ignore_ascii_case(m)) {
        return Ok(None);
    }
    let v: f64 = value.parse()?;
    Ok(v.is_finite().then_some(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2022-08-01 10:00:00", "2022-08-01 10:00:00")]
    #[case("2022-08-01T10:00:00", "2022-08-01 10:00:00")]
    #[case("2022-08-01 10:00:00.250", "2022-08-01 10:00:00.250")]
    #[case("2022-08-01 10:00", "2022-08-01 10:00:00")]
    #[case("2022/08/01 10:00:00", "2022-08-01 10:00:00")]
    #[case("2022-08-01T10:00:00+02:00", "2022-08-01 10:00:00")]
    #[case("2022-08-01", "2022-08-01 00:00:00")]
    fn test_timestamp_forms(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(parse_timestamp(input).unwrap().to_string(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("NaN")]
    #[case("nan")]
    #[case("null")]
    #[case("NA")]
    fn test_missing_cells(#[case] cell: &str) {
        assert_eq!(parse_cell(cell).unwrap(), None);
    }

    #[test]
    fn test_numeric_cells() {
        assert_eq!(parse_cell(" -12.5 ").unwrap(), Some(-12.5));
        assert_eq!(parse_cell("0").unwrap(), Some(0.0));
        assert!(parse_cell("12kW").is_err());
    }

    #[test]
    fn test_read_rows_maps_columns() {
        let csv = "\
Timestamp,Battery_Active_Power,PVPCS_Active_Power,GE_Body_Active_Power,GE_Active_Power,FC_Active_Power_FC_END_Set,FC_Active_Power,Island_mode_MCCB_Active_Power,MG-LV-MSB_AC_Voltage,Island_mode_MCCB_AC_Voltage,Island_mode_MCCB_Frequency,MG-LV-MSB_Frequency,Extra
2022-08-01 10:00:00,1,2,3,4,5,6,7,470,471,60,60.2,junk
2022-08-01 11:00:00,,NaN,3,4,5,6,7,470,471,60,60.2,junk
";
        let rows = read_rows(csv.as_bytes(), "t.csv", b',').unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(Channel::PvPower), Some(2.0));
        assert_eq!(rows[0].get(Channel::MgLvFrequency), Some(60.2));
        assert_eq!(rows[0].get(Channel::TempInlet), None);
        assert_eq!(rows[1].get(Channel::BatteryPower), None);
        assert_eq!(rows[1].get(Channel::PvPower), None);
        assert_eq!(rows[1].line, 3);
    }

    #[test]
    fn test_read_rows_reports_bad_number() {
        let csv = "\
timestamp,battery_power,pv_power,ge_power_body,ge_power_total,fc_setpoint,fc_power,mccb_power,mg_lv_voltage,mccb_voltage,mccb_frequency,mg_lv_frequency
2022-08-01 10:00:00,1,oops,3,4,5,6,7,470,471,60,60
";
        let err = read_rows(csv.as_bytes(), "bad.csv", b',').unwrap_err();
        let cause = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(cause.as_deref(), Some("invalid float literal"));
        assert!(err.to_string().ends_with("invalid float literal"));
        match err {
            IngestError::Number { source_name, line, column, value, .. } => {
                assert_eq!(source_name, "bad.csv");
                assert_eq!(line, 2);
                assert_eq!(column, "pv_power");
                assert_eq!(value, "oops");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_read_rows_reports_bad_timestamp() {
        let csv = "\
timestamp,battery_power,pv_power,ge_power_body,ge_power_total,fc_setpoint,fc_power,mccb_power,mg_lv_voltage,mccb_voltage,mccb_frequency,mg_lv_frequency
yesterday,1,2,3,4,5,6,7,470,471,60,60
";
        let err = read_rows(csv.as_bytes(), "bad.csv", b',').unwrap_err();
        assert!(matches!(err, IngestError::Timestamp { line: 2, .. }));
    }

    #[test]
    fn test_empty_source_yields_no_rows() {
        assert!(read_rows("".as_bytes(), "empty.csv", b',').unwrap().is_empty());
    }

    #[test]
    fn test_semicolon_delimiter() {
        let csv = "\
timestamp;battery_power;pv_power;ge_power_body;ge_power_total;fc_setpoint;fc_power;mccb_power;mg_lv_voltage;mccb_voltage;mccb_frequency;mg_lv_frequency
2022-08-01 10:00:00;1;2;3;4;5;6;7;470;471;60;60
";
        let rows = read_rows(csv.as_bytes(), "semi.csv", b';').unwrap();
        assert_eq!(rows[0].get(Channel::MccbPower), Some(7.0));
    }
}
