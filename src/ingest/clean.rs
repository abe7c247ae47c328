//! Cleaning pipeline: year rewrite, hourly resampling, gap repair, clamping.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike};
use rand::Rng;

use super::{GapFill, IngestError, RawRow};
use crate::{
    config::{IngestConfig, YearRewrite},
    domain::{Channel, Measurement, CHANNEL_COUNT},
};

type Values = [Option<f64>; CHANNEL_COUNT];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleanOptions {
    pub year_rewrite: Option<YearRewrite>,
    pub gap_fill: GapFill,
}

impl From<&IngestConfig> for CleanOptions {
    fn from(cfg: &IngestConfig) -> Self {
        Self {
            year_rewrite: cfg.active_year_rewrite(),
            gap_fill: cfg.gap_fill,
        }
    }
}

/// Run the full cleaning pipeline over the rows of one source.
///
/// Every returned row carries all channels, each within its valid range.
pub fn clean(
    rows: Vec<RawRow>,
    source_name: &str,
    opts: &CleanOptions,
    rng: &mut impl Rng,
) -> Result<Vec<Measurement>, IngestError> {
    let mut normalized = Vec::with_capacity(rows.len());
    for row in rows {
        let timestamp = rewrite_year(row.timestamp, opts.year_rewrite).ok_or_else(|| {
            IngestError::YearRewrite {
                source_name: source_name.to_string(),
                timestamp: row.timestamp,
                year: opts.year_rewrite.map(|r| r.to).unwrap_or_default(),
            }
        })?;
        normalized.push((timestamp, row.values));
    }

    let hourly = resample_hourly(normalized);
    if hourly.is_empty() {
        return Ok(Vec::new());
    }

    let (timestamps, mut columns) = split_columns(hourly);
    for channel in Channel::all() {
        let column = &mut columns[channel.index()];
        match opts.gap_fill {
            GapFill::Random => randomize(column, channel, rng),
            GapFill::Mean => fill_with_mean(column, channel, rng),
        }
    }

    Ok(timestamps
        .into_iter()
        .enumerate()
        .map(|(i, ts)| {
            let mut values = [0.0; CHANNEL_COUNT];
            for channel in Channel::all() {
                let raw = columns[channel.index()][i].unwrap_or_default();
                values[channel.index()] = channel.valid_range().clamp(raw);
            }
            Measurement::from_values(ts, values)
        })
        .collect())
}

/// Move timestamps of the configured source year to the target year.
///
/// `None` when the date does not exist in the target year (29 February).
pub fn rewrite_year(ts: NaiveDateTime, rewrite: Option<YearRewrite>) -> Option<NaiveDateTime> {
    match rewrite {
        Some(r) if r.enabled && ts.year() == r.from => ts.with_year(r.to),
        _ => Some(ts),
    }
}

pub fn truncate_to_hour(ts: NaiveDateTime) -> NaiveDateTime {
    ts.date().and_time(NaiveTime::MIN) + Duration::hours(i64::from(ts.hour()))
}

#[derive(Default)]
struct Bucket {
    sum: [f64; CHANNEL_COUNT],
    count: [u32; CHANNEL_COUNT],
}

/// Mean per one-hour bucket over present values, on a contiguous hourly grid
/// from the first to the last bucket. Empty hours come out all-missing.
pub fn resample_hourly(rows: Vec<(NaiveDateTime, Values)>) -> Vec<(NaiveDateTime, Values)> {
    let mut buckets: BTreeMap<NaiveDateTime, Bucket> = BTreeMap::new();
    for (ts, values) in rows {
        let bucket = buckets.entry(truncate_to_hour(ts)).or_default();
        for (i, v) in values.iter().enumerate() {
            if let Some(v) = v {
                bucket.sum[i] += v;
                bucket.count[i] += 1;
            }
        }
    }

    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut hour = first;
    while hour <= last {
        let values = match buckets.get(&hour) {
            Some(b) => std::array::from_fn(|i| (b.count[i] > 0).then(|| b.sum[i] / f64::from(b.count[i]))),
            None => [None; CHANNEL_COUNT],
        };
        out.push((hour, values));
        hour += Duration::hours(1);
    }
    out
}

fn split_columns(
    rows: Vec<(NaiveDateTime, Values)>,
) -> (Vec<NaiveDateTime>, Vec<Vec<Option<f64>>>) {
    let mut timestamps = Vec::with_capacity(rows.len());
    let mut columns = vec![Vec::with_capacity(rows.len()); CHANNEL_COUNT];
    for (ts, values) in rows {
        timestamps.push(ts);
        for (i, v) in values.into_iter().enumerate() {
            columns[i].push(v);
        }
    }
    (timestamps, columns)
}

fn needs_repair(v: Option<f64>) -> bool {
    v.map_or(true, |x| x == 0.0)
}

/// Replace zero and missing values by a uniform draw from the channel range.
pub fn randomize(column: &mut [Option<f64>], channel: Channel, rng: &mut impl Rng) {
    let range = channel.valid_range();
    for v in column.iter_mut().filter(|v| needs_repair(**v)) {
        *v = Some(rng.gen_range(range.min..=range.max));
    }
}

/// Replace zero and missing values by the mean of the remaining values,
/// falling back to [`randomize`] for a column with nothing to average.
pub fn fill_with_mean(column: &mut [Option<f64>], channel: Channel, rng: &mut impl Rng) {
    let present: Vec<f64> = column
        .iter()
        .filter(|v| !needs_repair(**v))
        .flatten()
        .copied()
        .collect();
    if present.is_empty() {
        randomize(column, channel, rng);
        return;
    }
    let mean = present.iter().sum::<f64>() / present.len() as f64;
    for v in column.iter_mut().filter(|v| needs_repair(**v)) {
        *v = Some(mean);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn raw(at: &str, fill: f64) -> RawRow {
        RawRow {
            line: 0,
            timestamp: ts(at),
            values: [Some(fill); CHANNEL_COUNT],
        }
    }

    fn opts(gap_fill: GapFill) -> CleanOptions {
        CleanOptions {
            year_rewrite: Some(YearRewrite::new(2022, 2025)),
            gap_fill,
        }
    }

    #[test]
    fn test_year_rewrite() {
        let rw = Some(YearRewrite::new(2022, 2025));
        assert_eq!(
            rewrite_year(ts("2022-08-01 10:00:00"), rw),
            Some(ts("2025-08-01 10:00:00"))
        );
        assert_eq!(
            rewrite_year(ts("2023-01-01 00:00:00"), rw),
            Some(ts("2023-01-01 00:00:00"))
        );
        assert_eq!(
            rewrite_year(ts("2022-08-01 10:00:00"), None),
            Some(ts("2022-08-01 10:00:00"))
        );
    }

    #[test]
    fn test_disabled_rewrite_keeps_source_year() {
        let cfg = IngestConfig {
            year_rewrite: Some(YearRewrite {
                enabled: false,
                ..YearRewrite::new(2022, 2025)
            }),
            ..IngestConfig::default()
        };
        let o = CleanOptions::from(&cfg);
        assert_eq!(o.year_rewrite, None);
        let out = clean(vec![raw("2022-08-01 10:00:00", 1.0)], "t.csv", &o, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(out[0].timestamp, ts("2022-08-01 10:00:00"));
    }

    #[test]
    fn test_leap_day_rewrite_fails() {
        let rows = vec![raw("2024-02-29 10:00:00", 1.0)];
        let o = CleanOptions {
            year_rewrite: Some(YearRewrite::new(2024, 2025)),
            gap_fill: GapFill::Random,
        };
        let err = clean(rows, "leap.csv", &o, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, IngestError::YearRewrite { year: 2025, .. }));
    }

    #[test]
    fn test_resample_averages_within_hour() {
        let mut a = [None; CHANNEL_COUNT];
        a[Channel::PvPower.index()] = Some(10.0);
        let mut b = [None; CHANNEL_COUNT];
        b[Channel::PvPower.index()] = Some(20.0);

        let out = resample_hourly(vec![
            (ts("2025-08-01 10:05:00"), a),
            (ts("2025-08-01 10:55:00"), b),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, ts("2025-08-01 10:00:00"));
        assert_eq!(out[0].1[Channel::PvPower.index()], Some(15.0));
        assert_eq!(out[0].1[Channel::TempInlet.index()], None);
    }

    #[test]
    fn test_resample_ignores_missing_inputs() {
        let mut a = [None; CHANNEL_COUNT];
        a[Channel::FcPower.index()] = Some(30.0);
        let b = [None; CHANNEL_COUNT];
        let out = resample_hourly(vec![(ts("2025-08-01 10:05:00"), a), (ts("2025-08-01 10:15:00"), b)]);
        assert_eq!(out[0].1[Channel::FcPower.index()], Some(30.0));
    }

    #[test]
    fn test_resample_fills_hour_grid() {
        let out = resample_hourly(vec![
            (ts("2025-08-01 12:30:00"), [Some(1.0); CHANNEL_COUNT]),
            (ts("2025-08-01 10:10:00"), [Some(1.0); CHANNEL_COUNT]),
        ]);
        let hours: Vec<String> = out.iter().map(|(t, _)| t.format("%H").to_string()).collect();
        assert_eq!(hours, vec!["10", "11", "12"]);
        assert!(out[1].1.iter().all(Option::is_none));
    }

    #[test]
    fn test_randomize_repairs_zero_and_missing() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut pv = vec![Some(0.0), Some(12.0)];
        randomize(&mut pv, Channel::PvPower, &mut rng);
        assert!((0.0..=60.0).contains(&pv[0].unwrap()));
        assert_eq!(pv[1], Some(12.0));

        let mut inlet = vec![None];
        randomize(&mut inlet, Channel::TempInlet, &mut rng);
        assert!((5.0..=35.0).contains(&inlet[0].unwrap()));
    }

    #[test]
    fn test_mean_fill() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut col = vec![Some(10.0), None, Some(0.0), Some(20.0)];
        fill_with_mean(&mut col, Channel::GePowerTotal, &mut rng);
        assert_eq!(col, vec![Some(10.0), Some(15.0), Some(15.0), Some(20.0)]);

        let mut empty = vec![None, Some(0.0)];
        fill_with_mean(&mut empty, Channel::MccbVoltage, &mut rng);
        assert!(empty.iter().all(|v| (460.0..=500.0).contains(&v.unwrap())));
    }

    #[test]
    fn test_clean_clamps_out_of_range() {
        let rows = vec![raw("2022-08-01 10:00:00", 1000.0)];
        let out = clean(rows, "t.csv", &opts(GapFill::Random), &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].timestamp, ts("2025-08-01 10:00:00"));
        assert_eq!(out[0].battery_power, 120.0);
        assert_eq!(out[0].pv_power, 60.0);
        assert_eq!(out[0].mccb_frequency, 61.0);
        assert_eq!(out[0].temp_outlet, 35.0);
    }

    #[test]
    fn test_seeded_clean_is_reproducible() {
        let rows = vec![raw("2023-05-01 00:00:00", 0.0), raw("2023-05-01 03:00:00", 0.0)];
        let a = clean(rows.clone(), "t.csv", &opts(GapFill::Random), &mut StdRng::seed_from_u64(9)).unwrap();
        let b = clean(rows, "t.csv", &opts(GapFill::Random), &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a.len(), 4);
        assert_eq!(a, b);
    }

    #[test]
    fn test_clean_empty_input() {
        let out = clean(Vec::new(), "t.csv", &opts(GapFill::Mean), &mut StdRng::seed_from_u64(1)).unwrap();
        assert!(out.is_empty());
    }

    fn cell() -> impl Strategy<Value = Option<f64>> {
        prop_oneof![
            Just(None),
            Just(Some(0.0)),
            (-1.0e4f64..1.0e4).prop_map(Some),
            (-600.0f64..600.0).prop_map(Some),
        ]
    }

    fn raw_rows() -> impl Strategy<Value = Vec<RawRow>> {
        prop::collection::vec(
            (0i64..72 * 60, prop::collection::vec(cell(), CHANNEL_COUNT)),
            0..40,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .map(|(minute, cells)| {
                    let mut values = [None; CHANNEL_COUNT];
                    values.copy_from_slice(&cells);
                    RawRow {
                        line: 0,
                        timestamp: ts("2022-06-01 00:00:00") + Duration::minutes(minute),
                        values,
                    }
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_cleaned_rows_within_ranges(rows in raw_rows(), seed in any::<u64>(), mean in any::<bool>()) {
            let gap_fill = if mean { GapFill::Mean } else { GapFill::Random };
            let mut rng = StdRng::seed_from_u64(seed);
            let out = clean(rows, "prop.csv", &opts(gap_fill), &mut rng).unwrap();
            for m in &out {
                for ch in Channel::all() {
                    let v = m.get(ch);
                    prop_assert!(v.is_finite());
                    prop_assert!(ch.valid_range().contains(v), "{} = {} out of range", ch, v);
                }
            }
            for pair in out.windows(2) {
                prop_assert_eq!(pair[1].timestamp - pair[0].timestamp, Duration::hours(1));
            }
        }
    }
}
