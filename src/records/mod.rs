use std::collections::HashMap;
use std::fmt::Display;

use chrono::{Local, TimeZone};
use serde::Serialize;

use crate::chart::ChartResponse;
use crate::utils::{format_time_key, is_date_interval};

pub mod volume;

pub use volume::VolumeBreakdown;

/// One OHLCV bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PriceRecord {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Bars keyed by formatted time. Iteration order is unspecified.
pub type TimeSeries = HashMap<String, PriceRecord>;

/// Build a [`TimeSeries`] from the first result, keying bars in the local time zone.
pub fn assemble(chart: &ChartResponse, interval: &str) -> TimeSeries {
    assemble_in(chart, interval, &Local)
}

/// Build a [`TimeSeries`] with keys rendered in `tz`.
///
/// Daily, weekly and monthly intervals key by date; everything else keys by date and time.
/// A price series shorter than `timestamp` yields zeros for the missing bars. When two
/// timestamps render to the same key, the later one wins.
pub fn assemble_in<Tz>(chart: &ChartResponse, interval: &str, tz: &Tz) -> TimeSeries
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut series = TimeSeries::new();

    let Some(result) = chart.chart.result.first() else {
        return series;
    };
    let Some(quote) = result.first_quote() else {
        return series;
    };

    let date_only = is_date_interval(interval);
    let price_at = |values: &[f64], idx: usize| values.get(idx).copied().unwrap_or(0.0);

    for (idx, &timestamp) in result.timestamp.iter().enumerate() {
        let Some(key) = format_time_key(timestamp, date_only, tz) else {
            log::debug!("Skipping out-of-range timestamp {}", timestamp);
            continue;
        };

        let record = PriceRecord {
            open: price_at(&quote.open, idx),
            high: price_at(&quote.high, idx),
            low: price_at(&quote.low, idx),
            close: price_at(&quote.close, idx),
            volume: quote.volume.get(idx).copied().unwrap_or(0),
        };

        series.insert(key, record);
    }

    series
}

/// Entries sorted by key, which is chronological for both key formats.
pub fn sorted_entries(series: &TimeSeries) -> Vec<(&String, &PriceRecord)> {
    let mut entries: Vec<_> = series.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}
