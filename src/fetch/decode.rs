use std::fmt;
use std::io::Read;

use serde_json::{Map, Value};

use crate::chart::{
    lenient_i64, ChartMeta, ChartResponse, ChartResult, Indicators, QuoteSeries, TradingPeriods,
    TRADING_PERIODS_FIELD,
};
use crate::error::AppError;

use super::FetchResult;

/// Why the strict decode gave up.
#[derive(Debug)]
pub enum DecodeFailure {
    /// The error names `tradingPeriods`; a fresh body may be salvaged permissively.
    AmbiguousField(serde_json::Error),
    Other(serde_json::Error),
}

impl DecodeFailure {
    pub fn classify(err: serde_json::Error) -> Self {
        if err.to_string().contains(TRADING_PERIODS_FIELD) {
            DecodeFailure::AmbiguousField(err)
        } else {
            DecodeFailure::Other(err)
        }
    }

    pub fn is_ambiguous_field(&self) -> bool {
        matches!(self, DecodeFailure::AmbiguousField(_))
    }
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeFailure::AmbiguousField(err) => write!(f, "ambiguous field: {err}"),
            DecodeFailure::Other(err) => write!(f, "{err}"),
        }
    }
}

/// Decode a chart body against the typed schema, streaming from `body`.
pub fn decode_strict<R: Read>(body: R) -> Result<ChartResponse, DecodeFailure> {
    serde_json::from_reader(body).map_err(DecodeFailure::classify)
}

/// Decode a chart body as an untyped tree and salvage what can be read.
pub fn decode_permissive<R: Read>(body: R, symbol: &str) -> FetchResult<ChartResponse> {
    let root: Value = serde_json::from_reader(body).map_err(|source| {
        log::error!("Failed to decode raw JSON response for {}: {}", symbol, source);
        AppError::Decode {
            symbol: symbol.to_string(),
            source,
        }
    })?;
    salvage_chart(&root, symbol)
}

/// Rebuild a [`ChartResponse`] from the first result in `root`.
///
/// Timestamps that are not numbers are dropped. Price entries that are null or non-numeric
/// become `0.0`, and volumes become `0`. Trading periods are not reconstructed.
pub fn salvage_chart(root: &Value, symbol: &str) -> FetchResult<ChartResponse> {
    let results = walk_json_path(root, &["chart", "result"])
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::Fallback {
            symbol: symbol.to_string(),
        })?;

    let Some(first) = results.first() else {
        return Ok(ChartResponse::default());
    };

    let result = first.as_object().ok_or_else(|| AppError::Fallback {
        symbol: symbol.to_string(),
    })?;

    let timestamp = result
        .get("timestamp")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(lenient_i64).collect())
        .unwrap_or_default();

    let quote = walk_json_path(first, &["indicators", "quote"])
        .and_then(Value::as_array)
        .and_then(|quotes| quotes.first())
        .and_then(Value::as_object)
        .map(salvage_quote);

    let meta = result
        .get("meta")
        .and_then(Value::as_object)
        .map(salvage_meta)
        .unwrap_or_default();

    let mut response = ChartResponse::default();
    response.chart.result.push(ChartResult {
        meta,
        timestamp,
        indicators: Indicators {
            quote: quote.into_iter().collect(),
        },
    });
    Ok(response)
}

fn salvage_quote(quote: &Map<String, Value>) -> QuoteSeries {
    QuoteSeries {
        open: float_series(quote, "open"),
        high: float_series(quote, "high"),
        low: float_series(quote, "low"),
        close: float_series(quote, "close"),
        volume: integer_series(quote, "volume"),
    }
}

fn salvage_meta(meta: &Map<String, Value>) -> ChartMeta {
    let text = |key: &str| meta.get(key).and_then(Value::as_str).map(str::to_string);
    ChartMeta {
        symbol: text("symbol"),
        currency: text("currency"),
        timezone: text("timezone"),
        trading_periods: TradingPeriods::Absent,
        ..ChartMeta::default()
    }
}

fn float_series(object: &Map<String, Value>, key: &str) -> Vec<f64> {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .map(|value| value.as_f64().unwrap_or(0.0))
                .collect()
        })
        .unwrap_or_default()
}

fn integer_series(object: &Map<String, Value>, key: &str) -> Vec<i64> {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .map(|value| lenient_i64(value).unwrap_or(0))
                .collect()
        })
        .unwrap_or_default()
}

pub fn walk_json_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |cursor, key| cursor.get(*key))
}
