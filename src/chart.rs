//! Typed view of the `/v8/finance/chart/{symbol}` response.
//!
//! Upstream nulls are common inside these payloads, so sequences and nested objects treat
//! `null` like an absent value. `meta.tradingPeriods` changes shape between deployments and
//! is captured as [`TradingPeriods`], then resolved by trial parses.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Field name that marks a decode failure as recoverable by the permissive path.
pub const TRADING_PERIODS_FIELD: &str = "tradingPeriods";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChartResponse {
    #[serde(default)]
    pub chart: Chart,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Chart {
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: Vec<ChartResult>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChartError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChartResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub meta: ChartMeta,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: Vec<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub indicators: Indicators,
}

impl ChartResult {
    pub fn first_quote(&self) -> Option<&QuoteSeries> {
        self.indicators.quote.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub currency: Option<String>,
    pub symbol: Option<String>,
    pub exchange_name: Option<String>,
    pub full_exchange_name: Option<String>,
    pub instrument_type: Option<String>,
    pub first_trade_date: Option<i64>,
    pub regular_market_time: Option<i64>,
    pub has_pre_post_market_data: Option<bool>,
    #[serde(rename = "gmtoffset")]
    pub gmt_offset: Option<i32>,
    pub timezone: Option<String>,
    pub exchange_timezone_name: Option<String>,
    pub regular_market_price: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub regular_market_day_high: Option<f64>,
    pub regular_market_day_low: Option<f64>,
    pub regular_market_volume: Option<i64>,
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub chart_previous_close: Option<f64>,
    pub previous_close: Option<f64>,
    pub scale: Option<i32>,
    pub price_hint: Option<i32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_trading_period: CurrentTradingPeriod,
    #[serde(default)]
    pub trading_periods: TradingPeriods,
    pub data_granularity: Option<String>,
    pub range: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub valid_ranges: Vec<String>,
}

impl ChartMeta {
    /// Trading-period windows as a sequence of sessions, whatever shape upstream used.
    pub fn trading_periods(&self) -> Vec<Vec<TradingPeriod>> {
        self.trading_periods.periods()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CurrentTradingPeriod {
    #[serde(default)]
    pub pre: Option<TradingPeriod>,
    #[serde(default)]
    pub regular: Option<TradingPeriod>,
    #[serde(default)]
    pub post: Option<TradingPeriod>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TradingPeriod {
    pub timezone: String,
    pub start: i64,
    pub end: i64,
    #[serde(rename = "gmtoffset")]
    pub gmt_offset: i32,
}

impl TradingPeriod {
    /// Read a period from an untyped object. Missing or mistyped fields become zero values.
    pub fn from_object_lenient(object: &Map<String, Value>) -> Self {
        Self {
            timezone: object
                .get("timezone")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            start: object.get("start").and_then(lenient_i64).unwrap_or_default(),
            end: object.get("end").and_then(lenient_i64).unwrap_or_default(),
            gmt_offset: object
                .get("gmtoffset")
                .and_then(lenient_i64)
                .and_then(|offset| i32::try_from(offset).ok())
                .unwrap_or_default(),
        }
    }
}

/// Shapes observed for `meta.tradingPeriods`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TradingPeriods {
    /// `[[{..}, ..], ..]`: one inner list per session.
    Sessions(Vec<Vec<TradingPeriod>>),
    /// `{"pre": [..], "regular": [..], "post": [..]}` or any other object.
    Keyed(Map<String, Value>),
    #[default]
    Absent,
}

impl TradingPeriods {
    pub fn from_value(value: Value) -> Self {
        if let Ok(sessions) = Vec::<Vec<TradingPeriod>>::deserialize(&value) {
            return TradingPeriods::Sessions(sessions);
        }

        match value {
            Value::Object(map) => TradingPeriods::Keyed(map),
            Value::Null => TradingPeriods::Absent,
            other => {
                log::warn!(
                    "Failed to parse {}: unexpected {}",
                    TRADING_PERIODS_FIELD,
                    json_kind(&other)
                );
                TradingPeriods::Absent
            }
        }
    }

    pub fn periods(&self) -> Vec<Vec<TradingPeriod>> {
        match self {
            TradingPeriods::Sessions(sessions) => sessions.clone(),
            TradingPeriods::Keyed(map) => {
                let regular: Vec<TradingPeriod> = map
                    .get("regular")
                    .and_then(Value::as_array)
                    .map(|entries| {
                        entries
                            .iter()
                            .filter_map(Value::as_object)
                            .map(TradingPeriod::from_object_lenient)
                            .collect()
                    })
                    .unwrap_or_default();

                if regular.is_empty() {
                    Vec::new()
                } else {
                    vec![regular]
                }
            }
            TradingPeriods::Absent => Vec::new(),
        }
    }
}

impl<'de> Deserialize<'de> for TradingPeriods {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer).map_err(|err| {
            <D::Error as de::Error>::custom(format!("invalid {}: {}", TRADING_PERIODS_FIELD, err))
        })?;
        Ok(TradingPeriods::from_value(value))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Indicators {
    #[serde(default, deserialize_with = "null_as_default")]
    pub quote: Vec<QuoteSeries>,
}

/// Parallel OHLCV arrays. `null` entries are read as zero.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QuoteSeries {
    #[serde(default, deserialize_with = "nullable_f64s")]
    pub open: Vec<f64>,
    #[serde(default, deserialize_with = "nullable_f64s")]
    pub high: Vec<f64>,
    #[serde(default, deserialize_with = "nullable_f64s")]
    pub low: Vec<f64>,
    #[serde(default, deserialize_with = "nullable_f64s")]
    pub close: Vec<f64>,
    #[serde(default, deserialize_with = "nullable_i64s")]
    pub volume: Vec<i64>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_f64s<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Option<Vec<Option<f64>>> = Option::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

fn nullable_i64s<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Option<Vec<Option<i64>>> = Option::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

/// Integer view of any JSON number. Floats are truncated and out-of-range values saturate.
pub(crate) fn lenient_i64(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| value.as_f64().map(|v| v as i64))
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
