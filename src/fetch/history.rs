use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;

use crate::chart::ChartResponse;
use crate::error::AppError;
use crate::records::{assemble, TimeSeries, VolumeBreakdown};

use super::client::YahooClient;
use super::decode::{decode_permissive, decode_strict, DecodeFailure};
use super::query::HistoryQuery;
use super::FetchResult;

pub type HistoryReceiver = Receiver<FetchResult<TimeSeries>>;

/// Fetch and decode the chart for `symbol`.
///
/// A strict decode that trips on `tradingPeriods` is retried once with a fresh request and
/// decoded permissively. The retry is a full client call and counts toward rotation.
pub fn fetch_chart(
    client: &YahooClient,
    symbol: &str,
    query: &HistoryQuery,
) -> FetchResult<ChartResponse> {
    let query = query.normalized();
    let endpoint = client.config().chart_url(symbol);
    let params = query.to_params();
    let user_agent = query.user_agent.as_deref();

    let response = client.get(&endpoint, &params, user_agent)?;
    let chart = match decode_strict(response.body) {
        Ok(chart) => chart,
        Err(DecodeFailure::AmbiguousField(err)) => {
            log::warn!(
                "Strict decode failed for {}, retrying with fallback: {}",
                symbol,
                err
            );
            let retry = client.get(&endpoint, &params, user_agent)?;
            decode_permissive(retry.body, symbol)?
        }
        Err(DecodeFailure::Other(source)) => {
            log::error!("Failed to decode chart for {}: {}", symbol, source);
            return Err(AppError::Decode {
                symbol: symbol.to_string(),
                source,
            });
        }
    };

    if chart.chart.result.is_empty() {
        if let Some(description) = chart
            .chart
            .error
            .as_ref()
            .and_then(|error| error.description.as_deref())
        {
            log::warn!("Chart error for {}: {}", symbol, description);
        }
        return Err(AppError::NoData {
            symbol: symbol.to_string(),
        });
    }

    if query.prepost {
        let breakdown = VolumeBreakdown::from_chart(&chart);
        log::debug!(
            "{} volume: total={} bars={} non_zero={} pre={}/{} regular={}/{} post={}/{}",
            symbol,
            breakdown.total,
            breakdown.bars,
            breakdown.non_zero_bars,
            breakdown.pre.volume,
            breakdown.pre.non_zero_bars,
            breakdown.regular.volume,
            breakdown.regular.non_zero_bars,
            breakdown.post.volume,
            breakdown.post.non_zero_bars,
        );
    }

    Ok(chart)
}

/// Fetch `symbol` and assemble bars keyed by local time.
pub fn fetch_history(
    client: &YahooClient,
    symbol: &str,
    query: &HistoryQuery,
) -> FetchResult<TimeSeries> {
    let query = query.normalized();
    let chart = fetch_chart(client, symbol, &query)?;
    let series = assemble(&chart, &query.interval);
    log::info!("Fetched {} bars for {}", series.len(), symbol);
    Ok(series)
}

/// Run [`fetch_history`] on a worker thread and hand back the result over a channel.
pub fn spawn_history_fetch(
    client: Arc<YahooClient>,
    symbol: &str,
    query: HistoryQuery,
) -> HistoryReceiver {
    let symbol = symbol.to_string();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let result = fetch_history(&client, &symbol, &query);
        let _ = tx.send(result);
    });

    rx
}
