use std::sync::Arc;

use crate::chart::ChartResponse;
use crate::fetch::{fetch_chart, fetch_history, FetchResult, HistoryQuery, YahooClient};
use crate::records::TimeSeries;

/// A symbol bound to a shared client.
#[derive(Clone)]
pub struct Ticker {
    symbol: String,
    client: Arc<YahooClient>,
}

impl Ticker {
    pub fn new(symbol: impl Into<String>, client: Arc<YahooClient>) -> Self {
        Self {
            symbol: symbol.into(),
            client,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn history(&self, query: &HistoryQuery) -> FetchResult<TimeSeries> {
        fetch_history(&self.client, &self.symbol, query)
    }

    /// Like [`history`](Self::history) with pre- and post-market bars included.
    pub fn history_with_premarket(&self, query: &HistoryQuery) -> FetchResult<TimeSeries> {
        let query = query.clone().prepost(true);
        fetch_history(&self.client, &self.symbol, &query)
    }

    /// The decoded chart, for callers that need `meta` or raw arrays.
    pub fn chart(&self, query: &HistoryQuery) -> FetchResult<ChartResponse> {
        fetch_chart(&self.client, &self.symbol, query)
    }
}
