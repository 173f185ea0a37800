use crate::utils::{parse_start_date, unix_now};

use super::request::QueryParams;

pub const DEFAULT_RANGE: &str = "1mo";
pub const DEFAULT_INTERVAL: &str = "1d";
/// Sent as `period1` when the caller's start date cannot be parsed.
pub const START_SENTINEL: &str = "default";

/// Parameters for one chart request.
///
/// `start` is a `YYYY-MM-DD` date before normalization and Unix seconds after it.
/// `end` is Unix seconds. Assigning `start` directly on a normalized query skips
/// re-parsing; use the [`start`](Self::start) setter instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub range: String,
    pub interval: String,
    pub start: String,
    pub end: String,
    pub prepost: bool,
    /// Pins the `User-Agent` for this query instead of drawing one per request.
    pub user_agent: Option<String>,
    start_resolved: bool,
}

impl HistoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn range(mut self, range: impl Into<String>) -> Self {
        self.range = range.into();
        self
    }

    #[must_use]
    pub fn interval(mut self, interval: impl Into<String>) -> Self {
        self.interval = interval.into();
        self
    }

    #[must_use]
    pub fn start(mut self, start: impl Into<String>) -> Self {
        self.start = start.into();
        self.start_resolved = false;
        self
    }

    #[must_use]
    pub fn end(mut self, end: impl Into<String>) -> Self {
        self.end = end.into();
        self
    }

    #[must_use]
    pub fn prepost(mut self, prepost: bool) -> Self {
        self.prepost = prepost;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Fill defaults and convert `start` to Unix seconds, using the current time for `end`.
    pub fn normalized(&self) -> Self {
        self.normalized_at(unix_now())
    }

    /// Same as [`normalized`](Self::normalized) with an explicit "now". Normalizing twice is a no-op.
    pub fn normalized_at(&self, now: i64) -> Self {
        let mut query = self.clone();

        if query.range.is_empty() && query.start.is_empty() {
            query.range = DEFAULT_RANGE.to_string();
        }
        if query.interval.is_empty() {
            query.interval = DEFAULT_INTERVAL.to_string();
        }
        if !query.start.is_empty() && !query.start_resolved {
            query.start = match parse_start_date(&query.start) {
                Ok(timestamp) => timestamp.to_string(),
                Err(err) => {
                    log::warn!("Failed to parse start date `{}`: {}", query.start, err);
                    START_SENTINEL.to_string()
                }
            };
        }
        if query.end.is_empty() {
            query.end = now.to_string();
        }
        query.start_resolved = true;

        query
    }

    /// Chart endpoint parameters in request order. Expects a normalized query.
    pub fn to_params(&self) -> QueryParams {
        let mut params = Vec::with_capacity(5);
        if !self.range.is_empty() {
            params.push(("range".to_string(), self.range.clone()));
        }
        params.push(("interval".to_string(), self.interval.clone()));
        params.push(("period1".to_string(), self.start.clone()));
        params.push(("period2".to_string(), self.end.clone()));
        params.push(("includePrePost".to_string(), self.prepost.to_string()));
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_718_000_000;

    #[test]
    fn empty_query_gets_defaults() {
        let query = HistoryQuery::new().normalized_at(NOW);

        assert_eq!(query.range, "1mo");
        assert_eq!(query.interval, "1d");
        assert_eq!(query.start, "");
        assert_eq!(query.end, NOW.to_string());
        assert!(!query.prepost);
        assert!(query.user_agent.is_none());
    }

    #[test]
    fn explicit_start_suppresses_default_range() {
        let query = HistoryQuery::new().start("2024-01-02").normalized_at(NOW);

        assert_eq!(query.range, "");
        assert_eq!(query.start, "1704153600");
    }

    #[test]
    fn unparseable_start_becomes_sentinel() {
        let query = HistoryQuery::new().start("Jan 2nd").normalized_at(NOW);
        assert_eq!(query.start, START_SENTINEL);
    }

    #[test]
    fn compact_dates_are_not_mistaken_for_timestamps() {
        let query = HistoryQuery::new().start("20240102").normalized_at(NOW);
        assert_eq!(query.start, START_SENTINEL);
        assert_eq!(query.to_params()[1], ("period1".to_string(), START_SENTINEL.to_string()));
    }

    #[test]
    fn setting_start_after_normalization_parses_again() {
        let query = HistoryQuery::new()
            .start("2024-01-02")
            .normalized_at(NOW)
            .start("2024-01-03")
            .normalized_at(NOW);
        assert_eq!(query.start, "1704240000");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = HistoryQuery::new()
            .start("2024-01-02")
            .end("1704240000")
            .normalized_at(NOW);
        assert_eq!(once.normalized_at(NOW + 60), once);
    }

    #[test]
    fn params_follow_chart_endpoint_order() {
        let params = HistoryQuery::new()
            .range("1d")
            .interval("1m")
            .prepost(true)
            .normalized_at(NOW)
            .to_params();

        let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["range", "interval", "period1", "period2", "includePrePost"]
        );
        assert_eq!(params[4].1, "true");
    }
}
