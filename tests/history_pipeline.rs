use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use yahoo_finance_api::chart::TradingPeriods;
use yahoo_finance_api::fetch::{
    fetch_chart, fetch_history, spawn_history_fetch, FetchResult, HttpResponse, PreparedRequest,
};
use yahoo_finance_api::records::{assemble_in, VolumeBreakdown};
use yahoo_finance_api::{AppError, ClientConfig, HistoryQuery, Session, Ticker, YahooClient};

const CRUMB_PATH: &str = "/v1/test/getcrumb";

const DAILY_BODY: &str = r#"{"chart":{"result":[{
    "meta":{"symbol":"AAPL","currency":"USD","gmtoffset":-18000},
    "timestamp":[1700000000,1700086400],
    "indicators":{"quote":[{"open":[1.0,2.0],"high":[1.5,2.5],"low":[0.5,1.5],"close":[1.2,2.2],"volume":[100,200]}]}
}],"error":null}}"#;

/// Counts requests per kind and answers chart calls from a queue of bodies.
struct FakeYahoo {
    bootstrap_calls: AtomicUsize,
    crumb_calls: AtomicUsize,
    chart_calls: AtomicUsize,
    chart_bodies: Mutex<Vec<FetchResult<HttpResponse>>>,
}

impl FakeYahoo {
    fn new(mut bodies: Vec<FetchResult<HttpResponse>>) -> Arc<Self> {
        bodies.reverse();
        Arc::new(Self {
            bootstrap_calls: AtomicUsize::new(0),
            crumb_calls: AtomicUsize::new(0),
            chart_calls: AtomicUsize::new(0),
            chart_bodies: Mutex::new(bodies),
        })
    }

    fn respond(&self, request: &PreparedRequest) -> FetchResult<HttpResponse> {
        match request.url.host_str() {
            Some("cookies.test") => {
                self.bootstrap_calls.fetch_add(1, Ordering::SeqCst);
                Ok(HttpResponse::ok("").with_cookie("A3", "session"))
            }
            _ if request.url.path() == CRUMB_PATH => {
                let n = self.crumb_calls.fetch_add(1, Ordering::SeqCst);
                Ok(HttpResponse::ok(format!("crumb-{n}")))
            }
            _ => {
                self.chart_calls.fetch_add(1, Ordering::SeqCst);
                self.chart_bodies
                    .lock()
                    .unwrap()
                    .pop()
                    .unwrap_or_else(|| Ok(HttpResponse::ok(DAILY_BODY)))
            }
        }
    }

    fn chart_calls(&self) -> usize {
        self.chart_calls.load(Ordering::SeqCst)
    }
}

fn fake_config(rotate_threshold: u64) -> ClientConfig {
    ClientConfig {
        base_url: "http://yahoo.test".to_string(),
        bootstrap_url: "http://cookies.test".to_string(),
        rotate_threshold,
        ..ClientConfig::builtin()
    }
}

fn client_for(fake: &Arc<FakeYahoo>, rotate_threshold: u64) -> YahooClient {
    let fake = Arc::clone(fake);
    let transport = move |request: &PreparedRequest| fake.respond(request);
    YahooClient::builder()
        .config(fake_config(rotate_threshold))
        .transport(Arc::new(transport))
        .build()
        .unwrap()
}

fn client_sharing(fake: &Arc<FakeYahoo>, session: &Arc<Session>) -> YahooClient {
    let fake = Arc::clone(fake);
    let transport = move |request: &PreparedRequest| fake.respond(request);
    YahooClient::builder()
        .config(fake_config(1000))
        .session(Arc::clone(session))
        .transport(Arc::new(transport))
        .build()
        .unwrap()
}

#[test]
fn daily_history_is_keyed_by_date() {
    let fake = FakeYahoo::new(vec![]);
    let client = client_for(&fake, 1000);

    let chart = fetch_chart(&client, "AAPL", &HistoryQuery::new()).unwrap();
    let series = assemble_in(&chart, "1d", &Utc);

    assert_eq!(series.len(), 2);
    assert_eq!(series["2023-11-14"].close, 1.2);
    assert_eq!(series["2023-11-15"].volume, 200);
    assert_eq!(fake.bootstrap_calls.load(Ordering::SeqCst), 1);
    assert_eq!(client.session().crumb().as_deref(), Some("crumb-0"));
}

#[test]
fn ambiguous_trading_periods_retry_once_permissively() {
    let truncated = r#"{"chart":{"result":[{"meta":{"symbol":"AAPL","tradingPeriods":[[{"timezone":"EST""#;
    let fake = FakeYahoo::new(vec![Ok(HttpResponse::ok(truncated))]);
    let client = client_for(&fake, 1000);

    let series = fetch_history(&client, "AAPL", &HistoryQuery::new()).unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(fake.chart_calls(), 2);
    assert_eq!(client.session().call_count(), 2);
}

#[test]
fn other_decode_failures_surface_without_retry() {
    let fake = FakeYahoo::new(vec![Ok(HttpResponse::ok(
        r#"{"chart":{"result":[{"indicators":{"quote":[{"open":["x"]}]}}]}}"#,
    ))]);
    let client = client_for(&fake, 1000);

    let err = fetch_history(&client, "AAPL", &HistoryQuery::new()).unwrap_err();

    assert!(matches!(err, AppError::Decode { .. }), "got {err:?}");
    assert_eq!(fake.chart_calls(), 1);
    assert_eq!(client.session().call_count(), 1);
}

#[test]
fn fallback_without_result_array_fails() {
    let truncated = r#"{"chart":{"result":[{"meta":{"tradingPeriods":{"regular""#;
    let fake = FakeYahoo::new(vec![
        Ok(HttpResponse::ok(truncated)),
        Ok(HttpResponse::ok(r#"{"chart":{"error":null}}"#)),
    ]);
    let client = client_for(&fake, 1000);

    let err = fetch_history(&client, "AAPL", &HistoryQuery::new()).unwrap_err();

    assert!(matches!(err, AppError::Fallback { .. }), "got {err:?}");
    assert_eq!(fake.chart_calls(), 2);
}

#[test]
fn empty_result_is_no_data() {
    let fake = FakeYahoo::new(vec![Ok(HttpResponse::ok(
        r#"{"chart":{"result":[],"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
    ))]);
    let client = client_for(&fake, 1000);

    let err = fetch_history(&client, "ZZZZ", &HistoryQuery::new()).unwrap_err();

    assert!(err.is_no_data());
    assert_eq!(err.to_string(), "no data found for symbol: ZZZZ");
}

#[test]
fn keyed_trading_periods_decode_strictly() {
    let body = r#"{"chart":{"result":[{
        "meta":{"symbol":"AAPL","tradingPeriods":{"regular":[{"timezone":"EST","start":1700058600,"end":1700082000,"gmtoffset":-18000}]}},
        "timestamp":[1700000000],
        "indicators":{"quote":[{"open":[1.0],"high":[1.0],"low":[1.0],"close":[1.0],"volume":[1]}]}
    }]}}"#;
    let fake = FakeYahoo::new(vec![Ok(HttpResponse::ok(body))]);
    let client = client_for(&fake, 1000);

    let chart = fetch_chart(&client, "AAPL", &HistoryQuery::new()).unwrap();
    let meta = &chart.chart.result[0].meta;

    assert!(matches!(meta.trading_periods, TradingPeriods::Keyed(_)));
    assert_eq!(meta.trading_periods()[0][0].start, 1700058600);
    assert_eq!(fake.chart_calls(), 1);
}

#[test]
fn session_rotates_on_threshold() {
    let fake = FakeYahoo::new(vec![]);
    let client = client_for(&fake, 2);
    let query = HistoryQuery::new();

    fetch_history(&client, "AAPL", &query).unwrap();
    assert_eq!(fake.crumb_calls.load(Ordering::SeqCst), 1);

    fetch_history(&client, "AAPL", &query).unwrap();
    assert_eq!(fake.crumb_calls.load(Ordering::SeqCst), 2);
    assert_eq!(fake.bootstrap_calls.load(Ordering::SeqCst), 2);
    assert_eq!(client.session().crumb().as_deref(), Some("crumb-1"));

    fetch_history(&client, "AAPL", &query).unwrap();
    assert_eq!(fake.crumb_calls.load(Ordering::SeqCst), 2);
    assert_eq!(client.session().call_count(), 3);
}

#[test]
fn intraday_prepost_keeps_zero_volume_bars() {
    // 2024-01-02 at UTC-5: 08:00, 09:30, 16:30.
    let body = r#"{"chart":{"result":[{
        "meta":{"symbol":"AAPL","gmtoffset":-18000,"tradingPeriods":[[{"timezone":"EST","start":1704205800,"end":1704229200,"gmtoffset":-18000}]]},
        "timestamp":[1704200400,1704205800,1704231000],
        "indicators":{"quote":[{"open":[185.0,186.0,187.0],"high":[185.0,186.5,187.0],"low":[185.0,185.5,187.0],"close":[185.0,186.2,187.0],"volume":[0,1500,null]}]}
    }]}}"#;
    let fake = FakeYahoo::new(vec![Ok(HttpResponse::ok(body))]);
    let client = client_for(&fake, 1000);
    let query = HistoryQuery::new().range("1d").interval("1m").prepost(true);

    let chart = fetch_chart(&client, "AAPL", &query).unwrap();
    let series = assemble_in(&chart, "1m", &Utc);
    let breakdown = VolumeBreakdown::from_chart(&chart);

    assert_eq!(series.len(), 3);
    assert_eq!(series["2024-01-02 13:00:00"].volume, 0);
    assert_eq!(series["2024-01-02 14:30:00"].volume, 1500);
    assert_eq!(series["2024-01-02 21:30:00"].close, 187.0);
    assert_eq!(breakdown.total, 1500);
    assert!(breakdown.extended_hours_empty());
}

#[test]
fn transport_errors_propagate() {
    let fake = FakeYahoo::new(vec![Err(AppError::message("connection reset"))]);
    let client = client_for(&fake, 1000);

    let err = fetch_history(&client, "AAPL", &HistoryQuery::new()).unwrap_err();

    assert_eq!(err.to_string(), "connection reset");
    assert_eq!(fake.chart_calls(), 1);
}

#[test]
fn premarket_history_survives_extreme_volumes() {
    let body = r#"{"chart":{"result":[{
        "meta":{"symbol":"AAPL","gmtoffset":3600},
        "timestamp":[1704200400,1704205800,9223372036854775807],
        "indicators":{"quote":[{"open":[1.0,1.0,1.0],"high":[1.0,1.0,1.0],"low":[1.0,1.0,1.0],"close":[1.0,1.0,1.0],"volume":[9223372036854775807,1,9223372036854775807]}]}
    }]}}"#;
    let fake = FakeYahoo::new(vec![Ok(HttpResponse::ok(body))]);
    let ticker = Ticker::new("AAPL", Arc::new(client_for(&fake, 1000)));

    let series = ticker
        .history_with_premarket(&HistoryQuery::new().range("1d").interval("1m"))
        .unwrap();

    assert_eq!(series.len(), 2);
    assert!(series.values().any(|bar| bar.volume == i64::MAX));
}

#[test]
fn shared_session_survives_concurrent_first_use() {
    let fake = FakeYahoo::new(vec![]);
    let session = Arc::new(Session::new(1000));
    let clients = [
        Arc::new(client_sharing(&fake, &session)),
        Arc::new(client_sharing(&fake, &session)),
    ];

    let receivers: Vec<_> = (0..8)
        .map(|n| spawn_history_fetch(Arc::clone(&clients[n % 2]), "AAPL", HistoryQuery::new()))
        .collect();
    for rx in receivers {
        assert_eq!(rx.recv().unwrap().unwrap().len(), 2);
    }

    let crumb_calls = fake.crumb_calls.load(Ordering::SeqCst);
    assert_eq!(session.call_count(), 8);
    assert_eq!(fake.chart_calls(), 8);
    assert!((1..=8).contains(&crumb_calls), "crumb fetched {crumb_calls} times");
    assert!(session.crumb().is_some_and(|crumb| crumb.starts_with("crumb-")));
    assert!(!session.is_degraded());
}
