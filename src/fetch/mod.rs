use crate::error::Result;

pub mod agent;
pub mod client;
pub mod decode;
pub mod history;
pub mod query;
pub mod request;
pub mod session;

pub use agent::{FixedUserAgent, RandomUserAgent, UserAgentSelector};
pub use client::{YahooClient, YahooClientBuilder};
pub use decode::{decode_permissive, decode_strict, DecodeFailure};
pub use history::{fetch_chart, fetch_history, spawn_history_fetch, HistoryReceiver};
pub use query::HistoryQuery;
pub use request::{
    HttpResponse, HttpTransport, PreparedRequest, QueryParams, RequestExecutor, Transport,
};
pub use session::Session;

pub type FetchResult<T> = Result<T>;
