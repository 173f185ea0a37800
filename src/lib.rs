pub mod chart;
pub mod config;
pub mod error;
pub mod fetch;
pub mod records;
pub mod ticker;
pub mod utils;

pub use chart::ChartResponse;
pub use config::ClientConfig;
pub use error::{AppError, Result};
pub use fetch::{HistoryQuery, Session, YahooClient};
pub use records::{PriceRecord, TimeSeries};
pub use ticker::Ticker;
