use thiserror::Error;

pub use anyhow::Context;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The chart body could not be decoded and the failure was not one the fallback path handles.
    #[error("failed to decode chart response for {symbol}: {source}")]
    Decode {
        symbol: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse response for symbol {symbol} even with fallback method")]
    Fallback { symbol: String },
    #[error("no data found for symbol: {symbol}")]
    NoData { symbol: String },
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn message<T: Into<String>>(msg: T) -> Self {
        AppError::Message(msg.into())
    }

    /// True for the "symbol returned nothing" outcome, as opposed to a transport or decode failure.
    pub fn is_no_data(&self) -> bool {
        matches!(self, AppError::NoData { .. })
    }
}
