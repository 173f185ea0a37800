use std::path::Path;
use std::time::Duration;

use crate::error::Result;

pub mod loader;
pub mod validator;

pub use loader::load_client_config;

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
pub const DEFAULT_BOOTSTRAP_URL: &str = "https://fc.yahoo.com";
pub const DEFAULT_ROTATE_THRESHOLD: u64 = 1000;
pub const DEFAULT_ACCEPT: &str = "application/json, text/plain, */*";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9,ko;q=0.8";
pub const DEFAULT_REFERER: &str = "https://finance.yahoo.com/";
pub const DEFAULT_CONNECTION: &str = "keep-alive";

/// Browser identities rotated across outbound requests.
pub const USER_AGENTS: &[&str] = &[
    // Chrome
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.6367.91 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.6367.91 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.6367.91 Safari/537.36",
    "Mozilla/5.0 (Linux; Android 13; SM-S918N) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.6367.91 Mobile Safari/537.36",
    // Firefox
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.4; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    // Safari
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
    // Edge
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.6367.91 Safari/537.36 Edg/124.0.2478.80",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.6367.91 Safari/537.36 Edg/124.0.2478.80",
    // Samsung Internet
    "Mozilla/5.0 (Linux; Android 14; SM-G991N) AppleWebKit/537.36 (KHTML, like Gecko) SamsungBrowser/25.0 Chrome/124.0.6367.91 Mobile Safari/537.36",
];

/// Endpoints, rotation policy and browser-mimicking headers used by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub bootstrap_url: String,
    /// Every `rotate_threshold`-th call clears cookies and crumb.
    pub rotate_threshold: u64,
    /// Transport-level timeout. `None` leaves requests unbounded.
    pub timeout_secs: Option<u64>,
    pub accept: String,
    pub accept_language: String,
    pub referer: String,
    pub connection: String,
    pub user_agents: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            bootstrap_url: DEFAULT_BOOTSTRAP_URL.to_string(),
            rotate_threshold: DEFAULT_ROTATE_THRESHOLD,
            timeout_secs: None,
            accept: DEFAULT_ACCEPT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            connection: DEFAULT_CONNECTION.to_string(),
            user_agents: USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
        }
    }
}

impl ClientConfig {
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Load a JSON config file, falling back to built-in values for omitted keys.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_client_config(path.as_ref())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn crumb_url(&self) -> String {
        format!("{}/v1/test/getcrumb", self.base_url.trim_end_matches('/'))
    }

    pub fn chart_url(&self, symbol: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}",
            self.base_url.trim_end_matches('/'),
            symbol
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_points_at_query2() {
        let config = ClientConfig::builtin();

        assert_eq!(config.rotate_threshold, 1000);
        assert_eq!(config.user_agents.len(), USER_AGENTS.len());
        assert_eq!(
            config.crumb_url(),
            "https://query2.finance.yahoo.com/v1/test/getcrumb"
        );
        assert!(config.timeout().is_none());
    }

    #[test]
    fn chart_url_ignores_trailing_slash() {
        let config = ClientConfig {
            base_url: "http://localhost:8080/".to_string(),
            ..ClientConfig::builtin()
        };

        assert_eq!(
            config.chart_url("AAPL"),
            "http://localhost:8080/v8/finance/chart/AAPL"
        );
    }
}
