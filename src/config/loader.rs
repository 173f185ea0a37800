use std::{fs, path::Path};

use serde::Deserialize;

use crate::error::{Context, Result};

use super::{validator, ClientConfig};

/// Read a client config JSON file. Keys that are absent keep their built-in values.
pub fn load_client_config(path: &Path) -> Result<ClientConfig> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read client config JSON at {}", path.display()))?;

    let config = parse_client_config(&json)
        .with_context(|| format!("failed to parse client config JSON at {}", path.display()))?;

    validator::validate_client_config(&config)?;
    Ok(config)
}

pub fn parse_client_config(json: &str) -> serde_json::Result<ClientConfig> {
    let raw: RawClientConfig = serde_json::from_str(json)?;
    Ok(raw.into_client_config())
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawClientConfig {
    base_url: Option<String>,
    bootstrap_url: Option<String>,
    rotate_threshold: Option<u64>,
    timeout_secs: Option<u64>,
    #[serde(default)]
    headers: RawHeaders,
    user_agents: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHeaders {
    accept: Option<String>,
    accept_language: Option<String>,
    referer: Option<String>,
    connection: Option<String>,
}

impl RawClientConfig {
    fn into_client_config(self) -> ClientConfig {
        let defaults = ClientConfig::builtin();
        ClientConfig {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            bootstrap_url: self.bootstrap_url.unwrap_or(defaults.bootstrap_url),
            rotate_threshold: self.rotate_threshold.unwrap_or(defaults.rotate_threshold),
            timeout_secs: self.timeout_secs.or(defaults.timeout_secs),
            accept: self.headers.accept.unwrap_or(defaults.accept),
            accept_language: self
                .headers
                .accept_language
                .unwrap_or(defaults.accept_language),
            referer: self.headers.referer.unwrap_or(defaults.referer),
            connection: self.headers.connection.unwrap_or(defaults.connection),
            user_agents: self.user_agents.unwrap_or(defaults.user_agents),
        }
    }
}
