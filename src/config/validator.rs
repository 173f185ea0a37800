use reqwest::header::HeaderValue;

use crate::error::{AppError, Result};

use super::ClientConfig;

/// Validate a client config and surface every problem in one error.
pub fn validate_client_config(config: &ClientConfig) -> Result<()> {
    let mut issues = Vec::new();

    validate_endpoints(config, &mut issues);
    validate_rotation(config, &mut issues);
    validate_headers(config, &mut issues);
    validate_user_agents(config, &mut issues);

    if issues.is_empty() {
        Ok(())
    } else {
        Err(AppError::message(format!(
            "client config invalid:\n  - {}",
            issues.join("\n  - ")
        )))
    }
}

fn validate_endpoints(config: &ClientConfig, issues: &mut Vec<String>) {
    for (label, url) in [
        ("base_url", &config.base_url),
        ("bootstrap_url", &config.bootstrap_url),
    ] {
        if url.trim().is_empty() {
            issues.push(format!("{label} must not be empty"));
        } else if reqwest::Url::parse(url).is_err() {
            issues.push(format!("{label} `{url}` is not a valid URL"));
        }
    }
}

fn validate_rotation(config: &ClientConfig, issues: &mut Vec<String>) {
    if config.rotate_threshold == 0 {
        issues.push("rotate_threshold must be at least 1".to_string());
    }
}

fn validate_headers(config: &ClientConfig, issues: &mut Vec<String>) {
    for (label, value) in [
        ("headers.accept", &config.accept),
        ("headers.accept_language", &config.accept_language),
        ("headers.referer", &config.referer),
        ("headers.connection", &config.connection),
    ] {
        if HeaderValue::from_str(value).is_err() {
            issues.push(format!("{label} is not a valid header value"));
        }
    }
}

fn validate_user_agents(config: &ClientConfig, issues: &mut Vec<String>) {
    if config.user_agents.is_empty() {
        issues.push("user_agents must contain at least one entry".to_string());
        return;
    }

    for (idx, agent) in config.user_agents.iter().enumerate() {
        if agent.trim().is_empty() || HeaderValue::from_str(agent).is_err() {
            issues.push(format!("user_agents[{idx}] is not a usable User-Agent"));
        }
    }
}
