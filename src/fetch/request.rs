use std::fmt;
use std::io::{Cursor, Read};
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, COOKIE, REFERER, SET_COOKIE,
    USER_AGENT,
};
use reqwest::{StatusCode, Url};

use crate::config::ClientConfig;
use crate::error::Context;

use super::agent::UserAgentSelector;
use super::session::Session;
use super::FetchResult;

/// Ordered query parameters, appended to the URL as given.
pub type QueryParams = Vec<(String, String)>;

#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub url: Url,
    pub headers: HeaderMap,
}

impl PreparedRequest {
    pub fn query_value(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.into_owned())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Status, cookies and an unread body. Dropping the value releases the underlying connection.
pub struct HttpResponse {
    pub status: StatusCode,
    pub cookies: Vec<(String, String)>,
    pub body: Box<dyn Read + Send>,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Read + Send + 'static) -> Self {
        Self {
            status,
            cookies: Vec::new(),
            body: Box::new(body),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, Cursor::new(body.into()))
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    pub fn text(mut self) -> FetchResult<String> {
        let mut text = String::new();
        self.body.read_to_string(&mut text)?;
        Ok(text)
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("cookies", &self.cookies)
            .finish()
    }
}

/// Sends one prepared GET request.
pub trait Transport: Send + Sync {
    fn send(&self, request: &PreparedRequest) -> FetchResult<HttpResponse>;
}

impl<F> Transport for F
where
    F: Fn(&PreparedRequest) -> FetchResult<HttpResponse> + Send + Sync,
{
    fn send(&self, request: &PreparedRequest) -> FetchResult<HttpResponse> {
        self(request)
    }
}

/// Blocking reqwest transport. Redirects and TLS follow reqwest defaults; cookies are managed by [`Session`].
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to construct blocking HTTP client")?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &PreparedRequest) -> FetchResult<HttpResponse> {
        let response = self
            .client
            .get(request.url.clone())
            .headers(request.headers.clone())
            .send()?;

        let cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(parse_set_cookie)
            .collect();

        Ok(HttpResponse {
            status: response.status(),
            cookies,
            body: Box::new(response),
        })
    }
}

/// Extract `name=value` from a `Set-Cookie` header, dropping its attributes.
pub fn parse_set_cookie(header: &str) -> Option<(String, String)> {
    let pair = header.split(';').next()?;
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

/// Builds browser-like requests carrying the session's cookies and crumb.
pub struct RequestExecutor {
    config: ClientConfig,
    fixed_headers: HeaderMap,
    transport: Arc<dyn Transport>,
    user_agents: Arc<dyn UserAgentSelector>,
}

impl RequestExecutor {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        user_agents: Arc<dyn UserAgentSelector>,
    ) -> FetchResult<Self> {
        let fixed_headers = build_fixed_headers(&config)?;
        Ok(Self {
            config,
            fixed_headers,
            transport,
            user_agents,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Issue one request. The body is returned unread.
    pub fn execute(
        &self,
        session: &Session,
        url: &str,
        params: &[(String, String)],
        user_agent: Option<&str>,
    ) -> FetchResult<HttpResponse> {
        let request = self.prepare(session, url, params, user_agent)?;
        log::debug!("GET {}", request.url);

        self.transport.send(&request).map_err(|err| {
            log::error!("Failed to get data from Yahoo Finance API: {}", err);
            err
        })
    }

    pub fn prepare(
        &self,
        session: &Session,
        url: &str,
        params: &[(String, String)],
        user_agent: Option<&str>,
    ) -> FetchResult<PreparedRequest> {
        let mut url = Url::parse(url).with_context(|| format!("Invalid request URL: {}", url))?;

        let crumb = session.crumb();
        if !params.is_empty() || crumb.is_some() {
            let mut query = url.query_pairs_mut();
            query.extend_pairs(params.iter());
            if let Some(crumb) = &crumb {
                query.append_pair("crumb", crumb);
            }
        }

        let mut headers = self.fixed_headers.clone();

        let agent = match user_agent {
            Some(agent) => agent.to_string(),
            None => self.user_agents.pick(),
        };
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&agent).context("Invalid User-Agent header value")?,
        );

        if let Some(cookie) = session.cookie_header() {
            headers.insert(
                COOKIE,
                HeaderValue::from_str(&cookie).context("Invalid cookie header value")?,
            );
        }

        Ok(PreparedRequest { url, headers })
    }
}

fn build_fixed_headers(config: &ClientConfig) -> FetchResult<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in [
        (ACCEPT_LANGUAGE, &config.accept_language),
        (ACCEPT, &config.accept),
        (REFERER, &config.referer),
        (CONNECTION, &config.connection),
    ] {
        let header_value = HeaderValue::from_str(value)
            .with_context(|| format!("Invalid header value for {}", name))?;
        map.insert(name, header_value);
    }
    Ok(map)
}
