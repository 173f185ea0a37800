use std::sync::Arc;

use crate::config::{validator, ClientConfig};

use super::agent::{RandomUserAgent, UserAgentSelector};
use super::request::{HttpResponse, HttpTransport, RequestExecutor, Transport};
use super::session::Session;
use super::FetchResult;

/// Entry point for data requests: every call rotates, bootstraps, then executes.
pub struct YahooClient {
    session: Arc<Session>,
    executor: RequestExecutor,
}

impl YahooClient {
    /// Client with built-in endpoints, a fresh session and the blocking HTTP transport.
    pub fn new() -> FetchResult<Self> {
        Self::builder().build()
    }

    pub fn builder() -> YahooClientBuilder {
        YahooClientBuilder::default()
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        self.executor.config()
    }

    /// Issue a GET against `url` with the shared session attached.
    ///
    /// `user_agent` pins the identity for this call instead of drawing from the pool.
    pub fn get(
        &self,
        url: &str,
        params: &[(String, String)],
        user_agent: Option<&str>,
    ) -> FetchResult<HttpResponse> {
        self.session.record_call_and_maybe_rotate();
        self.session.ensure_crumb(&self.executor);
        self.executor.execute(&self.session, url, params, user_agent)
    }
}

/// Assembles a [`YahooClient`] from explicit parts. Unset parts fall back to defaults.
#[derive(Default)]
pub struct YahooClientBuilder {
    config: Option<ClientConfig>,
    session: Option<Arc<Session>>,
    transport: Option<Arc<dyn Transport>>,
    user_agents: Option<Arc<dyn UserAgentSelector>>,
}

impl YahooClientBuilder {
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Share an existing session, e.g. between several clients in one process.
    #[must_use]
    pub fn session(mut self, session: Arc<Session>) -> Self {
        self.session = Some(session);
        self
    }

    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn user_agents(mut self, user_agents: Arc<dyn UserAgentSelector>) -> Self {
        self.user_agents = Some(user_agents);
        self
    }

    pub fn build(self) -> FetchResult<YahooClient> {
        let config = self.config.unwrap_or_default();
        validator::validate_client_config(&config)?;

        let session = self
            .session
            .unwrap_or_else(|| Arc::new(Session::from_config(&config)));

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(config.timeout())?),
        };

        let user_agents: Arc<dyn UserAgentSelector> = match self.user_agents {
            Some(user_agents) => user_agents,
            None => Arc::new(RandomUserAgent::new(config.user_agents.clone())),
        };

        let executor = RequestExecutor::new(config, transport, user_agents)?;
        Ok(YahooClient { session, executor })
    }
}
