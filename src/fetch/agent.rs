use rand::Rng;

use crate::config::USER_AGENTS;

/// Chooses the `User-Agent` sent with each outbound request.
pub trait UserAgentSelector: Send + Sync {
    fn pick(&self) -> String;
}

/// Uniform pick from a fixed pool of real browser identities.
#[derive(Debug, Clone)]
pub struct RandomUserAgent {
    pool: Vec<String>,
}

impl RandomUserAgent {
    pub fn new(pool: Vec<String>) -> Self {
        Self { pool }
    }
}

impl Default for RandomUserAgent {
    fn default() -> Self {
        Self::new(USER_AGENTS.iter().map(|ua| ua.to_string()).collect())
    }
}

impl UserAgentSelector for RandomUserAgent {
    fn pick(&self) -> String {
        if self.pool.is_empty() {
            return USER_AGENTS[0].to_string();
        }
        let mut rng = rand::rng();
        self.pool[rng.random_range(0..self.pool.len())].clone()
    }
}

/// Always returns the same identity. Useful when a caller needs reproducible headers.
#[derive(Debug, Clone)]
pub struct FixedUserAgent(pub String);

impl UserAgentSelector for FixedUserAgent {
    fn pick(&self) -> String {
        self.0.clone()
    }
}
