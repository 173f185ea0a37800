use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::ClientConfig;
use crate::error::AppError;

use super::request::{HttpResponse, RequestExecutor};
use super::FetchResult;

#[derive(Clone, Default)]
struct Credentials {
    cookies: BTreeMap<String, String>,
    crumb: Option<String>,
    bootstrap_attempted: bool,
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("cookies", &self.cookies.keys().collect::<Vec<_>>())
            .field("has_crumb", &self.crumb.is_some())
            .finish()
    }
}

/// Cookies, crumb and call counter shared by every request a client makes.
///
/// The counter and the rotation decision are serialized by one mutex. Cookie and crumb
/// bootstrap is not: concurrent first callers may each fetch a crumb, and the last write wins.
#[derive(Debug)]
pub struct Session {
    rotate_threshold: u64,
    calls: Mutex<u64>,
    credentials: RwLock<Credentials>,
}

impl Session {
    pub fn new(rotate_threshold: u64) -> Self {
        Self {
            rotate_threshold: rotate_threshold.max(1),
            calls: Mutex::new(0),
            credentials: RwLock::new(Credentials::default()),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.rotate_threshold)
    }

    pub fn rotate_threshold(&self) -> u64 {
        self.rotate_threshold
    }

    pub fn call_count(&self) -> u64 {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn crumb(&self) -> Option<String> {
        self.read().crumb.clone()
    }

    pub fn cookies(&self) -> BTreeMap<String, String> {
        self.read().cookies.clone()
    }

    /// `Cookie` header value for the cached cookies, if any.
    pub fn cookie_header(&self) -> Option<String> {
        let credentials = self.read();
        if credentials.cookies.is_empty() {
            return None;
        }
        Some(
            credentials
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// A bootstrap ran since the last rotation and left no crumb behind.
    pub fn is_degraded(&self) -> bool {
        let credentials = self.read();
        credentials.bootstrap_attempted && credentials.crumb.is_none()
    }

    pub fn insert_cookie(&self, name: impl Into<String>, value: impl Into<String>) {
        self.write().cookies.insert(name.into(), value.into());
    }

    pub fn set_crumb(&self, crumb: impl Into<String>) {
        let crumb = crumb.into();
        self.write().crumb = (!crumb.is_empty()).then_some(crumb);
    }

    /// Drop cookies and crumb so the next call bootstraps again.
    pub fn clear(&self) {
        *self.write() = Credentials::default();
    }

    /// Count one outbound call and wipe cookies and crumb on every threshold-th call.
    ///
    /// Returns `true` when this call triggered a rotation.
    pub fn record_call_and_maybe_rotate(&self) -> bool {
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        *calls += 1;

        if *calls % self.rotate_threshold != 0 {
            return false;
        }

        log::info!("Rotating Yahoo Finance session after {} calls", *calls);
        self.clear();
        true
    }

    /// Make sure a crumb is cached, bootstrapping cookies first when needed.
    ///
    /// Failures are logged and swallowed; later requests simply go out without a crumb.
    pub fn ensure_crumb(&self, executor: &RequestExecutor) {
        if self.read().crumb.is_some() {
            return;
        }

        self.ensure_cookies(executor);

        let crumb_url = executor.config().crumb_url();
        let fetched = executor
            .execute(self, &crumb_url, &[], None)
            .and_then(read_crumb);

        let mut credentials = self.write();
        credentials.bootstrap_attempted = true;
        match fetched {
            Ok(Some(crumb)) => {
                log::debug!("Fetched Yahoo Finance crumb");
                credentials.crumb = Some(crumb);
            }
            Ok(None) => {
                log::warn!("Crumb endpoint returned an empty body; continuing without crumb");
            }
            Err(err) => {
                log::error!("Failed to get crumb: {}", err);
            }
        }
    }

    fn ensure_cookies(&self, executor: &RequestExecutor) {
        if !self.read().cookies.is_empty() {
            return;
        }

        let bootstrap_url = executor.config().bootstrap_url.clone();
        match executor.execute(self, &bootstrap_url, &[], None) {
            Ok(response) if response.cookies.is_empty() => {
                log::warn!(
                    "Cookie bootstrap at {} returned no cookies (status {})",
                    bootstrap_url,
                    response.status
                );
            }
            Ok(response) => {
                let mut credentials = self.write();
                credentials.cookies = response.cookies.into_iter().collect();
            }
            Err(err) => {
                log::error!("Failed to get cookie: {}", err);
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Credentials> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Credentials> {
        self.credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_crumb(response: HttpResponse) -> FetchResult<Option<String>> {
    let status = response.status;
    let body = response.text()?;
    if !status.is_success() {
        return Err(AppError::message(format!(
            "crumb endpoint returned status {}",
            status
        )));
    }

    let crumb = body.trim();
    Ok((!crumb.is_empty()).then(|| crumb.to_string()))
}
