//! # Service Configuration
//!
//! Maps a service name to the base URL its operation patterns are appended
//! to, and to an optional per-service timeout. A missing base URL is a fatal
//! configuration error at invocation time, not a per-request failure.
use std::collections::HashMap;
use std::time::Duration;

/// Applied when the configuration has no timeout entry for a service.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// External lookup of per-service invocation settings.
pub trait ServiceConfigurator: Send + Sync {
    /// The base URL for the given service, or `None` when the service is not
    /// configured.
    fn base_url(&self, service: &str) -> Option<String>;

    /// The per-service timeout in seconds; `None` falls back to
    /// [`DEFAULT_TIMEOUT`].
    fn timeout_seconds(&self, service: &str) -> Option<u64>;
}

/// In-memory [`ServiceConfigurator`] populated once at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticServiceConfig {
    services: HashMap<String, ServiceEntry>,
}

#[derive(Debug, Clone)]
struct ServiceEntry {
    base_url: String,
    timeout_seconds: Option<u64>,
}

impl StaticServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a service with the default timeout.
    pub fn with_service(self, name: impl Into<String>, base_url: impl Into<String>) -> Self {
        self.add(name, base_url, None)
    }

    /// Adds a service with an explicit timeout in seconds.
    pub fn with_service_timeout(
        self,
        name: impl Into<String>,
        base_url: impl Into<String>,
        timeout_seconds: u64,
    ) -> Self {
        self.add(name, base_url, Some(timeout_seconds))
    }

    fn add(
        mut self,
        name: impl Into<String>,
        base_url: impl Into<String>,
        timeout_seconds: Option<u64>,
    ) -> Self {
        self.services.insert(
            name.into(),
            ServiceEntry {
                base_url: base_url.into(),
                timeout_seconds,
            },
        );
        self
    }
}

impl ServiceConfigurator for StaticServiceConfig {
    fn base_url(&self, service: &str) -> Option<String> {
        self.services.get(service).map(|e| e.base_url.clone())
    }

    fn timeout_seconds(&self, service: &str) -> Option<u64> {
        self.services.get(service).and_then(|e| e.timeout_seconds)
    }
}
