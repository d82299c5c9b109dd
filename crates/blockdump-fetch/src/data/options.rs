use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_CONNECTIONS: usize = 100;
pub const ERROR_BODY_LIMIT: usize = 500;

/// Configuration for the HTTP side of block fetching.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Upper bound for one request, body included.
    pub timeout:         Duration,
    /// Pooled connections kept per host; sized to the worker count.
    pub max_connections: usize,
    pub user_agent:      String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout:         DEFAULT_TIMEOUT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            user_agent:      concat!("blockdump/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchOptions {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }
}
