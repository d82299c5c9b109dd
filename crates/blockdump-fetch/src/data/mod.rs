mod options;

pub use options::{DEFAULT_MAX_CONNECTIONS, DEFAULT_TIMEOUT, ERROR_BODY_LIMIT, FetchOptions};
