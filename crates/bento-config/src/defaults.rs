/// Environment variable the test runner uses to hand the backend its port.
pub const PORT_ENV_VAR: &str = "BENTO_PORT";

/// Environment variable overriding the bind address.
pub const HOST_ENV_VAR: &str = "BENTO_HOST";

/// Environment variable overriding the log filter.
pub const LOG_FILTER_ENV_VAR: &str = "BENTO_LOG_FILTER";

/// Environment variable overriding the log format.
pub const LOG_FORMAT_ENV_VAR: &str = "BENTO_LOG_FORMAT";

/// Loopback address the backend binds to unless told otherwise.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default bind address.
#[must_use]
pub fn default_host() -> &'static str {
    DEFAULT_HOST
}

/// Default log filter expression used by the binaries.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the binaries.
#[must_use]
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}
