// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

use crate::handler::static_files::DEFAULT_INDEX_PATTERN;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub static_files: StaticFilesConfig,
    /// Declarative routes, registered in order (later entries win)
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub backlog: i32,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Upper bound for a whole connection, in seconds
    pub request_timeout: u64,
    pub max_connections: Option<u64>,
}

/// Static file serving configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory request paths are resolved under
    pub root: String,
    /// Render 404/500 pages from the file server itself
    pub use_error_pages: bool,
    /// Directory holding `<status>_<name>.html` error page overrides
    pub error_pages_dir: Option<String>,
    /// Path suffixes never served (matched case-insensitively)
    pub denied_extensions: Vec<String>,
    /// Directory index file name pattern (matched case-insensitively)
    pub index_pattern: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            use_error_pages: true,
            error_pages_dir: None,
            denied_extensions: vec![".php".to_string(), ".sql".to_string()],
            index_pattern: DEFAULT_INDEX_PATTERN.to_string(),
        }
    }
}

/// Declarative route
#[derive(Debug, Deserialize, Clone)]
pub struct RouteConfig {
    /// HTTP method or `*`
    #[serde(default = "default_method")]
    pub method: String,
    /// Regular expression over the (base-stripped) request path
    pub pattern: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub base: Option<String>,
    /// Keep dispatching to older routes after this one ran
    #[serde(default, rename = "continue")]
    pub continue_after: bool,
    /// Action to take when matched
    #[serde(flatten)]
    pub action: RouteAction,
}

#[allow(clippy::missing_const_for_fn)]
fn default_method() -> String {
    "*".to_string()
}

/// Route action - what to do when a route matches
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteAction {
    /// Serve files from a directory
    Dir { path: String },
    /// Serve a specific file
    File {
        path: String,
        #[serde(default)]
        content_type: Option<String>,
    },
    /// HTTP redirect; `$1`..`$9` in the target expand to captures
    Redirect {
        target: String,
        #[serde(default = "default_redirect_code")]
        code: u16,
    },
    /// Fixed response
    Direct {
        status: u16,
        #[serde(default)]
        body: Option<String>,
        #[serde(default)]
        content_type: Option<String>,
    },
}

#[allow(clippy::missing_const_for_fn)]
fn default_redirect_code() -> u16 {
    302
}
