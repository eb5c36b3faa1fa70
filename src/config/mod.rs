// Configuration module entry point
// Loads layered configuration: file, then environment, then defaults

mod types;

use regex::Regex;
use std::net::SocketAddr;

use crate::routing::MethodFilter;

// Re-export public types
pub use types::{
    Config, LoggingConfig, PerformanceConfig, RouteAction, RouteConfig, ServerConfig,
    StaticFilesConfig,
};

/// Config file used when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "switchyard.toml";

impl Config {
    /// Load configuration from the given file path
    ///
    /// A missing file is not an error. `SWITCHYARD_*` environment variables
    /// override file values, with `__` separating nested keys
    /// (`SWITCHYARD_SERVER__PORT=9000`).
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SWITCHYARD")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.backlog", 128)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.request_timeout", 30)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Check declarative routes before any of them is registered
    pub fn validate(&self) -> Result<(), String> {
        for (i, route) in self.routes.iter().enumerate() {
            if let Err(e) = Regex::new(&route.pattern) {
                return Err(format!("routes[{i}]: invalid pattern '{}': {e}", route.pattern));
            }
            if MethodFilter::parse(&route.method).is_err() {
                return Err(format!("routes[{i}]: invalid method '{}'", route.method));
            }
            if let RouteAction::Redirect { code, .. } = route.action {
                if !(300..=399).contains(&code) {
                    return Err(format!("routes[{i}]: redirect code {code} is not 3xx"));
                }
            }
            if let RouteAction::Direct { status, .. } = route.action {
                if hyper::StatusCode::from_u16(status).is_err() {
                    return Err(format!("routes[{i}]: invalid status {status}"));
                }
            }
        }

        Regex::new(&self.static_files.index_pattern)
            .map(|_| ())
            .map_err(|e| format!("static_files.index_pattern: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn load(toml: &str) -> Result<Config, config::ConfigError> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("switchyard.toml");
        fs::write(&path, toml).unwrap();
        Config::load_from(path.to_str().unwrap())
    }

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("/nonexistent/switchyard-config").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.backlog, 128);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert_eq!(cfg.static_files.root, ".");
        assert_eq!(cfg.static_files.denied_extensions, [".php", ".sql"]);
        assert!(cfg.static_files.use_error_pages);
        assert!(cfg.routes.is_empty());
        assert_eq!(
            cfg.get_socket_addr().unwrap(),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_routes_from_file() {
        let cfg = load(
            r#"
[server]
port = 9090

[static_files]
root = "public"
use_error_pages = false

[[routes]]
pattern = "^/docs/(.*)$"
type = "dir"
path = "docs"
base = "/v1"

[[routes]]
method = "GET"
pattern = "^/old/(\\d+)$"
type = "redirect"
target = "/new/$1"
code = 301

[[routes]]
pattern = "^/ping$"
host = "status.example"
continue = true
type = "direct"
status = 200
body = "pong"
"#,
        )
        .unwrap();

        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.static_files.root, "public");
        assert!(!cfg.static_files.use_error_pages);
        assert_eq!(cfg.routes.len(), 3);

        assert_eq!(cfg.routes[0].method, "*");
        assert_eq!(cfg.routes[0].base.as_deref(), Some("/v1"));
        assert_eq!(
            cfg.routes[0].action,
            RouteAction::Dir {
                path: "docs".to_string()
            }
        );
        assert_eq!(
            cfg.routes[1].action,
            RouteAction::Redirect {
                target: "/new/$1".to_string(),
                code: 301
            }
        );
        assert!(cfg.routes[2].continue_after);
        assert_eq!(cfg.routes[2].host.as_deref(), Some("status.example"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_routes() {
        let cfg = load(
            r#"
[[routes]]
pattern = "(["
type = "dir"
path = "."
"#,
        )
        .unwrap();
        assert!(cfg.validate().unwrap_err().contains("routes[0]"));

        let cfg = load(
            r#"
[[routes]]
pattern = "^/x$"
type = "redirect"
target = "/y"
code = 200
"#,
        )
        .unwrap();
        assert!(cfg.validate().unwrap_err().contains("not 3xx"));
    }

    #[test]
    fn test_validate_rejects_bad_method() {
        let cfg = load(
            r#"
[[routes]]
method = "GE T"
pattern = "^/admin$"
type = "direct"
status = 403
"#,
        )
        .unwrap();
        assert_eq!(
            cfg.validate().unwrap_err(),
            "routes[0]: invalid method 'GE T'"
        );

        let cfg = load(
            r#"
[[routes]]
method = "post"
pattern = "^/form$"
type = "direct"
status = 204
"#,
        )
        .unwrap();
        assert!(cfg.validate().is_ok());
    }
}
