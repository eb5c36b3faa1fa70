//! Switchyard: a regex request router with a static file server
//!
//! Routes are matched newest-first against the request path, optionally
//! restricted to a virtual host and a base path. Handlers may hand the
//! request on to older routes; the static file server is registered first
//! and therefore acts as the fallback.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod routing;
pub mod server;
