//! Request handler module
//!
//! Wires the router to its built-in handlers and turns one dispatch cycle
//! into a complete response.

pub mod mounts;
pub mod static_files;

use hyper::Method;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::error::RouterError;
use crate::http::error_pages::{self, ErrorPage, ErrorPages};
use crate::http::{BufferedResponse, DefaultErrorPages, Request, ResponseSink};
use crate::logger::{self, AccessLogEntry};
use crate::routing::Router;
use static_files::StaticFiles;

/// Router, error pages and access log settings for one server
pub struct App {
    router: Router,
    error_pages: Arc<dyn ErrorPages>,
    /// Access log format, `None` when access logging is off
    access_log_format: Option<String>,
}

impl App {
    /// Build the router from configuration
    ///
    /// The static file fallback is registered first, so every configured
    /// route takes precedence over it.
    pub fn new(config: &Config) -> Result<Self, RouterError> {
        let error_pages: Arc<dyn ErrorPages> = Arc::new(DefaultErrorPages::new(
            config.static_files.error_pages_dir.as_ref().map(PathBuf::from),
        ));
        let files = Arc::new(StaticFiles::new(
            &config.static_files,
            Arc::clone(&error_pages),
        )?);

        let router = Router::new();
        let unscoped = router.registrar();
        unscoped.route_handler(Method::GET, "^/", files.fallback_handler())?;
        unscoped.route_handler(Method::HEAD, "^/", files.fallback_handler())?;
        mounts::register(&router, &config.routes, &files)?;

        let access_log_format = config
            .logging
            .access_log
            .then(|| config.logging.access_log_format.clone());

        Ok(Self {
            router,
            error_pages,
            access_log_format,
        })
    }

    pub const fn router(&self) -> &Router {
        &self.router
    }

    /// Run one dispatch cycle and log it
    pub fn handle(&self, request: &Request, remote_addr: &str) -> BufferedResponse {
        let start = Instant::now();
        let response = handle(&self.router, &*self.error_pages, request);

        if let Some(format) = &self.access_log_format {
            let mut entry = AccessLogEntry::from_request(remote_addr.to_string(), request);
            entry.status = response.status().as_u16();
            entry.body_bytes = response.body_len();
            entry.request_time_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
            logger::log_access(&entry, format);
        }
        response
    }
}

/// Dispatch `request` into a fresh buffered response
///
/// A request no route accepted gets the route-not-found page; a failing
/// handler gets the unavailable page. Either replaces whatever earlier
/// handlers in the cycle had written.
pub fn handle(router: &Router, pages: &dyn ErrorPages, request: &Request) -> BufferedResponse {
    let mut response = BufferedResponse::new();

    match router.dispatch(request, &mut response) {
        Ok(()) => response,
        Err(RouterError::NoRoute) => {
            logger::log_debug(&format!(
                "No route for {} {}{}",
                request.method(),
                request.host(),
                request.path()
            ));
            let mut response = BufferedResponse::new();
            error_pages::emit(pages, ErrorPage::RouteNotFound, &mut response);
            response
        }
        Err(err) => {
            logger::log_error(&format!(
                "{} {} failed: {err}",
                request.method(),
                request.path()
            ));
            let mut response = BufferedResponse::new();
            error_pages::emit(pages, ErrorPage::Unavailable, &mut response);
            response
        }
    }
}
