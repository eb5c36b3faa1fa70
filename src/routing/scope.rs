//! Registration scope
//!
//! Virtual host and base path are values carried by a [`Registrar`], not
//! global state: every route registered through a registrar captures the
//! registrar's scope at that moment.

use std::sync::Arc;

use super::dispatcher::{Context, Router};
use super::entry::{Handler, MethodFilter};
use crate::error::{HandlerResult, RouterError};

/// Host and base-path restriction applied to routes at registration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    host: Option<String>,
    base: Option<String>,
}

impl Scope {
    /// Unrestricted scope
    pub const fn new() -> Self {
        Self {
            host: None,
            base: None,
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }
}

/// Registers routes on a router under a fixed scope
pub struct Registrar<'r> {
    router: &'r Router,
    scope: Scope,
}

impl<'r> Registrar<'r> {
    pub(crate) const fn new(router: &'r Router, scope: Scope) -> Self {
        Self { router, scope }
    }

    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Restrict subsequent routes to a virtual host, or lift the restriction
    #[must_use]
    pub fn use_host(mut self, host: Option<&str>) -> Self {
        self.scope.host = host.map(ToString::to_string);
        self
    }

    /// Restrict subsequent routes to a path prefix, or lift the restriction
    ///
    /// The prefix is stripped from the path before the route pattern is
    /// matched.
    #[must_use]
    pub fn use_path(mut self, base: Option<&str>) -> Self {
        self.scope.base = base.map(ToString::to_string);
        self
    }

    /// Register a closure handler
    pub fn route<F>(
        &self,
        method: impl Into<MethodFilter>,
        pattern: &str,
        handler: F,
    ) -> Result<&Self, RouterError>
    where
        F: Fn(&mut Context<'_>, &[String]) -> HandlerResult + Send + Sync + 'static,
    {
        self.route_handler(method, pattern, Arc::new(handler))
    }

    /// Register a shared handler object
    pub fn route_handler(
        &self,
        method: impl Into<MethodFilter>,
        pattern: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<&Self, RouterError> {
        self.router
            .register(method.into(), pattern, handler, &self.scope)?;
        Ok(self)
    }

    /// Run `f` with a registrar narrowed to `scope`
    ///
    /// Fields left unset in `scope` inherit from this registrar.
    pub fn group<F>(&self, scope: Scope, f: F) -> Result<(), RouterError>
    where
        F: FnOnce(&Registrar<'r>) -> Result<(), RouterError>,
    {
        let merged = Scope {
            host: scope.host.or_else(|| self.scope.host.clone()),
            base: scope.base.or_else(|| self.scope.base.clone()),
        };
        f(&Registrar::new(self.router, merged))
    }
}
