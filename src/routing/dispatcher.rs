//! Request dispatch
//!
//! A dispatch cycle resolves one request against the route table:
//!
//! 1. Routes registered since the last cycle are drained from the pending
//!    table and published into a new immutable snapshot.
//! 2. The snapshot is walked newest-first. Entries whose method, host or base
//!    do not fit are skipped, then the pattern is matched.
//! 3. A matching handler runs with the decoded captures. Unless it called
//!    [`Context::continue_dispatch`], the cycle ends there; otherwise the
//!    walk resumes with the next older entry.
//! 4. Running out of entries is [`RouterError::NoRoute`].
//!
//! Routes registered by a handler during a cycle go to the pending table and
//! only become visible to the next cycle.

use arc_swap::ArcSwap;
use std::sync::{Arc, Mutex, PoisonError};

use super::entry::{Handler, MethodFilter, RouteEntry};
use super::scope::{Registrar, Scope};
use super::table::RouteTable;
use crate::error::{HandlerResult, RouterError};
use crate::http::{Request, ResponseSink};
use crate::logger;

/// Per-dispatch state handed to handlers
pub struct Context<'a> {
    request: &'a Request,
    response: &'a mut dyn ResponseSink,
    router: &'a Router,
    continue_requested: bool,
}

impl<'a> Context<'a> {
    pub const fn request(&self) -> &'a Request {
        self.request
    }

    pub fn response(&mut self) -> &mut dyn ResponseSink {
        &mut *self.response
    }

    /// Router running this cycle; routes registered through it apply from
    /// the next cycle on
    pub const fn router(&self) -> &'a Router {
        self.router
    }

    /// Keep matching older routes after this handler returns
    pub fn continue_dispatch(&mut self) {
        self.continue_requested = true;
    }
}

/// Route table plus dispatcher
///
/// Registration and publishing both go through the pending-table mutex, so
/// they never interleave. Dispatch reads a shared snapshot and holds no lock
/// while handlers run.
pub struct Router {
    pending: Mutex<RouteTable>,
    published: ArcSwap<RouteTable>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(RouteTable::new()),
            published: ArcSwap::from_pointee(RouteTable::new()),
        }
    }

    /// Registrar without host or base restriction
    pub const fn registrar(&self) -> Registrar<'_> {
        Registrar::new(self, Scope::new())
    }

    /// Register an unscoped closure route
    pub fn route<F>(
        &self,
        method: impl Into<MethodFilter>,
        pattern: &str,
        handler: F,
    ) -> Result<(), RouterError>
    where
        F: Fn(&mut Context<'_>, &[String]) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(method.into(), pattern, Arc::new(handler), &Scope::new())
    }

    /// Run `f` with a registrar bound to `scope`
    pub fn group<F>(&self, scope: Scope, f: F) -> Result<(), RouterError>
    where
        F: FnOnce(&Registrar<'_>) -> Result<(), RouterError>,
    {
        f(&Registrar::new(self, scope))
    }

    pub(crate) fn register(
        &self,
        method: MethodFilter,
        pattern: &str,
        handler: Arc<dyn Handler>,
        scope: &Scope,
    ) -> Result<(), RouterError> {
        let entry = RouteEntry::new(method, pattern, handler, scope)?;
        logger::log_debug(&format!("[Router] Registered {entry:?}"));
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .append(entry);
        Ok(())
    }

    /// Publish pending registrations and return the table to dispatch on
    fn publish_pending(&self) -> Arc<RouteTable> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.is_empty() {
            return self.published.load_full();
        }

        let mut next = RouteTable::clone(&self.published.load());
        next.extend(pending.drain());
        let next = Arc::new(next);
        self.published.store(Arc::clone(&next));
        next
    }

    /// Number of routes visible to the next dispatch cycle
    pub fn len(&self) -> usize {
        self.published.load().len()
            + self
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run one dispatch cycle for `request`
    pub fn dispatch(
        &self,
        request: &Request,
        response: &mut dyn ResponseSink,
    ) -> Result<(), RouterError> {
        let table = self.publish_pending();
        let path = request.path();
        let mut ctx = Context {
            request,
            response,
            router: self,
            continue_requested: false,
        };

        for entry in table.by_priority() {
            if !entry.accepts(request.method(), request.host()) {
                continue;
            }
            let Some(args) = entry.captures(path) else {
                continue;
            };

            logger::log_dispatch(request.method().as_str(), path, &entry.method().to_string(), entry.pattern());

            ctx.continue_requested = false;
            entry
                .handler()
                .call(&mut ctx, &args)
                .map_err(RouterError::Handler)?;

            if !ctx.continue_requested {
                return Ok(());
            }
        }

        Err(RouterError::NoRoute)
    }
}
