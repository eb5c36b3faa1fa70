//! Declarative route mounting
//!
//! Turns `[[routes]]` config entries into router registrations. Entries are
//! registered in file order, so a later entry shadows an earlier one for the
//! same request.

use hyper::StatusCode;
use std::sync::Arc;

use super::static_files::StaticFiles;
use crate::config::{RouteAction, RouteConfig};
use crate::error::RouterError;
use crate::http::response::{write_plain, write_redirect};
use crate::routing::path::{path_combine, sanitize_uri};
use crate::routing::{handler, Context, Handler, MethodFilter, Router, Scope};

/// Register every configured route on `router`
pub fn register(
    router: &Router,
    routes: &[RouteConfig],
    files: &Arc<StaticFiles>,
) -> Result<(), RouterError> {
    for route in routes {
        let mut scope = Scope::new();
        if let Some(host) = &route.host {
            scope = scope.with_host(host.as_str());
        }
        if let Some(base) = &route.base {
            scope = scope.with_base(base.as_str());
        }

        let method = MethodFilter::parse(&route.method)?;
        let action = build_action(route, files);
        router.group(scope, |r| {
            r.route_handler(method, &route.pattern, action)?;
            Ok(())
        })?;
    }
    Ok(())
}

fn build_action(route: &RouteConfig, files: &Arc<StaticFiles>) -> Arc<dyn Handler> {
    let continue_after = route.continue_after;

    match route.action.clone() {
        RouteAction::Dir { path } => {
            let files = Arc::clone(files);
            let base = route.base.clone();
            handler(move |ctx, _| {
                let request = ctx.request();
                let remainder = base
                    .as_deref()
                    .and_then(|b| request.path().strip_prefix(b))
                    .unwrap_or_else(|| request.path());
                let target = path_combine(&[path.as_str(), sanitize_uri(remainder).as_str()]);
                let opts = files.options().path(target);
                let served = files.serve(request, ctx.response(), &opts);
                finish(ctx, served, continue_after);
                Ok(())
            })
        }
        RouteAction::File { path, content_type } => {
            let files = Arc::clone(files);
            handler(move |ctx, _| {
                let mut opts = files.options().path(path.as_str());
                if let Some(content_type) = &content_type {
                    opts = opts.content_type(content_type.as_str());
                }
                let request = ctx.request();
                let served = files.serve(request, ctx.response(), &opts);
                finish(ctx, served, continue_after);
                Ok(())
            })
        }
        RouteAction::Redirect { target, code } => handler(move |ctx, args| {
            let status = StatusCode::from_u16(code)?;
            write_redirect(ctx.response(), status, &expand_captures(&target, args))?;
            finish(ctx, true, continue_after);
            Ok(())
        }),
        RouteAction::Direct {
            status,
            body,
            content_type,
        } => handler(move |ctx, _| {
            let status = StatusCode::from_u16(status)?;
            let body = body.as_deref().unwrap_or_default();
            match &content_type {
                Some(content_type) => {
                    let res = ctx.response();
                    res.set_status(status);
                    res.set_header("Content-Type", content_type);
                    res.set_header("Content-Length", &body.len().to_string());
                    res.write(body.as_bytes())?;
                }
                None => write_plain(ctx.response(), status, body)?,
            }
            finish(ctx, true, continue_after);
            Ok(())
        }),
    }
}

/// Fall through to older routes when nothing was served or the route asks for it
fn finish(ctx: &mut Context<'_>, served: bool, continue_after: bool) {
    if !served || continue_after {
        ctx.continue_dispatch();
    }
}

/// Replace `$1`..`$9` with the matching capture; missing captures expand to nothing
fn expand_captures(target: &str, args: &[String]) -> String {
    let mut expanded = String::with_capacity(target.len());
    let mut chars = target.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' {
            if let Some(digit) = chars.peek().and_then(|d| d.to_digit(10)).filter(|&d| d > 0) {
                chars.next();
                if let Some(arg) = args.get(digit as usize - 1) {
                    expanded.push_str(arg);
                }
                continue;
            }
        }
        expanded.push(c);
    }
    expanded
}
