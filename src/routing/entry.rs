//! Route registration records

use hyper::Method;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

use super::dispatcher::Context;
use super::scope::Scope;
use crate::error::{HandlerResult, RouterError};

/// Pattern used when a route is registered without one: the site root
pub const ROOT_PATTERN: &str = r"^/$";

/// Request handler
///
/// Receives the dispatch context and the URL-decoded capture groups of the
/// matched pattern, in order.
pub trait Handler: Send + Sync {
    fn call(&self, ctx: &mut Context<'_>, args: &[String]) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&mut Context<'_>, &[String]) -> HandlerResult + Send + Sync,
{
    fn call(&self, ctx: &mut Context<'_>, args: &[String]) -> HandlerResult {
        self(ctx, args)
    }
}

/// Box a closure as a shared handler
///
/// Going through this bound lets closure argument and return types be
/// inferred without annotations.
pub fn handler<F>(f: F) -> Arc<dyn Handler>
where
    F: Fn(&mut Context<'_>, &[String]) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Method a route accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    /// `*` - any method
    Any,
    Only(Method),
}

impl MethodFilter {
    pub fn accepts(&self, method: &Method) -> bool {
        match self {
            Self::Any => true,
            Self::Only(m) => m == method,
        }
    }

    /// Parse `*` or a method name (any case)
    ///
    /// An empty string means any method. A string that is not a valid
    /// method token is rejected rather than widened to `Any`.
    pub fn parse(value: &str) -> Result<Self, RouterError> {
        if value.is_empty() || value == "*" {
            return Ok(Self::Any);
        }
        Method::from_bytes(value.to_ascii_uppercase().as_bytes())
            .map(Self::Only)
            .map_err(|_| RouterError::InvalidMethod(value.to_string()))
    }
}

impl From<Method> for MethodFilter {
    fn from(method: Method) -> Self {
        Self::Only(method)
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Only(m) => f.write_str(m.as_str()),
        }
    }
}

/// Immutable route record
///
/// Scope is copied in at registration and never changes afterwards.
#[derive(Clone)]
pub struct RouteEntry {
    method: MethodFilter,
    pattern: Regex,
    handler: Arc<dyn Handler>,
    host: Option<String>,
    base: Option<String>,
}

impl RouteEntry {
    pub fn new(
        method: impl Into<MethodFilter>,
        pattern: &str,
        handler: Arc<dyn Handler>,
        scope: &Scope,
    ) -> Result<Self, RouterError> {
        let source = if pattern.is_empty() {
            ROOT_PATTERN
        } else {
            pattern
        };
        let pattern = Regex::new(source).map_err(|source| RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            method: method.into(),
            pattern,
            handler,
            host: scope.host().map(ToString::to_string),
            base: scope.base().map(ToString::to_string),
        })
    }

    pub const fn method(&self) -> &MethodFilter {
        &self.method
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Method and virtual host check
    pub fn accepts(&self, method: &Method, host: &str) -> bool {
        self.method.accepts(method) && self.host.as_deref().is_none_or(|h| host_matches(h, host))
    }

    /// Match against a request path
    ///
    /// Applies the base prefix first; returns the URL-decoded captures, or
    /// `None` when the base or the pattern does not match.
    pub fn captures(&self, path: &str) -> Option<Vec<String>> {
        let path = match &self.base {
            Some(base) => path.strip_prefix(base.as_str())?,
            None => path,
        };

        let caps = self.pattern.captures(path)?;
        Some(
            caps.iter()
                .skip(1)
                .map(|group| group.map_or_else(String::new, |m| url_decode(m.as_str())))
                .collect(),
        )
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .field("host", &self.host)
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

/// Exact host comparison, ignoring a port on the request side
fn host_matches(expected: &str, host: &str) -> bool {
    if expected.eq_ignore_ascii_case(host) {
        return true;
    }
    host.rsplit_once(':')
        .is_some_and(|(name, port)| {
            !port.is_empty()
                && port.bytes().all(|b| b.is_ascii_digit())
                && expected.eq_ignore_ascii_case(name)
        })
}

/// Form-style URL decoding: `+` is a space, invalid UTF-8 is replaced
pub fn url_decode(value: &str) -> String {
    let spaced = value.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Arc<dyn Handler> {
        handler(|_, _| Ok(()))
    }

    fn entry(pattern: &str, scope: &Scope) -> RouteEntry {
        RouteEntry::new(MethodFilter::Only(Method::GET), pattern, noop(), scope).unwrap()
    }

    #[test]
    fn test_method_filter() {
        assert!(MethodFilter::Any.accepts(&Method::DELETE));
        assert!(MethodFilter::from(Method::GET).accepts(&Method::GET));
        assert!(!MethodFilter::from(Method::GET).accepts(&Method::POST));
        assert_eq!(MethodFilter::parse("*").unwrap(), MethodFilter::Any);
        assert_eq!(MethodFilter::parse("").unwrap(), MethodFilter::Any);
        assert_eq!(MethodFilter::parse("PUT").unwrap(), MethodFilter::Only(Method::PUT));
        assert_eq!(MethodFilter::parse("get").unwrap(), MethodFilter::Only(Method::GET));
    }

    #[test]
    fn test_invalid_method_rejected() {
        for value in ["GE T", "bad method", "GET\n"] {
            assert!(
                matches!(MethodFilter::parse(value), Err(RouterError::InvalidMethod(ref m)) if m == value),
                "{value:?}"
            );
        }
    }

    #[test]
    fn test_captures_are_decoded() {
        let e = entry(r"^/tag/([^/]+)/(\d+)$", &Scope::new());
        assert_eq!(
            e.captures("/tag/rust%20lang/7"),
            Some(vec!["rust lang".to_string(), "7".to_string()])
        );
        assert_eq!(
            e.captures("/tag/a+b%2Bc/1"),
            Some(vec!["a b+c".to_string(), "1".to_string()])
        );
        assert_eq!(e.captures("/tag/x"), None);
    }

    #[test]
    fn test_unmatched_optional_group_is_empty() {
        let e = entry(r"^/page(?:/(\d+))?$", &Scope::new());
        assert_eq!(e.captures("/page"), Some(vec![String::new()]));
    }

    #[test]
    fn test_base_is_stripped_before_matching() {
        let e = entry(r"^users/(\d+)$", &Scope::new().with_base("/api/"));
        assert_eq!(e.captures("/api/users/5"), Some(vec!["5".to_string()]));
        assert_eq!(e.captures("/users/5"), None);
    }

    #[test]
    fn test_host_scoping() {
        let e = entry("^/$", &Scope::new().with_host("a.example"));
        assert!(e.accepts(&Method::GET, "a.example"));
        assert!(e.accepts(&Method::GET, "A.Example:8080"));
        assert!(!e.accepts(&Method::GET, "b.example"));
        assert!(!e.accepts(&Method::GET, "a.example.evil"));
        assert!(!e.accepts(&Method::POST, "a.example"));
    }

    #[test]
    fn test_empty_pattern_matches_root() {
        let e = entry("", &Scope::new());
        assert!(e.captures("/").is_some());
        assert!(e.captures("/other").is_none());
    }

    #[test]
    fn test_invalid_pattern() {
        let err = RouteEntry::new(MethodFilter::Any, "([", noop(), &Scope::new()).unwrap_err();
        assert!(matches!(err, RouterError::InvalidPattern { .. }));
    }
}
