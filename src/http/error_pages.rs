//! Error page rendering
//!
//! The router and the static file server only pick *which* page to show;
//! rendering goes through [`ErrorPages`] so applications can supply their
//! own templates.

use hyper::StatusCode;
use std::fs::File;
use std::io;
use std::path::PathBuf;

use super::response::{ResponseSink, SinkWriter};
use crate::logger;

/// Named error page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPage {
    /// Missing file, missing index, or denied extension
    PageNotFound,
    /// No route matched the request
    RouteNotFound,
    /// Unsatisfiable byte range, always sent without a body
    RangeNotSatisfiable,
    /// I/O failure while serving
    Internal,
    /// A handler failed
    Unavailable,
}

impl ErrorPage {
    pub const fn status(self) -> StatusCode {
        match self {
            Self::PageNotFound | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::RangeNotSatisfiable => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Template name, also the override file stem
    pub const fn name(self) -> &'static str {
        match self {
            Self::PageNotFound => "404_page",
            Self::RouteNotFound => "404_route",
            Self::RangeNotSatisfiable => "416_range",
            Self::Internal => "500_internal",
            Self::Unavailable => "503_unavailable",
        }
    }

    const fn title(self) -> &'static str {
        match self {
            Self::PageNotFound => "404 - Page Not Found",
            Self::RouteNotFound => "404 - Route Not Found",
            Self::RangeNotSatisfiable => "416 - Range Not Satisfiable",
            Self::Internal => "500 - Internal Server Error",
            Self::Unavailable => "503 - Service Unavailable",
        }
    }
}

/// Error page renderer
///
/// Implementations are called with the status already set on `res`.
pub trait ErrorPages: Send + Sync {
    fn render(&self, page: ErrorPage, res: &mut dyn ResponseSink) -> io::Result<()>;
}

/// Set the page's status and hand it to the renderer
///
/// 416 never carries a body, whatever the renderer would produce.
pub fn emit(pages: &dyn ErrorPages, page: ErrorPage, res: &mut dyn ResponseSink) {
    res.set_status(page.status());
    if page == ErrorPage::RangeNotSatisfiable {
        return;
    }
    if let Err(e) = pages.render(page, res) {
        logger::log_error(&format!("Failed to render {} page: {e}", page.name()));
    }
}

/// Built-in pages, optionally overridden by `<dir>/<name>.html` files
#[derive(Debug, Clone, Default)]
pub struct DefaultErrorPages {
    override_dir: Option<PathBuf>,
}

impl DefaultErrorPages {
    pub fn new(override_dir: Option<PathBuf>) -> Self {
        Self { override_dir }
    }

    /// Open `<dir>/<name>.html` with its size, if present
    fn open_override(&self, page: ErrorPage) -> Option<(File, u64)> {
        let dir = self.override_dir.as_ref()?;
        let path = dir.join(format!("{}.html", page.name()));
        let opened = File::open(&path).and_then(|file| {
            let len = file.metadata()?.len();
            Ok((file, len))
        });
        match opened {
            Ok(opened) => Some(opened),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                logger::log_warning(&format!(
                    "Unreadable error page '{}': {e}",
                    path.display()
                ));
                None
            }
        }
    }
}

impl ErrorPages for DefaultErrorPages {
    fn render(&self, page: ErrorPage, res: &mut dyn ResponseSink) -> io::Result<()> {
        res.set_header("Content-Type", "text/html; charset=utf-8");

        if let Some((mut file, len)) = self.open_override(page) {
            res.set_header("Content-Length", &len.to_string());
            io::copy(&mut file, &mut SinkWriter(res))?;
            return Ok(());
        }

        let body = builtin_page(page);
        res.set_header("Content-Length", &body.len().to_string());
        res.write(body.as_bytes())
    }
}

fn builtin_page(page: ErrorPage) -> String {
    let title = page.title();
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <style>
        body {{ font-family: Arial, Helvetica, sans-serif; background: #f5f5f5; color: #000; }}
        .container {{ margin: 20vh auto; text-align: center; font-size: 24pt; }}
        h1 {{ color: #a12727; margin-bottom: 20px; }}
        a {{ color: #1a1a1a; text-decoration: none; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>{title}</h1>
        <a href="/">Bring me back home</a>
    </div>
</body>
</html>"#
    )
}
