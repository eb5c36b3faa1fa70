//! Static file serving module
//!
//! Serves files and directory indexes with single byte-range support and an
//! extension denylist.
//!
//! Outcome of [`StaticFiles::serve`]:
//! - `true`: a response was produced (content, 206, 416, or an error page)
//! - `false`: nothing usable was written; the caller picks a fallback

use hyper::StatusCode;
use regex::{Regex, RegexBuilder};
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use crate::config::StaticFilesConfig;
use crate::error::{FileError, RouterError};
use crate::http::error_pages::{self, ErrorPage, ErrorPages};
use crate::http::{mime, parse_range_header, ByteRange, RangeParseResult, Request, ResponseSink};
use crate::logger;
use crate::routing::path::{path_combine, sanitize_uri};
use crate::routing::{handler, Handler};

/// Default directory index file pattern
pub const DEFAULT_INDEX_PATTERN: &str = r"^index\.(php|html)$";

/// Per-call options for [`StaticFiles::serve`]
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// Resolved path to serve; derived from the request URI when `None`
    pub path: Option<String>,
    /// Content-Type override; detected from the extension when `None`
    pub content_type: Option<String>,
    /// Render 404/500 pages instead of returning `false`
    pub use_error_pages: bool,
    /// Directory a URI-derived path is resolved under; server root when `None`
    pub directory: Option<String>,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            path: None,
            content_type: None,
            use_error_pages: true,
            directory: None,
        }
    }
}

impl ServeOptions {
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub const fn error_pages(mut self, enabled: bool) -> Self {
        self.use_error_pages = enabled;
        self
    }

    #[must_use]
    pub fn directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = Some(directory.into());
        self
    }
}

/// How far a serve attempt got
enum Served {
    Done,
    /// Range header present but not of the `bytes=` form
    MalformedRange,
}

/// Static file server
pub struct StaticFiles {
    root: String,
    use_error_pages: bool,
    denied_extensions: Vec<String>,
    index_pattern: Regex,
    error_pages: Arc<dyn ErrorPages>,
}

impl StaticFiles {
    pub fn new(
        config: &StaticFilesConfig,
        error_pages: Arc<dyn ErrorPages>,
    ) -> Result<Self, RouterError> {
        let index_pattern = RegexBuilder::new(&config.index_pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| RouterError::InvalidPattern {
                pattern: config.index_pattern.clone(),
                source,
            })?;

        Ok(Self {
            root: config.root.clone(),
            use_error_pages: config.use_error_pages,
            denied_extensions: config
                .denied_extensions
                .iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
            index_pattern,
            error_pages,
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Options preset with the configured error-page behaviour
    pub fn options(&self) -> ServeOptions {
        ServeOptions::default().error_pages(self.use_error_pages)
    }

    /// Case-insensitive suffix check against the denylist
    pub fn is_allowed(&self, path: &str) -> bool {
        let lower = path.to_ascii_lowercase();
        !self
            .denied_extensions
            .iter()
            .any(|ext| lower.ends_with(ext.as_str()))
    }

    /// Serve a file or directory for `req` into `res`
    pub fn serve(&self, req: &Request, res: &mut dyn ResponseSink, opts: &ServeOptions) -> bool {
        let path = match &opts.path {
            Some(path) => path.clone(),
            None => {
                let directory = opts.directory.as_deref().unwrap_or(&self.root);
                path_combine(&[directory, sanitize_uri(req.uri()).as_str()])
            }
        };

        match self.serve_path(req, res, &path, opts) {
            Ok(Served::Done) => true,
            Ok(Served::MalformedRange) => {
                logger::log_debug(&format!(
                    "Unsupported Range header for '{path}', not serving"
                ));
                false
            }
            Err(FileError::RangeNotSatisfiable) => {
                error_pages::emit(&*self.error_pages, ErrorPage::RangeNotSatisfiable, res);
                true
            }
            Err(err) => {
                if let FileError::Io(e) = &err {
                    logger::log_error(&format!("Failed to serve '{path}': {e}"));
                }
                if !opts.use_error_pages {
                    return false;
                }
                let page = match err {
                    FileError::Io(_) => ErrorPage::Internal,
                    _ => ErrorPage::PageNotFound,
                };
                error_pages::emit(&*self.error_pages, page, res);
                true
            }
        }
    }

    /// Handler serving the request URI below the root
    ///
    /// Continues dispatch when nothing was served.
    pub fn fallback_handler(self: &Arc<Self>) -> Arc<dyn Handler> {
        let files = Arc::clone(self);
        handler(move |ctx, _| {
            let request = ctx.request();
            let opts = files.options();
            if !files.serve(request, ctx.response(), &opts) {
                ctx.continue_dispatch();
            }
            Ok(())
        })
    }

    fn serve_path(
        &self,
        req: &Request,
        res: &mut dyn ResponseSink,
        path: &str,
        opts: &ServeOptions,
    ) -> Result<Served, FileError> {
        let Ok(metadata) = fs::metadata(path) else {
            return Err(FileError::NotFound);
        };

        if metadata.is_file() {
            if !self.is_allowed(path) {
                logger::log_warning(&format!("Denied extension requested: {path}"));
                return Err(FileError::NotFound);
            }
            return serve_file(req, res, Path::new(path), metadata.len(), opts);
        }

        if metadata.is_dir() {
            let index = self.find_index(Path::new(path))?;
            let index = index.to_string_lossy().into_owned();
            return self.serve_path(req, res, &index, opts);
        }

        Err(FileError::NotFound)
    }

    /// First index-pattern entry of `dir`, by name
    ///
    /// Symbolic links are never considered, nor are entries the denylist
    /// would refuse to serve.
    fn find_index(&self, dir: &Path) -> Result<std::path::PathBuf, FileError> {
        let entries = fs::read_dir(dir).map_err(|e| {
            logger::log_warning(&format!("Cannot list '{}': {e}", dir.display()));
            FileError::NotFound
        })?;

        let mut candidates: Vec<_> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| !t.is_symlink()))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name != "." && name != "..")
            .filter(|name| self.index_pattern.is_match(name) && self.is_allowed(name))
            .collect();
        candidates.sort();

        candidates
            .into_iter()
            .next()
            .map(|name| dir.join(name))
            .ok_or(FileError::NotFound)
    }
}

fn serve_file(
    req: &Request,
    res: &mut dyn ResponseSink,
    path: &Path,
    file_size: u64,
    opts: &ServeOptions,
) -> Result<Served, FileError> {
    let content_type = opts
        .content_type
        .as_deref()
        .unwrap_or_else(|| mime::content_type_for(path));

    if let Some(range_header) = req.header("range") {
        let range = match parse_range_header(range_header, file_size) {
            RangeParseResult::Valid(range) => range,
            RangeParseResult::NotSatisfiable => return Err(FileError::RangeNotSatisfiable),
            RangeParseResult::Malformed => return Ok(Served::MalformedRange),
        };

        let data = read_range(path, range)?;
        res.set_status(StatusCode::PARTIAL_CONTENT);
        res.set_header("Content-Type", content_type);
        res.set_header("Content-Length", &range.length().to_string());
        res.set_header("Content-Range", &range.content_range(file_size));
        res.write(&data)?;
        return Ok(Served::Done);
    }

    let data = read_all(path)?;
    res.set_header("Content-Type", content_type);
    res.set_header("Accept-Ranges", "bytes");
    res.set_header("Content-Length", &data.len().to_string());
    res.write(&data)?;
    Ok(Served::Done)
}

/// Read exactly the bytes of `range`
///
/// Data is read before any header is set, so a failure here still leaves
/// room for a clean 500 response.
fn read_range(path: &Path, range: ByteRange) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(range.start))?;

    let length = usize::try_from(range.length())
        .map_err(|_| io::Error::new(io::ErrorKind::OutOfMemory, "range too large"))?;
    let mut data = Vec::with_capacity(length);
    file.take(range.length()).read_to_end(&mut data)?;
    if data.len() != length {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "file shrank while serving range",
        ));
    }
    Ok(data)
}

fn read_all(path: &Path) -> io::Result<Vec<u8>> {
    let mut data = Vec::new();
    File::open(path)?.read_to_end(&mut data)?;
    Ok(data)
}
