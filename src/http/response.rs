//! HTTP response sink
//!
//! Handlers write status, headers and body bytes through [`ResponseSink`].
//! [`BufferedResponse`] collects them and is converted into a hyper response
//! once the dispatch cycle is over.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, LOCATION,
};
use hyper::{Response, StatusCode};
use std::io;

use crate::logger;

/// Outbound response as seen by handlers
///
/// Headers must be set before the first body byte is written.
pub trait ResponseSink {
    fn set_status(&mut self, status: StatusCode);

    fn status(&self) -> StatusCode;

    /// Set a header
    ///
    /// Entity headers such as `Content-Type` replace an earlier value; other
    /// names append, so repeated calls produce repeated header lines.
    fn set_header(&mut self, name: &str, value: &str);

    /// Append body bytes
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Number of body bytes written so far
    fn body_len(&self) -> usize;
}

/// `std::io::Write` adapter over a sink, for `io::copy`
pub struct SinkWriter<'a>(pub &'a mut dyn ResponseSink);

impl io::Write for SinkWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// In-memory response sink
#[derive(Debug)]
pub struct BufferedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Default for BufferedResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header as a string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Convert into a hyper response
    ///
    /// `Content-Length` always describes the buffered body, whatever handlers
    /// set along the way. For HEAD the body is dropped but the length is
    /// kept; a HEAD handler that wrote no body may state the length itself.
    pub fn into_hyper(self, is_head: bool) -> Response<Full<Bytes>> {
        let stated = is_head && self.body.is_empty();
        let content_length = match self.headers.get(CONTENT_LENGTH) {
            Some(value) if stated => value.clone(),
            _ => HeaderValue::from(self.body.len()),
        };

        let body = if is_head {
            Bytes::new()
        } else {
            Bytes::from(self.body)
        };

        let mut response = Response::new(Full::new(body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
            .headers_mut()
            .insert(CONTENT_LENGTH, content_length);
        response
    }
}

impl ResponseSink for BufferedResponse {
    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn status(&self) -> StatusCode {
        self.status
    }

    fn set_header(&mut self, name: &str, value: &str) {
        if !self.body.is_empty() {
            logger::log_warning(&format!(
                "Header '{name}' set after body bytes were written, ignored"
            ));
            return;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                if is_single_valued(&name) {
                    self.headers.insert(name, value);
                } else {
                    self.headers.append(name, value);
                }
            }
            _ => logger::log_warning(&format!("Invalid response header '{name}: {value}'")),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.body.extend_from_slice(bytes);
        Ok(())
    }

    fn body_len(&self) -> usize {
        self.body.len()
    }
}

/// Headers a response carries at most once
fn is_single_valued(name: &HeaderName) -> bool {
    [CONTENT_TYPE, CONTENT_LENGTH, CONTENT_RANGE, LOCATION].contains(name)
}

/// Write a complete plain-text response
pub fn write_plain(res: &mut dyn ResponseSink, status: StatusCode, body: &str) -> io::Result<()> {
    res.set_status(status);
    res.set_header("Content-Type", "text/plain; charset=utf-8");
    res.set_header("Content-Length", &body.len().to_string());
    res.write(body.as_bytes())
}

/// Write a redirect response
pub fn write_redirect(
    res: &mut dyn ResponseSink,
    status: StatusCode,
    target: &str,
) -> io::Result<()> {
    res.set_status(status);
    res.set_header("Location", target);
    write_plain_body(res, "Redirecting...")
}

fn write_plain_body(res: &mut dyn ResponseSink, body: &str) -> io::Result<()> {
    res.set_header("Content-Type", "text/plain; charset=utf-8");
    res.write(body.as_bytes())
}

/// Last-resort response when dispatch itself could not complete
pub fn build_500_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(500)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("500 Internal Server Error")))
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build 500 response: {e}"));
            Response::new(Full::new(Bytes::from("500 Internal Server Error")))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_headers_repeatable() {
        let mut res = BufferedResponse::new();
        res.set_header("Set-Cookie", "a=1");
        res.set_header("Set-Cookie", "b=2");
        assert_eq!(res.headers().get_all("set-cookie").iter().count(), 2);
    }

    #[test]
    fn test_header_after_body_ignored() {
        let mut res = BufferedResponse::new();
        res.write(b"x").unwrap();
        res.set_header("X-Late", "1");
        assert!(res.header("x-late").is_none());
    }

    #[test]
    fn test_entity_headers_replace() {
        let mut res = BufferedResponse::new();
        res.set_header("Content-Type", "text/plain");
        res.set_header("content-type", "text/html");
        res.set_header("Content-Length", "3");
        res.set_header("Content-Length", "7");
        assert_eq!(res.headers().get_all("content-type").iter().count(), 1);
        assert_eq!(res.header("content-type"), Some("text/html"));
        assert_eq!(res.headers().get_all("content-length").iter().count(), 1);
    }

    #[test]
    fn test_content_length_follows_body() {
        let mut res = BufferedResponse::new();
        res.set_header("Content-Length", "1");
        res.write(b"-").unwrap();
        res.write(b"hello world").unwrap();
        let resp = res.into_hyper(false);
        assert_eq!(resp.headers()[CONTENT_LENGTH], "12");
        assert_eq!(resp.headers().get_all(CONTENT_LENGTH).iter().count(), 1);
    }

    #[test]
    fn test_bodyless_head_keeps_stated_length() {
        let mut res = BufferedResponse::new();
        res.set_header("Content-Length", "512");
        assert_eq!(res.into_hyper(true).headers()[CONTENT_LENGTH], "512");
    }

    #[test]
    fn test_head_keeps_content_length() {
        let mut res = BufferedResponse::new();
        res.set_status(StatusCode::PARTIAL_CONTENT);
        res.write(b"0123456789").unwrap();
        let resp = res.into_hyper(true);
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(resp.headers()[CONTENT_LENGTH], "10");
    }

    #[test]
    fn test_sink_writer_copies() {
        let mut res = BufferedResponse::new();
        io::copy(&mut &b"streamed"[..], &mut SinkWriter(&mut res)).unwrap();
        SinkWriter(&mut res).flush().unwrap();
        assert_eq!(res.body(), b"streamed");
    }

    #[test]
    fn test_write_redirect() {
        let mut res = BufferedResponse::new();
        write_redirect(&mut res, StatusCode::FOUND, "/login").unwrap();
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.header("location"), Some("/login"));
    }
}
