//! HTTP protocol layer module
//!
//! Request/response boundary types plus the protocol pieces file serving
//! needs: byte ranges, content types and error pages.

pub mod error_pages;
pub mod mime;
pub mod range;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use error_pages::{DefaultErrorPages, ErrorPage, ErrorPages};
pub use range::{parse_range_header, ByteRange, RangeParseResult};
pub use request::Request;
pub use response::{BufferedResponse, ResponseSink, SinkWriter};
