//! HTTP response building module
//!
//! Provides the response body type shared by every handler plus builders for the
//! status codes the file manager emits.

use bytes::Bytes;
use futures_util::TryStreamExt;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::Frame;
use hyper::header::{
    ACCEPT_RANGES, ALLOW, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE,
    LOCATION,
};
use hyper::{Response, StatusCode};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// Response body: either an in-memory buffer or a file stream
pub type Body = UnsyncBoxBody<Bytes, std::io::Error>;

/// Body holding the given bytes
pub fn full(data: impl Into<Bytes>) -> Body {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Body with no content
pub fn empty() -> Body {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Body streaming a reader with a bounded read buffer of `buffer` bytes
///
/// The reader is dropped (closing any file handle) when the stream ends, fails, or the
/// body is dropped because the client went away.
pub fn stream<R>(reader: R, buffer: usize) -> Body
where
    R: AsyncRead + Send + 'static,
{
    let frames = ReaderStream::with_capacity(reader, buffer).map_ok(Frame::data);
    StreamBody::new(frames).boxed_unsync()
}

/// Build a bodyless response with the given status
pub fn build_status_response(status: StatusCode) -> Response<Body> {
    Response::builder()
        .status(status)
        .body(empty())
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(empty())
        })
}

/// Build a plain text error response carrying only the reason phrase
pub fn build_error_response(status: StatusCode) -> Response<Body> {
    let reason = status.canonical_reason().unwrap_or("Error");
    let text = format!("{} {reason}", status.as_u16());
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CONTENT_LENGTH, text.len())
        .body(full(text.clone()))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(full(text))
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(allow: &str) -> Response<Body> {
    let mut response = build_error_response(StatusCode::METHOD_NOT_ALLOWED);
    if let Ok(value) = allow.parse() {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(length: u64) -> Response<Body> {
    let mut response = build_error_response(StatusCode::RANGE_NOT_SATISFIABLE);
    if let Ok(value) = format!("bytes */{length}").parse() {
        response.headers_mut().insert(CONTENT_RANGE, value);
    }
    response
}

/// Build OPTIONS response enumerating the dispatched verbs
pub fn build_options_response(allow: &str) -> Response<Body> {
    Response::builder()
        .status(StatusCode::OK)
        .header(ALLOW, allow)
        .header(CONTENT_LENGTH, 0)
        .body(empty())
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(empty())
        })
}

/// Build 302 redirect response
pub fn build_redirect_response(target: &str) -> Response<Body> {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, target)
        .header(CONTENT_LENGTH, 0)
        .body(empty())
        .unwrap_or_else(|e| {
            log_build_error("302", &e);
            build_error_response(StatusCode::INTERNAL_SERVER_ERROR)
        })
}

/// Build a 200 response for a rendered document
pub fn build_document_response(content: impl Into<Bytes>, content_type: &str) -> Response<Body> {
    let content = content.into();
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, content.len())
        .body(full(content))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            build_error_response(StatusCode::INTERNAL_SERVER_ERROR)
        })
}

/// Build whole-file download response
pub fn build_download_response(
    body: Body,
    content_type: &str,
    length: u64,
    disposition: &str,
    accept_ranges: &str,
) -> Response<Body> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, length)
        .header(CONTENT_DISPOSITION, disposition)
        .header(ACCEPT_RANGES, accept_ranges)
        .body(body)
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            build_error_response(StatusCode::INTERNAL_SERVER_ERROR)
        })
}

/// Build 206 Partial Content response
pub fn build_partial_response(
    body: Body,
    content_type: &str,
    start: u64,
    end: u64,
    total_size: u64,
    accept_ranges: &str,
) -> Response<Body> {
    let content_length = end - start + 1;

    Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, content_length)
        .header(CONTENT_RANGE, format!("bytes {start}-{end}/{total_size}"))
        .header(ACCEPT_RANGES, accept_ranges)
        .body(body)
        .unwrap_or_else(|e| {
            log_build_error("206", &e);
            build_error_response(StatusCode::INTERNAL_SERVER_ERROR)
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
