//! Request dispatch module
//!
//! Entry point for HTTP request processing: body size validation, method dispatch and
//! error-to-status mapping.

use bytes::Bytes;
use futures_util::StreamExt;
use http_body_util::{BodyExt, Limited};
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, RANGE};
use hyper::{HeaderMap, Method, Request, Response, StatusCode};

use super::upload::{BodyStream, BoxError};
use super::{download, listing, remove, upload, ExtensionRequest};
use crate::error::FilemanError;
use crate::fileman::{Fileman, Resolved};
use crate::http::response::{self, Body};
use crate::logger;

/// Request facts shared by the verb handlers
pub struct RequestContext<'a> {
    /// Raw request path exactly as received
    pub path: &'a str,
    pub range_header: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub fileman: &'a Fileman,
}

/// Main entry point for HTTP request handling
///
/// Never fails: every error is mapped onto its status code here, and 5xx errors are
/// logged with their internal detail before the bare status goes out.
pub async fn handle_request<B>(req: Request<B>, fileman: &Fileman) -> Response<Body>
where
    B: hyper::body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    // 1. Check body size
    if let Some(resp) = check_body_size(req.headers(), fileman.max_body_size()) {
        return resp;
    }

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match dispatch(req, fileman).await {
        Ok(resp) => resp,
        Err(err) => {
            if err.status().is_server_error() {
                logger::log_error(&format!("{method} {path}: {err}"));
            }
            err.into_response(fileman.allow())
        }
    }
}

/// Route the request by verb
async fn dispatch<B>(req: Request<B>, fileman: &Fileman) -> Result<Response<Body>, FilemanError>
where
    B: hyper::body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    // 2. Verbs that never touch the filesystem
    if let Some(resp) = check_http_method(req.method(), fileman)? {
        return Ok(resp);
    }

    let (parts, body) = req.into_parts();
    let resolved = fileman.resolve(parts.uri.path())?;
    let ctx = RequestContext {
        path: parts.uri.path(),
        range_header: header_str(&parts.headers, RANGE),
        content_type: header_str(&parts.headers, CONTENT_TYPE),
        fileman,
    };

    // 3. Dispatch
    match parts.method {
        Method::GET => get(&ctx, &resolved).await,
        Method::POST => upload::post(&ctx, &resolved, body_stream(body, fileman)).await,
        Method::PUT => upload::put(&ctx, &resolved, body_stream(body, fileman)).await,
        Method::DELETE => remove::remove(&resolved, fileman.root()).await,
        ref method => {
            // check_http_method only lets registered extensions through
            let extension = fileman
                .extension(method)
                .ok_or_else(|| FilemanError::MethodNotAllowed(method.to_string()))?;
            extension.handle(&ExtensionRequest {
                method,
                headers: &parts.headers,
                logical: &resolved.logical,
                target: &resolved.target,
                fileman,
            })
        }
    }
}

/// Answer OPTIONS and TRACE directly and reject verbs nobody handles
fn check_http_method(
    method: &Method,
    fileman: &Fileman,
) -> Result<Option<Response<Body>>, FilemanError> {
    match *method {
        Method::GET | Method::POST | Method::PUT | Method::DELETE => Ok(None),
        Method::OPTIONS => Ok(Some(response::build_options_response(fileman.allow()))),
        Method::TRACE => Ok(Some(response::build_status_response(StatusCode::OK))),
        _ if fileman.extension(method).is_some() => Ok(None),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Err(FilemanError::MethodNotAllowed(method.to_string()))
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<Response<Body>> {
    let content_length = headers.get(CONTENT_LENGTH)?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(response::build_error_response(StatusCode::PAYLOAD_TOO_LARGE))
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

/// GET: listing for folders, download for files
async fn get(ctx: &RequestContext<'_>, resolved: &Resolved) -> Result<Response<Body>, FilemanError> {
    let metadata = match tokio::fs::metadata(&resolved.target).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(FilemanError::NotFound(resolved.logical.clone()));
        }
        Err(e) => return Err(e.into()),
    };

    if metadata.is_dir() {
        listing::list(ctx, resolved, &metadata).await
    } else if metadata.is_file() {
        download::download(ctx, resolved, &metadata).await
    } else {
        Err(FilemanError::NotFound(resolved.logical.clone()))
    }
}

/// Body as a chunk stream capped at the configured size
///
/// The Content-Length check only covers honest clients; chunked bodies are cut off here.
fn body_stream<B>(body: B, fileman: &Fileman) -> BodyStream
where
    B: hyper::body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let limit = usize::try_from(fileman.max_body_size()).unwrap_or(usize::MAX);
    Limited::new(body, limit).into_data_stream().boxed()
}

fn header_str(headers: &HeaderMap, name: hyper::header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
