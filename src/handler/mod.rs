//! Request handler module
//!
//! The dispatcher in [`router`] maps each verb onto a handler: GET onto a listing or a
//! download, POST/PUT onto uploads, DELETE onto removal. Verbs it does not know are
//! offered to a registered [`MethodExtension`] before falling back to 405.

mod download;
mod listing;
mod remove;
pub mod router;
mod upload;

pub use router::handle_request;

use std::path::Path;

use hyper::{HeaderMap, Method, Response};

use crate::error::FilemanError;
use crate::fileman::Fileman;
use crate::http::response::Body;

/// What an extension verb gets to see of the request
///
/// The path has already been resolved and checked against the root; the body is not
/// offered.
#[derive(Debug, Clone, Copy)]
pub struct ExtensionRequest<'a> {
    pub method: &'a Method,
    pub headers: &'a HeaderMap,
    /// Logical path, `""` for the root
    pub logical: &'a str,
    /// Absolute filesystem path inside the root
    pub target: &'a Path,
    pub fileman: &'a Fileman,
}

/// Handler for a verb beyond GET, POST, PUT, DELETE, OPTIONS and TRACE
pub trait MethodExtension: Send + Sync {
    fn handle(&self, req: &ExtensionRequest<'_>) -> Result<Response<Body>, FilemanError>;
}
