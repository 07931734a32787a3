//! JSON listing.

use hyper::Response;

use super::{FormatContext, Formatter};
use crate::entry::Entry;
use crate::error::FilemanError;
use crate::http::response::{self, Body};

/// Pretty-printed JSON of the [`Entry`] tree, columns in registration order
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn name(&self) -> &str {
        "json"
    }

    fn format(&self, entry: &Entry, _ctx: &FormatContext<'_>) -> Result<Response<Body>, FilemanError> {
        let json = serde_json::to_vec_pretty(entry)
            .map_err(|e| FilemanError::Io(std::io::Error::other(e)))?;
        Ok(response::build_document_response(json, "application/json"))
    }
}
