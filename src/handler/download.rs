//! File download handler: whole files and byte ranges.

use std::fs::Metadata;

use hyper::Response;

use super::router::RequestContext;
use crate::error::FilemanError;
use crate::extract::ExtractContext;
use crate::fileman::Resolved;
use crate::http::mime;
use crate::http::path::percent_encode;
use crate::http::range::{count_range_specs, parse_range_header};
use crate::http::response::{self, Body};

pub(crate) async fn download(
    ctx: &RequestContext<'_>,
    resolved: &Resolved,
    metadata: &Metadata,
) -> Result<Response<Body>, FilemanError> {
    let fileman = ctx.fileman;
    let length = metadata.len();
    let content_type = mime::probe_content_type(&resolved.target);

    // A blank Range header counts as absent
    let Some(range_header) = ctx.range_header.filter(|h| !h.trim().is_empty()) else {
        let file = tokio::fs::File::open(&resolved.target).await?;
        let name = resolved
            .target
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        return Ok(response::build_download_response(
            response::stream(file, fileman.buffer()),
            content_type,
            length,
            &format!("attachment; filename=\"{}\"", percent_encode(&name)),
            fileman.accept_ranges(),
        ));
    };

    let ranges = parse_range_header(range_header, length)?;
    // A set naming several ranges is never answered with a single part
    if ranges.len() == 1 && count_range_specs(range_header) > 1 {
        return Err(FilemanError::UnsupportedRange(range_header.to_string()));
    }
    let extractor = fileman
        .extractors()
        .select(&resolved.target, &ranges)
        .ok_or_else(|| FilemanError::UnsupportedRange(range_header.to_string()))?;

    extractor.extract(
        &resolved.target,
        &ranges,
        &ExtractContext {
            length,
            content_type,
            accept_ranges: fileman.accept_ranges(),
            buffer: fileman.buffer(),
        },
    )
}
