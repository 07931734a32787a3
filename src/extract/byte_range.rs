//! Single byte-range extractor.

use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;

use hyper::Response;
use tokio::io::AsyncReadExt;

use super::{ExtractContext, Extractor};
use crate::error::FilemanError;
use crate::http::range::{ByteRange, BYTES_UNIT};
use crate::http::response::{self, Body};

/// Serves exactly one byte range per request
///
/// Multi-range requests are declined; without another extractor they end up as 501.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteExtractor;

impl Extractor for ByteExtractor {
    fn name(&self) -> &str {
        BYTES_UNIT
    }

    fn supports(&self, _file: &Path, ranges: &[ByteRange]) -> bool {
        ranges.len() == 1
    }

    fn extract(
        &self,
        file: &Path,
        ranges: &[ByteRange],
        ctx: &ExtractContext<'_>,
    ) -> Result<Response<Body>, FilemanError> {
        let [range] = ranges else {
            return Err(FilemanError::UnsupportedRange(format!(
                "{} ranges",
                ranges.len()
            )));
        };

        let mut handle = File::open(file)?;
        handle.seek(SeekFrom::Start(range.start))?;
        let reader = tokio::fs::File::from_std(handle).take(range.len());

        Ok(response::build_partial_response(
            response::stream(reader, ctx.buffer),
            ctx.content_type,
            range.start,
            range.end,
            ctx.length,
            ctx.accept_ranges,
        ))
    }
}
