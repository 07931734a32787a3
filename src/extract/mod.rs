//! Partial content extractors
//!
//! Extractors declare which `(file, ranges)` requests they can serve. The chain keeps
//! them in registration order and picks the last one that still claims support, so a
//! specialized extractor registered later overrides a general one for the cases it
//! covers without removing the default.

mod byte_range;

pub use byte_range::ByteExtractor;

use std::path::Path;

use hyper::Response;

use crate::error::FilemanError;
use crate::http::range::ByteRange;
use crate::http::response::Body;

/// Per-request facts an extractor needs besides the file and ranges
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    /// Total file length in bytes
    pub length: u64,
    /// Probed content type of the file
    pub content_type: &'a str,
    /// Value for the `Accept-Ranges` header
    pub accept_ranges: &'a str,
    /// I/O buffer size for streaming
    pub buffer: usize,
}

/// A pluggable partial-content server
///
/// Extractors are shared by all in-flight requests and must not keep per-request state.
pub trait Extractor: Send + Sync {
    /// Name advertised in `Accept-Ranges`
    fn name(&self) -> &str;

    /// Whether this extractor can serve `ranges` of `file`
    fn supports(&self, file: &Path, ranges: &[ByteRange]) -> bool;

    /// Build the 206 response streaming exactly the requested bytes
    fn extract(
        &self,
        file: &Path,
        ranges: &[ByteRange],
        ctx: &ExtractContext<'_>,
    ) -> Result<Response<Body>, FilemanError>;
}

/// Ordered extractor list with last-match-wins selection
#[derive(Default)]
pub struct ExtractorChain {
    extractors: Vec<Box<dyn Extractor>>,
}

impl ExtractorChain {
    pub fn new(extractors: Vec<Box<dyn Extractor>>) -> Self {
        Self { extractors }
    }

    /// Append an extractor; it takes precedence over every earlier one it overlaps with
    pub fn register(&mut self, extractor: Box<dyn Extractor>) {
        self.extractors.push(extractor);
    }

    /// Pick the most recently registered extractor supporting the request
    pub fn select(&self, file: &Path, ranges: &[ByteRange]) -> Option<&dyn Extractor> {
        self.extractors
            .iter()
            .rev()
            .find(|e| e.supports(file, ranges))
            .map(|e| &**e)
    }

    /// Installed extractor names in registration order, without duplicates
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::with_capacity(self.extractors.len());
        for name in self.extractors.iter().map(|e| e.name()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// `Accept-Ranges` header value; `none` when nothing is installed
    pub fn accept_ranges(&self) -> String {
        let names = self.names();
        if names.is_empty() {
            "none".to_string()
        } else {
            names.join(", ")
        }
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

impl std::fmt::Debug for ExtractorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorChain")
            .field("extractors", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response;

    /// Advertises its tag as name so the selection can be observed
    struct Tagged {
        tag: &'static str,
        single_only: bool,
    }

    impl Extractor for Tagged {
        fn name(&self) -> &str {
            self.tag
        }

        fn supports(&self, _file: &Path, ranges: &[ByteRange]) -> bool {
            !self.single_only || ranges.len() == 1
        }

        fn extract(
            &self,
            _file: &Path,
            _ranges: &[ByteRange],
            _ctx: &ExtractContext<'_>,
        ) -> Result<Response<Body>, FilemanError> {
            Ok(Response::new(response::full(self.tag)))
        }
    }

    fn tagged(tag: &'static str, single_only: bool) -> Box<dyn Extractor> {
        Box::new(Tagged { tag, single_only })
    }

    const ONE: &[ByteRange] = &[ByteRange { start: 0, end: 1 }];
    const TWO: &[ByteRange] = &[
        ByteRange { start: 0, end: 1 },
        ByteRange { start: 4, end: 5 },
    ];

    #[test]
    fn test_last_supporting_extractor_wins() {
        let chain = ExtractorChain::new(vec![tagged("general", false), tagged("special", true)]);
        let file = Path::new("x");

        assert_eq!(chain.select(file, ONE).map(|e| e.name()), Some("special"));
        // The specialized one declines, so the earlier general extractor serves it
        assert_eq!(chain.select(file, TWO).map(|e| e.name()), Some("general"));
    }

    #[test]
    fn test_registration_overrides_earlier_extractors() {
        let mut chain = ExtractorChain::new(vec![tagged("general", false)]);
        chain.register(tagged("override", false));
        assert_eq!(
            chain.select(Path::new("x"), TWO).map(|e| e.name()),
            Some("override")
        );
    }

    #[test]
    fn test_no_supporting_extractor() {
        let chain = ExtractorChain::new(vec![tagged("single", true)]);
        assert!(chain.select(Path::new("x"), TWO).is_none());
    }

    #[test]
    fn test_accept_ranges() {
        assert_eq!(ExtractorChain::default().accept_ranges(), "none");
        let chain = ExtractorChain::new(vec![
            tagged("bytes", false),
            tagged("lines", true),
            tagged("bytes", true),
        ]);
        assert_eq!(chain.accept_ranges(), "bytes, lines");
    }
}
