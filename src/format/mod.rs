//! Listing formatters
//!
//! A formatter renders an [`Entry`] with its children into a response. The tabular
//! HTML formatter also owns the canonical form of listing URIs: folders are only
//! rendered at paths ending in `/`.

mod html;
mod json;
mod xml;

pub use html::HtmlFormatter;
pub use json::JsonFormatter;
pub use xml::XmlFormatter;

use hyper::Response;

use crate::entry::Entry;
use crate::error::FilemanError;
use crate::http::response::Body;

/// Per-request facts a formatter needs besides the entry
#[derive(Debug, Clone, Copy)]
pub struct FormatContext<'a> {
    /// Raw request path exactly as received
    pub request_path: &'a str,
}

/// Renders listings into a wire representation
///
/// Formatters are shared by all in-flight requests and must not keep per-request state.
pub trait Formatter: Send + Sync {
    /// Identifier used in configuration
    fn name(&self) -> &str;

    /// Redirect to issue instead of rendering, if the request is not in canonical form
    ///
    /// Checked before the listing is synthesized; `format` must honor it as well.
    fn redirect(&self, _ctx: &FormatContext<'_>) -> Option<Response<Body>> {
        None
    }

    /// Render the entry
    fn format(&self, entry: &Entry, ctx: &FormatContext<'_>) -> Result<Response<Body>, FilemanError>;
}

/// Escape text for use in HTML/XML content and attribute values
pub(crate) fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markup() {
        assert_eq!(
            escape_markup(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }
}
