//! XML document listing.

use std::fmt::Write;

use hyper::Response;

use super::{escape_markup, FormatContext, Formatter};
use crate::entry::Entry;
use crate::error::FilemanError;
use crate::http::response::{self, Body};

/// Pretty-printed `<entry>` document mirroring the [`Entry`] tree
///
/// Column names are free text, so properties are written as
/// `<property name="...">value</property>` rather than as element names.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlFormatter;

impl Formatter for XmlFormatter {
    fn name(&self) -> &str {
        "xml"
    }

    fn format(&self, entry: &Entry, _ctx: &FormatContext<'_>) -> Result<Response<Body>, FilemanError> {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        write_entry(&mut xml, entry, 0);
        Ok(response::build_document_response(
            xml,
            "application/xml; charset=utf-8",
        ))
    }
}

fn write_entry(xml: &mut String, entry: &Entry, depth: usize) {
    let pad = "  ".repeat(depth);
    let _ = writeln!(xml, "{pad}<entry>");
    let _ = writeln!(xml, "{pad}  <uri>{}</uri>", escape_markup(entry.uri()));
    let _ = writeln!(xml, "{pad}  <path>{}</path>", escape_markup(entry.path()));
    let _ = writeln!(xml, "{pad}  <folder>{}</folder>", entry.is_folder());
    let _ = writeln!(xml, "{pad}  <properties>");
    for (column, value) in entry.properties().iter() {
        let _ = writeln!(
            xml,
            "{pad}    <property name=\"{}\">{}</property>",
            escape_markup(column),
            escape_markup(value)
        );
    }
    let _ = writeln!(xml, "{pad}  </properties>");
    if !entry.children().is_empty() {
        let _ = writeln!(xml, "{pad}  <children>");
        for child in entry.children() {
            write_entry(xml, child, depth + 2);
        }
        let _ = writeln!(xml, "{pad}  </children>");
    }
    let _ = writeln!(xml, "{pad}</entry>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::fixtures;
    use http_body_util::BodyExt;
    use hyper::header::CONTENT_TYPE;

    #[tokio::test]
    async fn test_renders_tree_without_redirect() {
        // No canonical-form redirect for machine formats
        let ctx = FormatContext {
            request_path: "/files/sub",
        };
        let response = XmlFormatter.format(&fixtures::listing(), &ctx).unwrap();
        assert_eq!(response.headers()[CONTENT_TYPE], "application/xml; charset=utf-8");

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let xml = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<uri>/files/sub</uri>"));
        assert!(xml.contains("<folder>true</folder>"));
        assert!(xml.contains("<property name=\"name\">a.txt</property>"));
        assert!(xml.contains("<property name=\"size\">10</property>"));
        assert_eq!(xml.matches("<entry>").count(), 3);
        assert_eq!(xml.matches("</entry>").count(), 3);
    }
}
