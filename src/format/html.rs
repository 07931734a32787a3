//! Tabular HTML listing.

use std::fmt::Write;

use hyper::Response;

use super::{escape_markup, FormatContext, Formatter};
use crate::entry::Entry;
use crate::error::FilemanError;
use crate::http::path::percent_encode;
use crate::http::response::{self, Body};

/// "Index of" page with one table row per child
///
/// The parent row comes first, then one row per child. The first column of every
/// child row links to the child; folders link with a trailing slash so the next listing
/// is already in canonical form. The root is its own parent.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlFormatter;

impl Formatter for HtmlFormatter {
    fn name(&self) -> &str {
        "html"
    }

    fn redirect(&self, ctx: &FormatContext<'_>) -> Option<Response<Body>> {
        if ctx.request_path.ends_with('/') {
            return None;
        }
        Some(response::build_redirect_response(&format!(
            "{}/",
            ctx.request_path
        )))
    }

    fn format(&self, entry: &Entry, ctx: &FormatContext<'_>) -> Result<Response<Body>, FilemanError> {
        if let Some(redirect) = self.redirect(ctx) {
            return Ok(redirect);
        }
        Ok(response::build_document_response(
            render(entry),
            "text/html; charset=utf-8",
        ))
    }
}

fn render(entry: &Entry) -> String {
    let title = escape_markup(if entry.path().is_empty() { "/" } else { entry.path() });
    let columns: Vec<&str> = entry.properties().columns().collect();

    let mut html = String::with_capacity(1024 + entry.children().len() * 128);
    let _ = writeln!(html, "<!DOCTYPE html>");
    let _ = writeln!(html, "<html>");
    let _ = writeln!(html, "<head>");
    let _ = writeln!(html, "    <meta charset=\"utf-8\">");
    let _ = writeln!(html, "    <title>Index of {title}</title>");
    let _ = writeln!(html, "</head>");
    let _ = writeln!(html, "<body>");
    let _ = writeln!(html, "<h1>Index of {title}</h1>");
    let _ = writeln!(html, "<table cellspacing=\"10\">");
    let _ = writeln!(html, "    <thead>");
    let _ = writeln!(html, "        <tr>");
    for column in &columns {
        let _ = writeln!(html, "            <th align=\"left\">{}</th>", escape_markup(column));
    }
    let _ = writeln!(html, "        </tr>");
    let _ = writeln!(html, "    </thead>");
    let _ = writeln!(html, "    <tbody>");

    // Never link above the mount
    let parent = if entry.path().is_empty() { "./" } else { "../" };
    let _ = writeln!(html, "        <tr>");
    let _ = writeln!(
        html,
        "            <td colspan=\"{}\"><a href=\"{parent}\">Parent Directory</a></td>",
        columns.len().max(1)
    );
    let _ = writeln!(html, "        </tr>");

    for child in entry.children() {
        let href = if child.is_folder() {
            format!("{}/", percent_encode(child.name()))
        } else {
            percent_encode(child.name())
        };
        let _ = writeln!(html, "        <tr>");
        for (index, column) in columns.iter().enumerate() {
            let value = escape_markup(child.properties().get(column).unwrap_or_default());
            if index == 0 {
                let _ = writeln!(html, "            <td><a href=\"{href}\">{value}</a></td>");
            } else {
                let _ = writeln!(html, "            <td>{value}</td>");
            }
        }
        let _ = writeln!(html, "        </tr>");
    }

    let _ = writeln!(html, "    </tbody>");
    let _ = writeln!(html, "</table>");
    let _ = writeln!(html, "</body>");
    let _ = writeln!(html, "</html>");
    html
}
