//! Directory listing handler.

use std::fs::Metadata;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use hyper::Response;

use super::router::RequestContext;
use crate::convert::{Node, Synthesizer};
use crate::entry::Entry;
use crate::error::FilemanError;
use crate::fileman::Resolved;
use crate::format::FormatContext;
use crate::http::path;
use crate::http::response::Body;
use crate::logger;

/// Synthesize the folder and its children, then hand the tree to the formatter
///
/// Children are listed in name order. Entries that cannot be listed (dangling symlinks,
/// non-UTF-8 names, links out of the root) are skipped with a warning.
pub(crate) async fn list(
    ctx: &RequestContext<'_>,
    resolved: &Resolved,
    metadata: &Metadata,
) -> Result<Response<Body>, FilemanError> {
    let fileman = ctx.fileman;
    let format_ctx = FormatContext {
        request_path: ctx.path,
    };

    // Non-canonical request: nothing to synthesize
    if let Some(redirect) = fileman.formatter().redirect(&format_ctx) {
        return Ok(redirect);
    }

    let mut dir = tokio::fs::read_dir(&resolved.target).await?;
    let mut names = Vec::new();
    while let Some(child) = dir.next_entry().await? {
        match child.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => logger::log_warning(&format!(
                "Skipping non-UTF-8 entry {name:?} in '{}'",
                resolved.logical
            )),
        }
    }
    names.sort_unstable();

    let mut found = Vec::with_capacity(names.len());
    for name in names {
        let logical = format!("{}/{name}", resolved.logical);
        let child_path = match path::join_root(fileman.root(), &logical) {
            Ok(child_path) => child_path,
            Err(FilemanError::PathEscape(_)) => continue,
            Err(e) => {
                logger::log_warning(&format!("Skipping '{logical}': {e}"));
                continue;
            }
        };
        let child_metadata = match tokio::fs::metadata(&child_path).await {
            Ok(child_metadata) => child_metadata,
            Err(e) => {
                logger::log_warning(&format!("Skipping '{logical}': {e}"));
                continue;
            }
        };
        found.push(Found {
            uri: fileman.uri_of(&logical),
            logical,
            path: child_path,
            metadata: child_metadata,
        });
    }
    let folder = Found {
        uri: fileman.uri_of(&resolved.logical),
        logical: resolved.logical.clone(),
        path: resolved.target.clone(),
        metadata: metadata.clone(),
    };

    // Converters may read whole files, keep them off the async workers
    let synthesizer = Arc::clone(fileman.synthesizer());
    let entry = tokio::task::spawn_blocking(move || synthesize(&synthesizer, folder, found))
        .await
        .map_err(|e| FilemanError::Io(io::Error::other(e)))??;

    fileman.formatter().format(&entry, &format_ctx)
}

/// A listed path with everything the converters need, owned for the blocking pool
struct Found {
    uri: String,
    logical: String,
    path: PathBuf,
    metadata: Metadata,
}

impl Found {
    fn node(&self) -> Node<'_> {
        Node {
            path: &self.path,
            logical: &self.logical,
            uri: &self.uri,
            metadata: &self.metadata,
        }
    }
}

fn synthesize(
    synthesizer: &Synthesizer,
    folder: Found,
    found: Vec<Found>,
) -> Result<Entry, FilemanError> {
    let mut children = Vec::with_capacity(found.len());
    for child in found {
        let properties = synthesizer.synthesize(&child.node())?;
        children.push(if child.metadata.is_dir() {
            Entry::folder(child.uri, child.logical, properties, Vec::new())
        } else {
            Entry::file(child.uri, child.logical, properties)
        });
    }

    let properties = synthesizer.synthesize(&folder.node())?;
    Ok(Entry::folder(folder.uri, folder.logical, properties, children))
}
