//! DELETE handler.

use std::io;
use std::path::Path;

use hyper::{Response, StatusCode};

use crate::error::FilemanError;
use crate::fileman::Resolved;
use crate::http::response::{self, Body};

/// Recursively delete the resolved path
///
/// A missing path is 404, not an I/O failure. Symlinks are removed themselves, never
/// followed. The served `root` can not be deleted, however the path spells it.
pub(crate) async fn remove(resolved: &Resolved, root: &Path) -> Result<Response<Body>, FilemanError> {
    if resolved.logical.is_empty() || resolved.target == root {
        return Err(FilemanError::Conflict("refusing to delete the root".to_string()));
    }

    let metadata = match tokio::fs::symlink_metadata(&resolved.target).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(FilemanError::NotFound(resolved.logical.clone()));
        }
        Err(e) => return Err(e.into()),
    };

    if metadata.is_dir() {
        tokio::fs::remove_dir_all(&resolved.target).await?;
    } else {
        tokio::fs::remove_file(&resolved.target).await?;
    }

    Ok(response::build_status_response(StatusCode::OK))
}
