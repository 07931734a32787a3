//! Upload handlers
//!
//! POST writes every part of the body into the target folder, PUT writes the first part
//! to the target file. A `multipart/form-data` body is split with `multer`; any other
//! non-empty body is a single part without a file name. Parts are streamed to a hidden
//! sibling file and renamed into place once complete, so a failed upload never leaves
//! a truncated file behind.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use http_body_util::LengthLimitError;
use hyper::{Response, StatusCode};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::router::RequestContext;
use crate::error::FilemanError;
use crate::fileman::Resolved;
use crate::http::response::{self, Body};

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Request body as a stream of chunks, already capped at the body size limit
pub(crate) type BodyStream = BoxStream<'static, Result<Bytes, BoxError>>;

/// POST: upload every part into a folder, creating it if needed
pub(crate) async fn post(
    ctx: &RequestContext<'_>,
    resolved: &Resolved,
    body: BodyStream,
) -> Result<Response<Body>, FilemanError> {
    let max = ctx.fileman.max_body_size();
    let mut parts = Parts::new(ctx.content_type, body);
    let Some(first) = parts.next_part(max).await? else {
        return Ok(response::build_status_response(StatusCode::OK));
    };

    match tokio::fs::metadata(&resolved.target).await {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => return Err(FilemanError::Conflict(resolved.logical.clone())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tokio::fs::create_dir_all(&resolved.target)
                .await
                .map_err(|e| {
                    FilemanError::BadRequest(format!(
                        "cannot create folder '{}': {e}",
                        resolved.logical
                    ))
                })?;
        }
        Err(e) => return Err(e.into()),
    }

    let mut current = Some(first);
    while let Some(mut part) = current {
        let name = part.file_name.take().unwrap_or_else(generate_name);
        let dest = resolved.target.join(&name);
        if tokio::fs::metadata(&dest).await.is_ok_and(|m| m.is_dir()) {
            return Err(FilemanError::Conflict(format!("{}/{name}", resolved.logical)));
        }
        write_part(&mut part, &dest, max).await?;

        // multer hands out the next field only once the previous one is gone
        drop(part);
        current = parts.next_part(max).await?;
    }

    Ok(response::build_status_response(StatusCode::CREATED))
}

/// PUT: create or replace a single file with the first part
pub(crate) async fn put(
    ctx: &RequestContext<'_>,
    resolved: &Resolved,
    body: BodyStream,
) -> Result<Response<Body>, FilemanError> {
    let max = ctx.fileman.max_body_size();
    let mut parts = Parts::new(ctx.content_type, body);
    let Some(mut part) = parts.next_part(max).await? else {
        return Ok(response::build_status_response(StatusCode::OK));
    };

    if let Some(parent) = resolved.target.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            FilemanError::BadRequest(format!(
                "cannot create parent of '{}': {e}",
                resolved.logical
            ))
        })?;
    }
    if tokio::fs::metadata(&resolved.target)
        .await
        .is_ok_and(|m| m.is_dir())
    {
        return Err(FilemanError::Conflict(resolved.logical.clone()));
    }

    write_part(&mut part, &resolved.target, max).await?;
    Ok(response::build_status_response(StatusCode::NO_CONTENT))
}

/// The parts of one request body
enum Parts {
    Multipart(multer::Multipart<'static>),
    /// Taken on the first call to `next_part`
    Raw(Option<BodyStream>),
}

/// One uploaded part, read chunk by chunk
struct Part {
    /// Sanitized file name from the part's disposition
    file_name: Option<String>,
    source: Source,
}

enum Source {
    Field(multer::Field<'static>),
    Raw { first: Option<Bytes>, rest: BodyStream },
}

impl Parts {
    fn new(content_type: Option<&str>, body: BodyStream) -> Self {
        match content_type.and_then(|ct| multer::parse_boundary(ct).ok()) {
            Some(boundary) => Self::Multipart(multer::Multipart::new(body, boundary)),
            None => Self::Raw(Some(body)),
        }
    }

    async fn next_part(&mut self, max: u64) -> Result<Option<Part>, FilemanError> {
        match self {
            Self::Multipart(multipart) => {
                let field = multipart
                    .next_field()
                    .await
                    .map_err(|e| multipart_error(e, max))?;
                Ok(field.map(|field| Part {
                    file_name: field.file_name().and_then(sanitize_file_name),
                    source: Source::Field(field),
                }))
            }
            Self::Raw(body) => {
                let Some(mut rest) = body.take() else {
                    return Ok(None);
                };
                // An empty body means no parts at all
                while let Some(chunk) = rest.next().await {
                    let chunk = chunk.map_err(|e| stream_error(e, max))?;
                    if !chunk.is_empty() {
                        return Ok(Some(Part {
                            file_name: None,
                            source: Source::Raw {
                                first: Some(chunk),
                                rest,
                            },
                        }));
                    }
                }
                Ok(None)
            }
        }
    }
}

impl Part {
    async fn chunk(&mut self, max: u64) -> Result<Option<Bytes>, FilemanError> {
        match &mut self.source {
            Source::Field(field) => field.chunk().await.map_err(|e| multipart_error(e, max)),
            Source::Raw { first, rest } => {
                if let Some(chunk) = first.take() {
                    return Ok(Some(chunk));
                }
                rest.next()
                    .await
                    .transpose()
                    .map_err(|e| stream_error(e, max))
            }
        }
    }
}

/// Stream a part into `dest` through a temporary sibling
async fn write_part(part: &mut Part, dest: &Path, max: u64) -> Result<(), FilemanError> {
    let partial = partial_path(dest);
    let mut file = tokio::fs::File::create(&partial).await?;

    let written: Result<(), FilemanError> = async {
        while let Some(chunk) = part.chunk(max).await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }
    .await;
    drop(file);

    let result = match written {
        Ok(()) => tokio::fs::rename(&partial, dest).await.map_err(FilemanError::from),
        Err(e) => Err(e),
    };
    if result.is_err() {
        let _ = tokio::fs::remove_file(&partial).await;
    }
    result
}

fn partial_path(dest: &Path) -> PathBuf {
    dest.with_file_name(format!(".{}.part", Uuid::new_v4().simple()))
}

/// File name for a part that did not bring a usable one
fn generate_name() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Keep only the final path component of a client-supplied file name
fn sanitize_file_name(name: &str) -> Option<String> {
    let name = name.rsplit(&['/', '\\'][..]).next()?.trim();
    if name.is_empty() || name == "." || name == ".." || name.contains('\0') {
        return None;
    }
    Some(name.to_string())
}

fn multipart_error(err: multer::Error, max: u64) -> FilemanError {
    match err {
        multer::Error::StreamReadFailed(source) => stream_error(source, max),
        other => FilemanError::Multipart(other),
    }
}

fn stream_error(err: BoxError, max: u64) -> FilemanError {
    if err.is::<LengthLimitError>() {
        FilemanError::PayloadTooLarge(max)
    } else {
        FilemanError::Io(io::Error::other(err))
    }
}
