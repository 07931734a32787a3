//! Built-in converters.

use std::fs::File;
use std::io;

use chrono::{DateTime, Local};
use sha2::{Digest, Sha256};

use super::{Converter, Node};
use crate::http::mime;

/// Shown for columns that have no meaning for folders
const NOT_APPLICABLE: &str = "-";

const MODIFIED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Entry name
#[derive(Debug, Clone, Copy, Default)]
pub struct NameConverter;

impl Converter for NameConverter {
    fn column(&self) -> &str {
        "name"
    }

    fn convert(&self, node: &Node<'_>) -> io::Result<String> {
        Ok(node.name().to_string())
    }
}

/// File length in bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeConverter;

impl Converter for SizeConverter {
    fn column(&self) -> &str {
        "size"
    }

    fn convert(&self, node: &Node<'_>) -> io::Result<String> {
        if node.is_folder() {
            return Ok(NOT_APPLICABLE.to_string());
        }
        Ok(node.metadata.len().to_string())
    }
}

/// Last modification time, local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct ModifiedConverter;

impl Converter for ModifiedConverter {
    fn column(&self) -> &str {
        "modified"
    }

    fn convert(&self, node: &Node<'_>) -> io::Result<String> {
        let modified: DateTime<Local> = node.metadata.modified()?.into();
        Ok(modified.format(MODIFIED_FORMAT).to_string())
    }
}

/// Probed content type, `directory` for folders
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeConverter;

impl Converter for TypeConverter {
    fn column(&self) -> &str {
        "type"
    }

    fn convert(&self, node: &Node<'_>) -> io::Result<String> {
        if node.is_folder() {
            return Ok("directory".to_string());
        }
        Ok(mime::probe_content_type(node.path).to_string())
    }
}

/// Logical path below the served root
#[derive(Debug, Clone, Copy, Default)]
pub struct PathConverter;

impl Converter for PathConverter {
    fn column(&self) -> &str {
        "path"
    }

    fn convert(&self, node: &Node<'_>) -> io::Result<String> {
        if node.logical.is_empty() {
            return Ok("/".to_string());
        }
        Ok(node.logical.to_string())
    }
}

/// Hex SHA-256 of the file content; reads the whole file
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Converter;

impl Converter for Sha256Converter {
    fn column(&self) -> &str {
        "sha256"
    }

    fn convert(&self, node: &Node<'_>) -> io::Result<String> {
        if node.is_folder() {
            return Ok(NOT_APPLICABLE.to_string());
        }
        let mut file = File::open(node.path)?;
        let mut hasher = Sha256::new();
        io::copy(&mut file, &mut hasher)?;
        Ok(hex::encode(hasher.finalize()))
    }
}
