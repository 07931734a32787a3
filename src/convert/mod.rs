//! Metadata converters and the synthesizer that combines them into listing rows
//!
//! A converter produces exactly one named column for one filesystem entry. The
//! synthesizer runs every registered converter once per entry, in registration order,
//! so all rows of a listing share the same columns in the same order.

mod builtin;

pub use builtin::{
    ModifiedConverter, NameConverter, PathConverter, Sha256Converter, SizeConverter,
    TypeConverter,
};

use std::fs::Metadata;
use std::io;
use std::path::Path;

use crate::entry::Properties;
use crate::error::FilemanError;
use crate::logger;

/// Value a failed converter contributes in fail-soft mode
pub const PLACEHOLDER: &str = "";

/// Filesystem entry handed to converters
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    /// Absolute filesystem path
    pub path: &'a Path,
    /// Logical path below the root, `""` for the root
    pub logical: &'a str,
    /// Request-rooted URI
    pub uri: &'a str,
    /// Metadata (symlinks followed)
    pub metadata: &'a Metadata,
}

impl Node<'_> {
    /// Last logical segment, `/` for the root
    pub fn name(&self) -> &str {
        match self.logical.rsplit('/').next() {
            Some(name) if !name.is_empty() => name,
            _ => "/",
        }
    }

    pub fn is_folder(&self) -> bool {
        self.metadata.is_dir()
    }
}

/// A pluggable column
///
/// Converters are shared by all in-flight requests and must not keep per-request state.
pub trait Converter: Send + Sync {
    /// Column name; also the identity of the converter
    fn column(&self) -> &str;

    /// Render this converter's value for one entry
    fn convert(&self, node: &Node<'_>) -> io::Result<String>;
}

/// Runs the active converter list over an entry
pub struct Synthesizer {
    converters: Vec<Box<dyn Converter>>,
    fail_soft: bool,
}

impl Synthesizer {
    /// `fail_soft` decides whether a failing converter degrades to [`PLACEHOLDER`]
    /// or aborts the whole listing
    pub fn new(converters: Vec<Box<dyn Converter>>, fail_soft: bool) -> Self {
        Self {
            converters,
            fail_soft,
        }
    }

    /// Column names in registration order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.converters.iter().map(|c| c.column())
    }

    pub const fn is_fail_soft(&self) -> bool {
        self.fail_soft
    }

    /// Build the ordered column → value mapping for one entry
    pub fn synthesize(&self, node: &Node<'_>) -> Result<Properties, FilemanError> {
        let mut properties = Properties::with_capacity(self.converters.len());
        for converter in &self.converters {
            let value = match converter.convert(node) {
                Ok(value) => value,
                Err(e) if self.fail_soft => {
                    logger::log_warning(&format!(
                        "Converter '{}' failed for '{}': {e}",
                        converter.column(),
                        node.logical
                    ));
                    PLACEHOLDER.to_string()
                }
                Err(e) => return Err(FilemanError::Io(e)),
            };
            properties.insert(converter.column(), value);
        }
        Ok(properties)
    }
}

impl std::fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synthesizer")
            .field("columns", &self.columns().collect::<Vec<_>>())
            .field("fail_soft", &self.fail_soft)
            .finish()
    }
}
