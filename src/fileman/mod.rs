//! The file manager service
//!
//! [`Fileman`] bundles everything a request needs that is decided at startup: the
//! canonical root, the mount prefixes, the synthesizer with its converters, the
//! extractor chain, the formatter and any extra verbs. It is built once, then shared
//! read-only by every connection.

pub mod registry;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hyper::Method;
use thiserror::Error;

use crate::config::FilemanConfig;
use crate::convert::{Converter, Synthesizer};
use crate::error::FilemanError;
use crate::extract::{Extractor, ExtractorChain};
use crate::format::{Formatter, HtmlFormatter};
use crate::handler::MethodExtension;
use crate::http::path;

/// Default I/O buffer for streaming file content
pub const DEFAULT_BUFFER: usize = 8 * 1024;

/// Default request body limit (100 MiB)
pub const DEFAULT_MAX_BODY_SIZE: u64 = 100 * 1024 * 1024;

/// Verbs the dispatcher always handles itself
pub const BUILTIN_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
    Method::TRACE,
];

/// Startup failures while assembling the service
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("unknown {kind} '{id}' (known: {known})")]
    Unknown {
        kind: &'static str,
        id: String,
        known: String,
    },

    #[error("cannot serve root '{path}': {source}")]
    Root {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("root '{0}' is not a directory")]
    NotADirectory(String),

    #[error("buffer size must be greater than zero")]
    ZeroBuffer,

    #[error("method {0} is already handled by the dispatcher")]
    BuiltinMethod(Method),
}

/// A request path resolved against the served root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Logical path, `""` for the root
    pub logical: String,
    /// Absolute filesystem path inside the root
    pub target: PathBuf,
}

pub struct Fileman {
    root: PathBuf,
    context_path: String,
    servlet_path: String,
    buffer: usize,
    max_body_size: u64,
    synthesizer: Arc<Synthesizer>,
    extractors: ExtractorChain,
    accept_ranges: String,
    formatter: Box<dyn Formatter>,
    extensions: Vec<(Method, Box<dyn MethodExtension>)>,
    allow: String,
}

impl Fileman {
    pub fn builder(root: impl Into<PathBuf>) -> FilemanBuilder {
        FilemanBuilder::new(root)
    }

    /// Assemble the service from the `[fileman]` configuration section
    ///
    /// Every identifier is looked up in the static [`registry`] here, so a typo fails
    /// at startup instead of on the first request.
    pub fn from_config(config: &FilemanConfig, max_body_size: u64) -> Result<Self, SetupError> {
        let mut builder = Self::builder(&config.root)
            .context_path(&config.context_path)
            .servlet_path(&config.servlet_path)
            .buffer(config.buffer)
            .max_body_size(max_body_size)
            .fail_soft(config.fail_soft)
            .formatter(registry::formatter(&config.formatter)?);

        for id in config.fields.names() {
            builder = builder.converter(registry::converter(id)?);
        }
        for id in config.ranges.names() {
            builder = builder.extractor(registry::extractor(id)?);
        }

        builder.build()
    }

    /// Canonical served root
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    pub fn servlet_path(&self) -> &str {
        &self.servlet_path
    }

    pub const fn buffer(&self) -> usize {
        self.buffer
    }

    pub const fn max_body_size(&self) -> u64 {
        self.max_body_size
    }

    /// Shared so listings can synthesize off the async workers
    pub const fn synthesizer(&self) -> &Arc<Synthesizer> {
        &self.synthesizer
    }

    pub const fn extractors(&self) -> &ExtractorChain {
        &self.extractors
    }

    /// `Accept-Ranges` value for file responses
    pub fn accept_ranges(&self) -> &str {
        &self.accept_ranges
    }

    pub fn formatter(&self) -> &dyn Formatter {
        &*self.formatter
    }

    /// Extension registered for a verb the dispatcher does not handle itself
    pub fn extension(&self, method: &Method) -> Option<&dyn MethodExtension> {
        self.extensions
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, ext)| &**ext)
    }

    /// `Allow` header value: built-in verbs followed by registered extensions
    pub fn allow(&self) -> &str {
        &self.allow
    }

    /// Map a raw request path to its logical path and its location under the root
    pub fn resolve(&self, request_path: &str) -> Result<Resolved, FilemanError> {
        let logical =
            path::resolve_logical_path(request_path, &self.context_path, &self.servlet_path)?;
        let target = path::join_root(&self.root, &logical)?;
        Ok(Resolved { logical, target })
    }

    /// Request-rooted URI of a logical path
    pub fn uri_of(&self, logical: &str) -> String {
        path::join_uri(&[&self.context_path, &self.servlet_path, logical])
    }
}

impl std::fmt::Debug for Fileman {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fileman")
            .field("root", &self.root)
            .field("context_path", &self.context_path)
            .field("servlet_path", &self.servlet_path)
            .field("buffer", &self.buffer)
            .field("max_body_size", &self.max_body_size)
            .field("synthesizer", &self.synthesizer)
            .field("extractors", &self.extractors)
            .field("formatter", &self.formatter.name())
            .field("allow", &self.allow)
            .finish()
    }
}

/// Collects the pieces of a [`Fileman`]; defaults match the configuration defaults
pub struct FilemanBuilder {
    root: PathBuf,
    context_path: String,
    servlet_path: String,
    buffer: usize,
    max_body_size: u64,
    fail_soft: bool,
    converters: Vec<Box<dyn Converter>>,
    extractors: Vec<Box<dyn Extractor>>,
    formatter: Box<dyn Formatter>,
    extensions: Vec<(Method, Box<dyn MethodExtension>)>,
}

impl FilemanBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            context_path: String::new(),
            servlet_path: String::new(),
            buffer: DEFAULT_BUFFER,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            fail_soft: true,
            converters: Vec::new(),
            extractors: Vec::new(),
            formatter: Box::new(HtmlFormatter),
            extensions: Vec::new(),
        }
    }

    #[must_use]
    pub fn context_path(mut self, prefix: &str) -> Self {
        self.context_path = prefix.to_string();
        self
    }

    #[must_use]
    pub fn servlet_path(mut self, prefix: &str) -> Self {
        self.servlet_path = prefix.to_string();
        self
    }

    #[must_use]
    pub fn buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer;
        self
    }

    #[must_use]
    pub fn max_body_size(mut self, max: u64) -> Self {
        self.max_body_size = max;
        self
    }

    #[must_use]
    pub fn fail_soft(mut self, fail_soft: bool) -> Self {
        self.fail_soft = fail_soft;
        self
    }

    /// Append a column; columns appear in the order they are added
    #[must_use]
    pub fn converter(mut self, converter: Box<dyn Converter>) -> Self {
        self.converters.push(converter);
        self
    }

    /// Append an extractor; later extractors override earlier ones
    #[must_use]
    pub fn extractor(mut self, extractor: Box<dyn Extractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    #[must_use]
    pub fn formatter(mut self, formatter: Box<dyn Formatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Handle an additional verb; registering the same verb again replaces it
    #[must_use]
    pub fn extension(mut self, method: Method, extension: Box<dyn MethodExtension>) -> Self {
        self.extensions.retain(|(m, _)| *m != method);
        self.extensions.push((method, extension));
        self
    }

    pub fn build(self) -> Result<Fileman, SetupError> {
        if self.buffer == 0 {
            return Err(SetupError::ZeroBuffer);
        }
        if let Some((method, _)) = self
            .extensions
            .iter()
            .find(|(m, _)| BUILTIN_METHODS.contains(m))
        {
            return Err(SetupError::BuiltinMethod(method.clone()));
        }

        let root = self.root.canonicalize().map_err(|source| SetupError::Root {
            path: self.root.display().to_string(),
            source,
        })?;
        if !root.is_dir() {
            return Err(SetupError::NotADirectory(root.display().to_string()));
        }

        let allow = BUILTIN_METHODS
            .iter()
            .chain(self.extensions.iter().map(|(m, _)| m))
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let extractors = ExtractorChain::new(self.extractors);
        let accept_ranges = extractors.accept_ranges();

        Ok(Fileman {
            root,
            context_path: self.context_path,
            servlet_path: self.servlet_path,
            buffer: self.buffer,
            max_body_size: self.max_body_size,
            synthesizer: Arc::new(Synthesizer::new(self.converters, self.fail_soft)),
            extractors,
            accept_ranges,
            formatter: self.formatter,
            extensions: self.extensions,
            allow,
        })
    }
}
