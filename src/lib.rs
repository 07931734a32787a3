//! Fileman: a file manager served over HTTP
//!
//! A directory tree is mounted under a URL prefix. `GET` on a folder renders a listing
//! whose columns come from pluggable converters, `GET` on a file streams it (optionally
//! partially, through pluggable range extractors), `POST`/`PUT` upload and `DELETE`
//! removes.

pub mod config;
pub mod convert;
pub mod entry;
pub mod error;
pub mod extract;
pub mod fileman;
pub mod format;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use convert::{Converter, Synthesizer};
pub use entry::{Entry, Properties};
pub use error::FilemanError;
pub use extract::{Extractor, ExtractorChain};
pub use fileman::{Fileman, FilemanBuilder, SetupError};
pub use format::Formatter;
pub use handler::{handle_request, ExtensionRequest, MethodExtension};
