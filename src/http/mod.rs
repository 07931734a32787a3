//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the file manager
//! semantics: path resolution, Range parsing, MIME probing and response building.

pub mod mime;
pub mod path;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{parse_range_header, ByteRange, RangeError};
pub use response::Body;
