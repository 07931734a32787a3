//! Static table of the converters, extractors and formatters that configuration
//! identifiers can name.

use super::SetupError;
use crate::convert::{
    Converter, ModifiedConverter, NameConverter, PathConverter, Sha256Converter, SizeConverter,
    TypeConverter,
};
use crate::extract::{ByteExtractor, Extractor};
use crate::format::{Formatter, HtmlFormatter, JsonFormatter, XmlFormatter};

pub const CONVERTERS: &[&str] = &["name", "size", "modified", "type", "path", "sha256"];
pub const EXTRACTORS: &[&str] = &["bytes"];
pub const FORMATTERS: &[&str] = &["html", "xml", "json"];

/// Instantiate the converter registered under `id`
pub fn converter(id: &str) -> Result<Box<dyn Converter>, SetupError> {
    Ok(match id {
        "name" => Box::new(NameConverter),
        "size" => Box::new(SizeConverter),
        "modified" => Box::new(ModifiedConverter),
        "type" => Box::new(TypeConverter),
        "path" => Box::new(PathConverter),
        "sha256" => Box::new(Sha256Converter),
        _ => return Err(unknown("converter", id, CONVERTERS)),
    })
}

/// Instantiate the extractor registered under `id`
pub fn extractor(id: &str) -> Result<Box<dyn Extractor>, SetupError> {
    Ok(match id {
        "bytes" => Box::new(ByteExtractor),
        _ => return Err(unknown("extractor", id, EXTRACTORS)),
    })
}

/// Instantiate the formatter registered under `id`
pub fn formatter(id: &str) -> Result<Box<dyn Formatter>, SetupError> {
    Ok(match id {
        "html" => Box::new(HtmlFormatter),
        "xml" => Box::new(XmlFormatter),
        "json" => Box::new(JsonFormatter),
        _ => return Err(unknown("formatter", id, FORMATTERS)),
    })
}

fn unknown(kind: &'static str, id: &str, known: &[&str]) -> SetupError {
    SetupError::Unknown {
        kind,
        id: id.to_string(),
        known: known.join(", "),
    }
}
