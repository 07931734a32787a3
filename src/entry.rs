//! Entry model: one file or folder of the served hierarchy with its synthesized columns.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Ordered column → rendered value mapping
///
/// Column order is the converter registration order and is kept on serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    columns: Vec<(String, String)>,
}

impl Properties {
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
        }
    }

    /// Append a column, replacing the value if the column already exists
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = value,
            None => self.columns.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    /// Column names in order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in &self.columns {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// A node of the served hierarchy, built fresh for every request
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    uri: String,
    path: String,
    folder: bool,
    properties: Properties,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<Entry>,
}

impl Entry {
    /// A file entry; files never have children
    pub fn file(uri: impl Into<String>, path: impl Into<String>, properties: Properties) -> Self {
        Self {
            uri: uri.into(),
            path: path.into(),
            folder: false,
            properties,
            children: Vec::new(),
        }
    }

    pub fn folder(
        uri: impl Into<String>,
        path: impl Into<String>,
        properties: Properties,
        children: Vec<Self>,
    ) -> Self {
        Self {
            uri: uri.into(),
            path: path.into(),
            folder: true,
            properties,
            children,
        }
    }

    /// Absolute, request-rooted URI (decoded form)
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Logical path below the served root, `""` for the root
    pub fn path(&self) -> &str {
        &self.path
    }

    pub const fn is_folder(&self) -> bool {
        self.folder
    }

    pub const fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Last segment of the logical path, `/` for the root
    pub fn name(&self) -> &str {
        match self.path.rsplit('/').next() {
            Some(name) if !name.is_empty() => name,
            _ => "/",
        }
    }
}
