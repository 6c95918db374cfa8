//! The BibTeX record and its rendering.

use std::fmt::{self, Display, Formatter};
use std::slice::Iter;

/// An order-preserving mapping of BibTeX field names to values.
///
/// Insertion order decides output order, so the pipeline can rely on fields
/// appearing exactly as it inserted them. Keys are unique; inserting an
/// existing key overwrites the value without moving the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationFields {
    fields: Vec<(String, String)>,
}

impl CitationFields {
    pub fn new() -> CitationFields {
        CitationFields::default()
    }

    pub fn insert<K, V>(&mut self, name: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        let value = value.into();

        match self.fields.iter().position(|&(ref n, _)| *n == name) {
            Some(existing) => self.fields[existing].1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|&&(ref n, _)| n.as_str() == name)
            .map(|&(_, ref value)| value.as_str())
    }

    pub fn iter(&self) -> Iter<(String, String)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A single BibTeX record, rendered once via `Display`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibTexEntry {
    kind: &'static str,
    pub key: String,
    pub fields: CitationFields,
}

impl BibTexEntry {
    /// Create a `@misc` entry, the only kind this tool emits.
    pub fn misc<K: Into<String>>(key: K, fields: CitationFields) -> BibTexEntry {
        BibTexEntry {
            kind: "misc",
            key: key.into(),
            fields,
        }
    }

    pub fn kind(&self) -> &str {
        self.kind
    }
}

impl Display for BibTexEntry {
    // Tab indentation and the newline placement are part of the format;
    // consumers diff this output textually.
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "@{}{{{},\n", self.kind, self.key)?;

        for &(ref name, ref value) in self.fields.iter() {
            write!(f, "\t{}={{{}}}\n", name, value)?;
        }

        write!(f, "}}")
    }
}
