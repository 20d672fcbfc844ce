//! Decoded report definitions, as handed to the extraction pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    /// Single `Report/Layout` JSON document.
    Legacy,
    /// PBIR folder: `pages.json`, one `page.json` per page, one `visual.json` per visual.
    Directory,
}

impl SchemaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Directory => "directory",
        }
    }
}

/// Named text documents of a PBIR report definition, keyed by forward-slash path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryDocuments {
    files: BTreeMap<String, String>,
}

impl DirectoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl AsRef<str>, text: impl Into<String>) {
        self.files.insert(normalize_doc_path(path.as_ref()), text.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(&normalize_doc_path(path)).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl<P: AsRef<str>, T: Into<String>> FromIterator<(P, T)> for DirectoryDocuments {
    fn from_iter<I: IntoIterator<Item = (P, T)>>(iter: I) -> Self {
        let mut docs = DirectoryDocuments::new();
        for (path, text) in iter {
            docs.insert(path, text);
        }
        docs
    }
}

/// A decoded report definition in one of the two supported schemas.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportSource {
    Legacy(Value),
    Directory(DirectoryDocuments),
}

impl ReportSource {
    pub fn schema(&self) -> SchemaKind {
        match self {
            Self::Legacy(_) => SchemaKind::Legacy,
            Self::Directory(_) => SchemaKind::Directory,
        }
    }
}

fn normalize_doc_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let trimmed = path.trim_start_matches("./").trim_start_matches('/');
    trimmed.to_string()
}
