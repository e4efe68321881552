//! In-memory rendering of a template set, independent of any destination.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{
    entities::{common::RelativePath, template::TemplateId},
    error::DomainError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Text,
    Binary,
}

/// One rendered file.
///
/// Text files keep their decoded content. Binary files keep only their size
/// and a hex payload, which is never part of the serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    kind: FileKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    raw_size: u64,
    #[serde(skip)]
    payload: Option<String>,
}

impl FileRecord {
    /// Classify raw bytes: valid UTF-8 is text, anything else is binary.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let raw_size = bytes.len() as u64;
        match String::from_utf8(bytes) {
            Ok(content) => Self {
                kind: FileKind::Text,
                content: Some(content),
                raw_size,
                payload: None,
            },
            Err(err) => Self {
                kind: FileKind::Binary,
                content: None,
                raw_size,
                payload: Some(hex::encode(err.as_bytes())),
            },
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::from_bytes(content.into().into_bytes())
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn is_text(&self) -> bool {
        self.kind == FileKind::Text
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn raw_size(&self) -> u64 {
        self.raw_size
    }

    /// Hex payload of a binary record.
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    /// The bytes to write for this record.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DomainError> {
        match (&self.content, &self.payload) {
            (Some(text), _) => Ok(text.as_bytes().to_vec()),
            (None, Some(payload)) => hex::decode(payload)
                .map_err(|e| DomainError::InvalidTemplate(format!("corrupt binary payload: {e}"))),
            (None, None) => Ok(Vec::new()),
        }
    }
}

/// Rendered files keyed by relative path, in path order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    template: TemplateId,
    files: BTreeMap<RelativePath, FileRecord>,
}

impl Snapshot {
    pub fn new(template: TemplateId) -> Self {
        Self {
            template,
            files: BTreeMap::new(),
        }
    }

    /// Add a file.
    ///
    /// Two files at the same path, or a file at a path another file needs
    /// as a directory, is a template error.
    pub fn insert(&mut self, path: RelativePath, record: FileRecord) -> Result<(), DomainError> {
        if self.files.contains_key(&path) {
            return Err(DomainError::DuplicatePath {
                path: path.to_string(),
            });
        }
        for existing in self.files.keys() {
            let clash = if is_below(path.as_str(), existing.as_str()) {
                Some((existing, &path))
            } else if is_below(existing.as_str(), path.as_str()) {
                Some((&path, existing))
            } else {
                None
            };
            if let Some((file, nested)) = clash {
                return Err(DomainError::FileDirectoryClash {
                    file: file.to_string(),
                    nested: nested.to_string(),
                });
            }
        }
        self.files.insert(path, record);
        Ok(())
    }

    pub fn template(&self) -> &TemplateId {
        &self.template
    }

    pub fn get(&self, path: &RelativePath) -> Option<&FileRecord> {
        self.files.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RelativePath, &FileRecord)> {
        self.files.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &RelativePath> {
        self.files.keys()
    }

    pub fn files(&self) -> &BTreeMap<RelativePath, FileRecord> {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.values().map(FileRecord::raw_size).sum()
    }
}

/// `path` lies somewhere under `dir`.
fn is_below(path: &str, dir: &str) -> bool {
    path.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'))
}
