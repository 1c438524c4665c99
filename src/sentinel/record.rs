//! File records and the per-watcher index.
//!
//! # Responsibilities
//! - Map a tracked file (path + bytes) to a control point and a digest
//! - Keep one record per code, owned by a single watcher task
//! - Decide whether an event changes the observable model
//!
//! # Design Decisions
//! - The digest, never the mtime, decides whether a write is a change
//! - Index is keyed by code so duplicate codes collapse (last write wins)
//! - Everything here is synchronous and I/O free

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::model::{ControlPoint, ControlPointInfo, Kind, Model};
use crate::sentinel::digest::Digest;

/// Hex characters of the digest exposed as a control point's version.
const VERSION_LEN: usize = 12;

/// Configuration file flavours, identified by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Json,
    Kbl,
}

impl Protocol {
    /// Every protocol the file sentinel understands.
    pub const ALL: [Protocol; 2] = [Protocol::Json, Protocol::Kbl];

    pub fn extension(&self) -> &'static str {
        match self {
            Protocol::Json => "json",
            Protocol::Kbl => "kbl",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        Protocol::ALL.into_iter().find(|p| p.extension() == ext)
    }

    fn describe(&self) -> &'static str {
        match self {
            Protocol::Json => "control point defined in JSON",
            Protocol::Kbl => "control point defined in KBL",
        }
    }
}

/// Code of the control point a file defines: its name minus the extension.
pub fn code_from_path(path: &Path) -> Option<String> {
    let code = path.file_stem()?.to_str()?;
    if code.is_empty() {
        None
    } else {
        Some(code.to_string())
    }
}

/// One tracked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub code: String,
    pub digest: Digest,
    pub point: ControlPoint,
}

impl FileRecord {
    /// Build a record from a file's path and full contents.
    ///
    /// Returns `None` when no code can be derived from the file name.
    pub fn build(path: &Path, protocol: Protocol, contents: &[u8]) -> Option<Self> {
        let code = code_from_path(path)?;
        let digest = Digest::of(contents);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| code.clone());

        let point = ControlPoint::new(ControlPointInfo {
            name,
            code: code.clone(),
            version: digest.short(VERSION_LEN),
            desc: protocol.describe().to_string(),
            kind: Kind::File,
        });

        Some(Self {
            path: path.to_path_buf(),
            code,
            digest,
            point,
        })
    }
}

/// Records of every tracked file, keyed by code.
#[derive(Debug, Default)]
pub struct FileIndex {
    records: HashMap<String, FileRecord>,
}

impl FileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record.
    ///
    /// Returns true when the model changed: the code is new, or the content
    /// or the backing file differs from the tracked record.
    pub fn upsert(&mut self, record: FileRecord) -> bool {
        let changed = match self.records.get(&record.code) {
            Some(prev) => prev.digest != record.digest || prev.path != record.path,
            None => true,
        };

        if changed {
            self.records.insert(record.code.clone(), record);
        }
        changed
    }

    /// Drop the record backed by `path`.
    ///
    /// Returns false for untracked paths, including a file whose code is
    /// tracked but through a different file.
    pub fn remove(&mut self, path: &Path) -> bool {
        let Some(code) = code_from_path(path) else {
            return false;
        };

        match self.records.get(&code) {
            Some(record) if record.path == path => {
                self.records.remove(&code);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Complete model built from every tracked record.
    pub fn snapshot(&self) -> Model {
        self.records.values().map(|r| r.point.clone()).collect()
    }
}
