//! Control point model.
//!
//! # Data Flow
//! ```text
//! sentinel (file, remote, ...)
//!     → FileRecord / remote payload
//!     → ControlPoint (identity only)
//!     → Model (complete snapshot, unique by code)
//!     → engine rebuilds its route table
//! ```
//!
//! # Design Decisions
//! - A Model is always a complete snapshot, never a diff
//! - Code uniqueness is enforced on construction (last write wins)
//! - Snapshots are immutable once built and shared by value

pub mod info;

pub use info::{ControlPointInfo, Info, Kind};

use std::collections::BTreeMap;

/// A simulated endpoint description.
///
/// Only carries identity today; behavior loaded from the file body will hang
/// off this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlPoint {
    pub info: ControlPointInfo,
}

impl ControlPoint {
    pub fn new(info: ControlPointInfo) -> Self {
        Self { info }
    }

    /// Unique identifier of this control point.
    pub fn code(&self) -> &str {
        &self.info.code
    }
}

/// A complete snapshot of control points, keyed by code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    points: BTreeMap<String, ControlPoint>,
}

impl Model {
    /// An empty model (engine identity only).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Insert a control point, replacing any existing entry with the same code.
    pub fn insert(&mut self, point: ControlPoint) -> Option<ControlPoint> {
        self.points.insert(point.code().to_string(), point)
    }

    pub fn get(&self, code: &str) -> Option<&ControlPoint> {
        self.points.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.points.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Codes present in this snapshot, in sorted order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.points.keys().map(String::as_str)
    }
}

impl FromIterator<ControlPoint> for Model {
    /// Later points overwrite earlier ones sharing a code.
    fn from_iter<I: IntoIterator<Item = ControlPoint>>(iter: I) -> Self {
        let mut model = Model::empty();
        for point in iter {
            model.insert(point);
        }
        model
    }
}
