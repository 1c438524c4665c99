//! Identity metadata served from every `/_info` endpoint.

use serde::{Deserialize, Serialize};

/// Where an identity comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// The HTTP engine itself.
    Http,
    /// A control point loaded from the watched directory.
    File,
    /// A control point pulled from a remote source.
    Remote,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Http => "http",
            Kind::File => "file",
            Kind::Remote => "remote",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static identity of the engine or of a control point.
///
/// Serialized as `{Name, Code, Version, Desc, EngineKind}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Info {
    pub name: String,
    /// Unique identifier; also the first path segment of the info route.
    pub code: String,
    pub version: String,
    pub desc: String,
    #[serde(rename = "EngineKind")]
    pub kind: Kind,
}

/// Identity of a single control point.
pub type ControlPointInfo = Info;

impl Info {
    /// Identity of this engine, exposed under `code`.
    pub fn engine(code: impl Into<String>) -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            code: code.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            desc: "hot-reloadable control point engine".to_string(),
            kind: Kind::Http,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_json_shape() {
        let info = Info::engine("engine");
        let value = serde_json::to_value(&info).unwrap();

        assert_eq!(value["Name"], "sentinel-engine");
        assert_eq!(value["Code"], "engine");
        assert_eq!(value["EngineKind"], "http");
        assert!(value.get("Desc").is_some());
        assert!(value.get("Version").is_some());
    }
}
