//! Build tool catalog
//!
//! Static mapping from a build tool to the marker file whose presence at a
//! repository ref proves the tool is in use. The catalog is built once at
//! startup and shared read-only by every detection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Build tools the detector can recognise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildTool {
    Maven,
    #[serde(rename = "nodejs")]
    NodeJs,
}

impl BuildTool {
    /// Stable identifier used on the wire
    pub fn id(&self) -> &'static str {
        match self {
            BuildTool::Maven => "maven",
            BuildTool::NodeJs => "nodejs",
        }
    }

    /// Marker file proving this build tool is present
    pub fn marker_file(&self) -> &'static str {
        match self {
            BuildTool::Maven => "pom.xml",
            BuildTool::NodeJs => "package.json",
        }
    }
}

impl fmt::Display for BuildTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A single catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTypeCandidate {
    pub tool: BuildTool,
    pub marker_file: String,
}

impl BuildTypeCandidate {
    pub fn new(tool: BuildTool) -> Self {
        Self {
            tool,
            marker_file: tool.marker_file().to_string(),
        }
    }

    pub fn identifier(&self) -> &'static str {
        self.tool.id()
    }
}

/// Ordered list of build tool candidates
///
/// Order is the precedence used when more than one marker file exists in the
/// same repository: the earliest candidate wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTypeCatalog {
    candidates: Vec<BuildTypeCandidate>,
}

impl Default for BuildTypeCatalog {
    fn default() -> Self {
        Self::from_tools(&[BuildTool::Maven, BuildTool::NodeJs])
    }
}

impl BuildTypeCatalog {
    /// Builds a catalog from tools in precedence order, dropping duplicates
    pub fn from_tools(tools: &[BuildTool]) -> Self {
        let mut candidates: Vec<BuildTypeCandidate> = Vec::with_capacity(tools.len());
        for tool in tools {
            if !candidates.iter().any(|c| c.tool == *tool) {
                candidates.push(BuildTypeCandidate::new(*tool));
            }
        }
        Self { candidates }
    }

    pub fn candidates(&self) -> &[BuildTypeCandidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuildTypeCandidate> {
        self.candidates.iter()
    }
}
