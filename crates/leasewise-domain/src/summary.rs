//! Summary kinds

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target structure for a document summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    /// One or two prose paragraphs
    Brief,
    /// Labeled sections covering every major clause
    Comprehensive,
    /// Numbered list of the key terms
    KeyPoints,
}

impl SummaryKind {
    /// All kinds in display order
    pub const ALL: [SummaryKind; 3] = [
        SummaryKind::Brief,
        SummaryKind::Comprehensive,
        SummaryKind::KeyPoints,
    ];

    /// Storage key, also accepted by `FromStr`
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryKind::Brief => "brief",
            SummaryKind::Comprehensive => "comprehensive",
            SummaryKind::KeyPoints => "key_points",
        }
    }
}

impl fmt::Display for SummaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "brief" => Ok(SummaryKind::Brief),
            "comprehensive" | "full" => Ok(SummaryKind::Comprehensive),
            "key_points" | "keypoints" => Ok(SummaryKind::KeyPoints),
            other => Err(format!("Unknown summary kind: {}", other)),
        }
    }
}
