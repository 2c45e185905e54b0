//! Privilege boundary audit.
//!
//! Ties the loader, decoder, matcher and resolver together: [`audit`] scans
//! the configured sections of an [`crate::image::ObjectImage`] and returns an
//! [`AuditReport`] listing every finding.

pub mod config;
pub mod finding;
pub mod policy;
pub mod scanner;

use serde::{Deserialize, Serialize};

pub use config::AuditConfig;
pub use finding::{Finding, FindingKind, Reporter};
pub use policy::{AllowList, PolicyEngine, Verdict};
pub use scanner::{audit, scan_section, SectionScan};

use crate::image::PrivilegedRegion;

/// Per-section counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionStats {
    pub name: String,
    /// Primary-walk instructions, sentinels excluded
    pub instructions: usize,
    /// Halfword-shifted rereads
    pub shifted: usize,
    pub sentinels: usize,
    pub branches: usize,
    pub findings: usize,
}

impl SectionStats {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// Everything a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub privileged: PrivilegedRegion,
    pub sections: Vec<SectionStats>,
    /// Sections in name order, addresses ascending within a section
    pub findings: Vec<Finding>,
}

impl AuditReport {
    /// No findings. Whether findings are acceptable is the caller's call.
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// One human-readable line per finding.
    pub fn lines(&self) -> Vec<String> {
        self.findings.iter().map(ToString::to_string).collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
