//! Audit configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use super::policy::AllowList;
use crate::error::{AuditError, Result};

/// Section scanned when the caller names none.
pub const DEFAULT_SECTION: &str = ".text";
/// Section whose address range defines privileged code.
pub const DEFAULT_PRIVILEGED_SECTION: &str = "privileged_functions";

/// Options for one audit run. Fixed once the run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Code sections to scan
    pub sections: BTreeSet<String>,
    /// Section holding trusted code
    pub privileged_section: String,
    /// Also reread the second half of every 32-bit instruction as a 16-bit one
    pub scan_unaligned: bool,
    /// Privileged functions untrusted code may call
    pub allow_list: AllowList,
    /// Scan sections on the rayon thread pool
    pub parallel: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            sections: BTreeSet::from([DEFAULT_SECTION.to_string()]),
            privileged_section: DEFAULT_PRIVILEGED_SECTION.to_string(),
            scan_unaligned: false,
            allow_list: AllowList::secure_apis(),
            parallel: false,
        }
    }
}

impl AuditConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| AuditError::configuration(format!("Invalid audit config: {}", e)))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn with_sections<I, S>(mut self, sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sections = sections.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_privileged_section(mut self, name: impl Into<String>) -> Self {
        self.privileged_section = name.into();
        self
    }

    pub fn with_scan_unaligned(mut self, enabled: bool) -> Self {
        self.scan_unaligned = enabled;
        self
    }

    pub fn with_allow_list(mut self, allow_list: AllowList) -> Self {
        self.allow_list = allow_list;
        self
    }

    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }
}
