//! Findings and their accumulation.
//!
//! Findings are observations, not errors: they never influence decoding and
//! a scan always runs to completion after producing one.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::thumb::{BranchInstruction, Instruction, Opcode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// `CPS` or `MSR` present in scanned code
    PrivilegedInstruction,
    /// Branch into privileged code at a function not on the allow-list
    UnauthorizedCall,
}

impl FindingKind {
    pub fn tag(self) -> &'static str {
        match self {
            FindingKind::PrivilegedInstruction => "privileged-mode-switch",
            FindingKind::UnauthorizedCall => "unauthorized privileged call",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub opcode: Opcode,
    /// Address of the offending instruction
    pub address: u64,
    pub section: String,
    /// Destination function name, for calls
    pub target: Option<String>,
    pub target_address: Option<u64>,
    /// Found by the halfword-shifted rescan rather than the aligned walk
    pub unaligned: bool,
}

impl Finding {
    pub fn privileged_instruction(
        section: &str,
        ins: &Instruction,
        opcode: Opcode,
        unaligned: bool,
    ) -> Self {
        Self {
            kind: FindingKind::PrivilegedInstruction,
            opcode,
            address: ins.address,
            section: section.to_string(),
            target: None,
            target_address: None,
            unaligned,
        }
    }

    pub fn unauthorized_call(section: &str, branch: &BranchInstruction, target: String) -> Self {
        Self {
            kind: FindingKind::UnauthorizedCall,
            opcode: Opcode::Branch(branch.kind),
            address: branch.address,
            section: section.to_string(),
            target: Some(target),
            target_address: Some(branch.target),
            unaligned: false,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(name) => write!(f, "[CS] {} {} at {:#x}", self.opcode, name, self.address),
            None => write!(f, "[CS] {} at {:#x}", self.opcode, self.address),
        }
    }
}

/// Append-only finding sink. One per worker; merged afterwards.
#[derive(Debug, Default)]
pub struct Reporter {
    findings: Vec<Finding>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, finding: Finding) {
        warn!(
            kind = finding.kind.tag(),
            opcode = finding.opcode.label(),
            address = format_args!("{:#x}", finding.address),
            section = %finding.section,
            target = finding.target.as_deref().unwrap_or(""),
            "{}",
            finding
        );
        self.findings.push(finding);
    }

    pub fn merge(&mut self, other: Reporter) {
        self.findings.extend(other.findings);
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn into_findings(self) -> Vec<Finding> {
        self.findings
    }
}
