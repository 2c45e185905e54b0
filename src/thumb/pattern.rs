//! Table of security-relevant opcode patterns.
//!
//! Each entry matches when `(raw & mask) == pattern` for an instruction of the
//! entry's width. Entries are mutually exclusive; the first hit wins.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::branch::BranchKind;
use super::decode::{Instruction, Width};

/// What a matched instruction means to the auditor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// `CPSIE`/`CPSID`, changes the interrupt mask
    Cps,
    /// `MSR` to a special register
    Msr,
    /// Direct branch whose risk depends on its destination
    Branch(BranchKind),
}

impl Opcode {
    pub fn label(self) -> &'static str {
        match self {
            Opcode::Cps => "CPS",
            Opcode::Msr => "MSR",
            Opcode::Branch(kind) => kind.label(),
        }
    }

    /// Reported wherever it occurs, independent of any branch analysis.
    pub fn is_privileged_instruction(self) -> bool {
        matches!(self, Opcode::Cps | Opcode::Msr)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodePattern {
    pub width: Width,
    pub mask: u32,
    pub pattern: u32,
    pub opcode: Opcode,
}

impl OpcodePattern {
    pub const fn new(width: Width, mask: u32, pattern: u32, opcode: Opcode) -> Self {
        Self {
            width,
            mask,
            pattern,
            opcode,
        }
    }

    pub fn matches(&self, ins: &Instruction) -> bool {
        ins.width == self.width && (ins.raw & self.mask) == self.pattern
    }
}

pub const SENSITIVE_PATTERNS: &[OpcodePattern] = &[
    OpcodePattern::new(Width::Narrow, 0xffec, 0xb660, Opcode::Cps),
    OpcodePattern::new(Width::Wide, 0xfff0_f300, 0xf380_8000, Opcode::Msr),
    OpcodePattern::new(
        Width::Wide,
        0xf800_d000,
        0xf000_d000,
        Opcode::Branch(BranchKind::Call),
    ),
    OpcodePattern::new(
        Width::Wide,
        0xf800_d000,
        0xf000_9000,
        Opcode::Branch(BranchKind::Tail),
    ),
];

/// Match `ins` against [`SENSITIVE_PATTERNS`].
pub fn classify(ins: &Instruction) -> Option<Opcode> {
    classify_with(SENSITIVE_PATTERNS, ins)
}

/// Match `ins` against a caller-supplied table.
pub fn classify_with(table: &[OpcodePattern], ins: &Instruction) -> Option<Opcode> {
    table.iter().find(|p| p.matches(ins)).map(|p| p.opcode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn narrow(raw: u16) -> Instruction {
        Instruction::narrow(0x1000, raw)
    }

    fn wide(raw: u32) -> Instruction {
        Instruction::wide(0x1000, raw)
    }

    #[test]
    fn cps_variants() {
        // cpsie i, cpsid i, cpsie f, cpsid f
        for raw in [0xb662, 0xb672, 0xb661, 0xb671] {
            assert_eq!(classify(&narrow(raw)), Some(Opcode::Cps), "{:#x}", raw);
        }
        assert_eq!(classify(&narrow(0xb650)), None);
        assert_eq!(classify(&narrow(0xbf00)), None);
    }

    #[test]
    fn msr_basepri_and_primask() {
        // msr primask, r0 / msr basepri, r1 / msr control, r0
        assert_eq!(classify(&wide(0xf380_8810)), Some(Opcode::Msr));
        assert_eq!(classify(&wide(0xf381_8811)), Some(Opcode::Msr));
        assert_eq!(classify(&wide(0xf380_8814)), Some(Opcode::Msr));
        // mrs r0, primask is a read and stays quiet
        assert_eq!(classify(&wide(0xf3ef_8010)), None);
    }

    #[test]
    fn branches() {
        assert_eq!(
            classify(&wide(0xf000_f804)),
            Some(Opcode::Branch(BranchKind::Call))
        );
        assert_eq!(
            classify(&wide(0xf7ff_bffe)),
            Some(Opcode::Branch(BranchKind::Tail))
        );
        // conditional b<c>.w (T3) has bit 12 clear
        assert_eq!(classify(&wide(0xf040_8000)), None);
    }

    #[test]
    fn width_must_agree() {
        // 0xb662 zero-extended as a wide word must not hit the narrow entry
        assert_eq!(classify(&wide(0x0000_b662)), None);
    }

    #[test]
    fn custom_table() {
        let table = [OpcodePattern::new(Width::Narrow, 0xffff, 0xbe00, Opcode::Cps)];
        assert_eq!(classify_with(&table, &narrow(0xbe00)), Some(Opcode::Cps));
        assert_eq!(classify_with(&table, &narrow(0xb662)), None);
    }

    #[test]
    fn labels() {
        assert_eq!(Opcode::Cps.to_string(), "CPS");
        assert_eq!(Opcode::Branch(BranchKind::Call).to_string(), "BL");
        assert!(Opcode::Msr.is_privileged_instruction());
        assert!(!Opcode::Branch(BranchKind::Tail).is_privileged_instruction());
    }
}
