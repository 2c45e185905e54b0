//! Target resolution for 32-bit `B.W` / `BL` encodings (T4 / T1).
//!
//! ```text
//! first  halfword: 1 1 1 1 0 S imm10
//! second halfword: 1 1 J1 x J2 imm11      x = 1 for BL, 0 for B.W
//! I1 = !(J1 ^ S), I2 = !(J2 ^ S)
//! offset = SignExtend(S:I1:I2:imm10:imm11:'0', 25)
//! target = address + 4 + offset
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// PC reads as the instruction address plus four in Thumb state.
pub const PIPELINE_OFFSET: u64 = 4;

/// Largest positive displacement a 25-bit branch can encode.
pub const MAX_OFFSET: i32 = (1 << 24) - 2;
/// Most negative displacement a 25-bit branch can encode.
pub const MIN_OFFSET: i32 = -(1 << 24);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BranchKind {
    /// `BL`, a call that sets the link register
    Call,
    /// `B.W`, typically a tail call
    Tail,
}

impl BranchKind {
    pub fn label(self) -> &'static str {
        match self {
            BranchKind::Call => "BL",
            BranchKind::Tail => "B",
        }
    }

    fn second_halfword_bits(self) -> u32 {
        match self {
            BranchKind::Call => 0xd000,
            BranchKind::Tail => 0x9000,
        }
    }
}

impl fmt::Display for BranchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A branch-class instruction with its absolute destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BranchInstruction {
    pub address: u64,
    pub raw: u32,
    pub kind: BranchKind,
    pub target: u64,
}

impl BranchInstruction {
    pub fn new(address: u64, raw: u32, kind: BranchKind) -> Self {
        Self {
            address,
            raw,
            kind,
            target: resolve_target(address, raw),
        }
    }
}

/// Signed byte displacement encoded in `raw`.
pub fn branch_offset(raw: u32) -> i32 {
    let imm11 = raw & 0x7ff;
    let imm10 = (raw >> 16) & 0x3ff;
    let j2 = (raw >> 11) & 0x1;
    let j1 = (raw >> 13) & 0x1;
    let s = (raw >> 26) & 0x1;

    let i1 = !(j1 ^ s) & 0x1;
    let i2 = !(j2 ^ s) & 0x1;
    let imm25 = (s << 24) | (i1 << 23) | (i2 << 22) | (imm10 << 12) | (imm11 << 1);

    // Sign bit is bit 24.
    ((imm25 << 7) as i32) >> 7
}

/// Absolute destination of the branch at `address`. Wraps instead of failing.
pub fn resolve_target(address: u64, raw: u32) -> u64 {
    address
        .wrapping_add(PIPELINE_OFFSET)
        .wrapping_add_signed(branch_offset(raw) as i64)
}

/// Build the 32-bit encoding for a branch of `kind` with displacement `offset`.
///
/// Returns `None` for odd or out-of-range displacements.
pub fn encode_branch(kind: BranchKind, offset: i32) -> Option<u32> {
    if offset % 2 != 0 || !(MIN_OFFSET..=MAX_OFFSET).contains(&offset) {
        return None;
    }
    let v = offset as u32;
    let s = (v >> 24) & 0x1;
    let i1 = (v >> 23) & 0x1;
    let i2 = (v >> 22) & 0x1;
    let imm10 = (v >> 12) & 0x3ff;
    let imm11 = (v >> 1) & 0x7ff;
    let j1 = !(i1 ^ s) & 0x1;
    let j2 = !(i2 ^ s) & 0x1;

    let first = 0xf000 | (s << 10) | imm10;
    let second = kind.second_halfword_bits() | (j1 << 13) | (j2 << 11) | imm11;
    Some((first << 16) | second)
}
