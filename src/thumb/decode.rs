//! Thumb/Thumb-2 instruction stream walking.
//!
//! Only instruction boundaries are recovered here: the first halfword's top
//! five bits decide between a 16-bit and a 32-bit encoding. Halfwords are
//! little-endian; a 32-bit instruction is represented with its first halfword
//! in the upper 16 bits.

use serde::{Deserialize, Serialize};

use crate::error::{AuditError, Result};
use crate::image::Section;

/// Landing-pad marker emitted for control-flow integrity. Carries no semantics.
pub const CFI_SENTINEL: u32 = 0xf871_f870;

/// Encoded instruction width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Width {
    Narrow,
    Wide,
}

impl Width {
    pub fn bytes(self) -> usize {
        match self {
            Width::Narrow => 2,
            Width::Wide => 4,
        }
    }
}

/// True when `first` starts a 32-bit encoding (`0b11101`, `0b11110`, `0b11111`).
pub fn is_wide_prefix(first: u16) -> bool {
    matches!(first >> 11, 0b11101 | 0b11110 | 0b11111)
}

/// A single decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub address: u64,
    pub width: Width,
    /// Halfword for narrow instructions, `first << 16 | second` for wide ones
    pub raw: u32,
}

impl Instruction {
    pub fn narrow(address: u64, halfword: u16) -> Self {
        Self {
            address,
            width: Width::Narrow,
            raw: halfword as u32,
        }
    }

    pub fn wide(address: u64, raw: u32) -> Self {
        Self {
            address,
            width: Width::Wide,
            raw,
        }
    }

    pub fn size(&self) -> usize {
        self.width.bytes()
    }
}

/// One step of the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// Instruction on the primary, left-to-right walk
    Aligned(Instruction),
    /// Second half of the preceding wide instruction reread as a narrow one
    Shifted(Instruction),
    /// CFI sentinel at the given address, skipped
    Sentinel(u64),
}

/// Iterator over the instructions of one code section.
///
/// Yields `Err` once on a truncated instruction and then stops.
pub struct InstructionStream<'a> {
    section: &'a Section,
    offset: usize,
    unaligned: bool,
    pending: Option<Instruction>,
    done: bool,
}

impl<'a> InstructionStream<'a> {
    pub fn new(section: &'a Section, unaligned: bool) -> Self {
        Self {
            section,
            offset: 0,
            unaligned,
            pending: None,
            done: false,
        }
    }

    /// Byte offset of the next primary-walk instruction.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn halfword(&self, at: usize) -> Option<u16> {
        self.section
            .data()
            .get(at..at + 2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
    }

    fn truncated(&mut self, address: u64) -> AuditError {
        self.done = true;
        AuditError::Decode {
            section: self.section.name().to_string(),
            address,
            message: "truncated instruction".to_string(),
        }
    }
}

impl Iterator for InstructionStream<'_> {
    type Item = Result<Decoded>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(shifted) = self.pending.take() {
            return Some(Ok(Decoded::Shifted(shifted)));
        }
        if self.done || self.offset >= self.section.len() {
            return None;
        }

        let at = self.offset;
        let address = self.section.address().wrapping_add(at as u64);
        let Some(first) = self.halfword(at) else {
            return Some(Err(self.truncated(address)));
        };

        if !is_wide_prefix(first) {
            self.offset += 2;
            return Some(Ok(Decoded::Aligned(Instruction::narrow(address, first))));
        }

        let Some(second) = self.halfword(at + 2) else {
            return Some(Err(self.truncated(address)));
        };
        self.offset += 4;

        let raw = ((first as u32) << 16) | second as u32;
        if raw == CFI_SENTINEL {
            return Some(Ok(Decoded::Sentinel(address)));
        }
        if self.unaligned {
            self.pending = Some(Instruction::narrow(address.wrapping_add(2), second));
        }
        Some(Ok(Decoded::Aligned(Instruction::wide(address, raw))))
    }
}
