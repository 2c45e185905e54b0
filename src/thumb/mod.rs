//! Thumb-2 decoding restricted to what privilege enforcement needs.
//!
//! - `decode`: instruction boundaries over a code section
//! - `pattern`: mask/pattern table of sensitive instructions
//! - `branch`: `B.W`/`BL` target reconstruction

pub mod branch;
pub mod decode;
pub mod pattern;

pub use branch::{BranchInstruction, BranchKind};
pub use decode::{Decoded, Instruction, InstructionStream, Width, CFI_SENTINEL};
pub use pattern::{classify, Opcode, OpcodePattern, SENSITIVE_PATTERNS};
