//! Code sections and the privileged address interval.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AuditError, Result};

/// A named, immutable chunk of raw code loaded from the object image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    address: u64,
    data: Vec<u8>,
}

impl Section {
    pub fn new(name: impl Into<String>, address: u64, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            address,
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base virtual address of the first byte.
    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// End address (exclusive).
    pub fn end(&self) -> u64 {
        self.address.saturating_add(self.data.len() as u64)
    }

    /// Code sections hold whole halfwords only.
    pub fn ensure_even(&self) -> Result<()> {
        if self.data.len() % 2 != 0 {
            return Err(AuditError::configuration(format!(
                "Odd code section size: {} ({} bytes)",
                self.name,
                self.data.len()
            )));
        }
        Ok(())
    }
}

/// Half-open interval `[start, end)` covering the trusted code section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrivilegedRegion {
    pub start: u64,
    pub end: u64,
}

impl PrivilegedRegion {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn from_section(section: &Section) -> Self {
        Self::new(section.address(), section.end())
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.start && address < self.end
    }

    pub fn size(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}

impl fmt::Display for PrivilegedRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}, {:#x})", self.start, self.end)
    }
}
