//! Object metadata loading.
//!
//! An [`ObjectImage`] holds every named section of a compiled program together
//! with its function symbol table. It is built once, either by parsing an
//! object file with the `object` crate or directly from in-memory parts, and is
//! read-only afterwards. [`ObjectImage::layout`] resolves the pieces an audit
//! needs (privileged interval, requested code sections, symbols) and rejects
//! images that cannot be audited.

mod elf;
pub mod section;
pub mod symbol;

use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

pub use section::{PrivilegedRegion, Section};
pub use symbol::{FunctionSymbol, SymbolTable};

use crate::error::{AuditError, Result};

/// Immutable view of a loaded object file.
#[derive(Debug, Clone, Default)]
pub struct ObjectImage {
    sections: BTreeMap<String, Section>,
    symbols: Option<SymbolTable>,
}

impl ObjectImage {
    /// Assemble an image from already-extracted parts. `symbols` is `None` for
    /// a stripped image.
    pub fn new(sections: Vec<Section>, symbols: Option<SymbolTable>) -> Self {
        let mut by_name = BTreeMap::new();
        for section in sections {
            // The first section with a given name wins, matching name lookups in ELF tooling.
            by_name
                .entry(section.name().to_string())
                .or_insert(section);
        }
        Self {
            sections: by_name,
            symbols,
        }
    }

    /// Parse an object file (ELF in practice) held in memory.
    pub fn parse(data: &[u8]) -> Result<Self> {
        elf::parse_object(data)
    }

    /// Read and parse an object file from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::parse(&data)
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values()
    }

    /// Function symbols, or `None` if the image was stripped.
    pub fn symbols(&self) -> Option<&SymbolTable> {
        self.symbols.as_ref()
    }

    /// Resolve the privileged section, the requested code sections and the
    /// symbol table, validating each.
    pub fn layout<'a, I, S>(
        &'a self,
        privileged_section: &str,
        requested: I,
    ) -> Result<AuditLayout<'a>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let privileged = self.section(privileged_section).ok_or_else(|| {
            AuditError::configuration(format!("No section named {}", privileged_section))
        })?;
        let region = PrivilegedRegion::from_section(privileged);

        let mut code = Vec::new();
        for name in requested {
            let name = name.as_ref();
            let section = self.section(name).ok_or_else(|| {
                AuditError::configuration(format!("Section does not exist: {}", name))
            })?;
            section.ensure_even()?;
            code.push(section);
        }
        if code.is_empty() {
            return Err(AuditError::configuration("No code sections requested"));
        }

        let symbols = self
            .symbols()
            .ok_or_else(|| AuditError::configuration("Stripped binary not supported"))?;

        info!(
            privileged = %region,
            sections = code.len(),
            functions = symbols.len(),
            "Resolved audit layout"
        );

        Ok(AuditLayout {
            privileged: region,
            sections: code,
            symbols,
        })
    }
}

/// Borrowed, validated inputs for one audit run.
#[derive(Debug, Clone)]
pub struct AuditLayout<'a> {
    pub privileged: PrivilegedRegion,
    pub sections: Vec<&'a Section>,
    pub symbols: &'a SymbolTable,
}
