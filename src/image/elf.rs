//! Section and symbol extraction through the `object` crate.

use std::collections::HashMap;

use object::read::{Object, ObjectSection, ObjectSymbol, ObjectSymbolTable};
use object::SymbolKind;
use tracing::{debug, warn};

use super::section::Section;
use super::symbol::{FunctionSymbol, SymbolTable};
use super::ObjectImage;
use crate::error::{AuditError, Result};

pub(super) fn parse_object(data: &[u8]) -> Result<ObjectImage> {
    let obj = object::read::File::parse(data)
        .map_err(|e| AuditError::configuration(format!("Unparsable object image: {}", e)))?;

    if obj.architecture() != object::Architecture::Arm {
        warn!(
            architecture = ?obj.architecture(),
            "Object is not a 32-bit ARM image; Thumb decoding may be meaningless"
        );
    }

    let mut sections = Vec::new();
    let mut names_by_index: HashMap<usize, String> = HashMap::new();
    for sec in obj.sections() {
        let name = match sec.name() {
            Ok(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };
        names_by_index.insert(sec.index().0, name.clone());
        match sec.data() {
            Ok(bytes) => sections.push(Section::new(name, sec.address(), bytes.to_vec())),
            Err(e) => debug!(
                section = %name,
                error = %e,
                "Skipping section without readable data"
            ),
        }
    }

    // `symbol_table()` is None exactly when there is no .symtab, i.e. a stripped image.
    let symbols = obj.symbol_table().map(|table| {
        table
            .symbols()
            .filter(|sym| sym.kind() == SymbolKind::Text)
            .filter_map(|sym| {
                let name = sym.name().ok()?;
                let section = sym
                    .section_index()
                    .and_then(|idx| names_by_index.get(&idx.0).cloned());
                Some(FunctionSymbol::new(name, sym.address(), section))
            })
            .collect::<SymbolTable>()
    });

    Ok(ObjectImage::new(sections, symbols))
}
