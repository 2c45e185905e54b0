//! Function symbol table keyed by entry address.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Thumb entry points carry the interworking bit in bit 0 of the symbol value.
pub const THUMB_BIT: u64 = 0x1;

/// A function symbol with its mode tag removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionSymbol {
    pub name: String,
    pub address: u64,
    /// Name of the section the symbol is defined in, when it has one
    pub section: Option<String>,
}

impl FunctionSymbol {
    pub fn new(name: impl Into<String>, address: u64, section: Option<String>) -> Self {
        Self {
            name: name.into(),
            address: address & !THUMB_BIT,
            section,
        }
    }
}

/// Address → function symbols. Aliases sharing an address are kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    by_address: BTreeMap<u64, Vec<FunctionSymbol>>,
    count: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: FunctionSymbol) {
        self.by_address
            .entry(symbol.address)
            .or_default()
            .push(symbol);
        self.count += 1;
    }

    /// All symbols whose entry is exactly `address`.
    pub fn at(&self, address: u64) -> Option<&[FunctionSymbol]> {
        self.by_address
            .get(&address)
            .map(Vec::as_slice)
            .filter(|syms| !syms.is_empty())
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionSymbol> {
        self.by_address.values().flatten()
    }
}

impl FromIterator<FunctionSymbol> for SymbolTable {
    fn from_iter<I: IntoIterator<Item = FunctionSymbol>>(iter: I) -> Self {
        let mut table = SymbolTable::new();
        for sym in iter {
            table.insert(sym);
        }
        table
    }
}
