//! Shared fixtures: synthetic Thumb code and minimal ELF32 ARM images.
#![allow(dead_code)]

use std::io::Write;

use privaudit::thumb::branch::{encode_branch, BranchKind};
use tempfile::NamedTempFile;

const EM_ARM: u16 = 40;
const SHT_PROGBITS: u32 = 1;
const SHT_SYMTAB: u32 = 2;
const SHT_STRTAB: u32 = 3;
const SHF_ALLOC_EXEC: u32 = 0x2 | 0x4;
const STT_OBJECT: u8 = 1;
const STT_FUNC: u8 = 2;
const STB_GLOBAL: u8 = 1;
const EHDR_SIZE: usize = 52;
const SHDR_SIZE: usize = 40;
const SYM_SIZE: usize = 16;

/// Little-endian Thumb code assembled halfword by halfword.
#[derive(Debug, Clone)]
pub struct Code {
    base: u64,
    halfwords: Vec<u16>,
}

impl Code {
    pub fn at(base: u64) -> Self {
        Self {
            base,
            halfwords: Vec::new(),
        }
    }

    /// Address of the next instruction.
    pub fn here(&self) -> u64 {
        self.base + 2 * self.halfwords.len() as u64
    }

    pub fn narrow(&mut self, halfword: u16) -> &mut Self {
        self.halfwords.push(halfword);
        self
    }

    pub fn wide(&mut self, raw: u32) -> &mut Self {
        self.halfwords.push((raw >> 16) as u16);
        self.halfwords.push(raw as u16);
        self
    }

    pub fn call(&mut self, target: u64) -> &mut Self {
        self.branch(BranchKind::Call, target)
    }

    pub fn tail(&mut self, target: u64) -> &mut Self {
        self.branch(BranchKind::Tail, target)
    }

    fn branch(&mut self, kind: BranchKind, target: u64) -> &mut Self {
        let offset = target as i64 - self.here() as i64 - 4;
        let raw = encode_branch(kind, offset as i32).expect("branch offset in range");
        self.wide(raw)
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.halfwords.iter().flat_map(|h| h.to_le_bytes()).collect()
    }
}

struct SymbolSpec {
    name: String,
    value: u32,
    section: String,
    kind: u8,
}

/// Builder for a minimal little-endian ELF32 ARM executable.
#[derive(Default)]
pub struct ElfBuilder {
    sections: Vec<(String, u32, Vec<u8>)>,
    symbols: Vec<SymbolSpec>,
    stripped: bool,
}

impl ElfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(mut self, name: &str, address: u64, data: Vec<u8>) -> Self {
        self.sections.push((name.to_string(), address as u32, data));
        self
    }

    /// Thumb function symbol; the interworking bit is set like a real toolchain does.
    pub fn function(mut self, name: &str, address: u64, section: &str) -> Self {
        self.symbols.push(SymbolSpec {
            name: name.to_string(),
            value: address as u32 | 1,
            section: section.to_string(),
            kind: STT_FUNC,
        });
        self
    }

    pub fn data_symbol(mut self, name: &str, address: u64, section: &str) -> Self {
        self.symbols.push(SymbolSpec {
            name: name.to_string(),
            value: address as u32,
            section: section.to_string(),
            kind: STT_OBJECT,
        });
        self
    }

    pub fn stripped(mut self) -> Self {
        self.stripped = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut shstrtab = vec![0u8];
        let mut name_offset = |name: &str| {
            let off = shstrtab.len() as u32;
            shstrtab.extend_from_slice(name.as_bytes());
            shstrtab.push(0);
            off
        };

        // (name_off, type, flags, addr, offset, size, link, info, align, entsize)
        let mut headers: Vec<[u32; 10]> = vec![[0; 10]];
        let mut out = vec![0u8; EHDR_SIZE];

        for (name, addr, data) in &self.sections {
            pad4(&mut out);
            let off = out.len() as u32;
            out.extend_from_slice(data);
            headers.push([
                name_offset(name),
                SHT_PROGBITS,
                SHF_ALLOC_EXEC,
                *addr,
                off,
                data.len() as u32,
                0,
                0,
                2,
                0,
            ]);
        }

        if !self.stripped {
            let mut strtab = vec![0u8];
            let mut symtab = vec![0u8; SYM_SIZE];
            for sym in &self.symbols {
                let st_name = strtab.len() as u32;
                strtab.extend_from_slice(sym.name.as_bytes());
                strtab.push(0);
                let shndx = self
                    .sections
                    .iter()
                    .position(|(n, _, _)| *n == sym.section)
                    .map(|i| i as u16 + 1)
                    .expect("symbol section exists");
                symtab.extend_from_slice(&st_name.to_le_bytes());
                symtab.extend_from_slice(&sym.value.to_le_bytes());
                symtab.extend_from_slice(&4u32.to_le_bytes());
                symtab.push((STB_GLOBAL << 4) | sym.kind);
                symtab.push(0);
                symtab.extend_from_slice(&shndx.to_le_bytes());
            }

            let strtab_index = headers.len() as u32 + 1;
            pad4(&mut out);
            let off = out.len() as u32;
            out.extend_from_slice(&symtab);
            headers.push([
                name_offset(".symtab"),
                SHT_SYMTAB,
                0,
                0,
                off,
                symtab.len() as u32,
                strtab_index,
                1,
                4,
                SYM_SIZE as u32,
            ]);

            let off = out.len() as u32;
            out.extend_from_slice(&strtab);
            headers.push([
                name_offset(".strtab"),
                SHT_STRTAB,
                0,
                0,
                off,
                strtab.len() as u32,
                0,
                0,
                1,
                0,
            ]);
        }

        let shstrndx = headers.len() as u16;
        let shstrtab_name = name_offset(".shstrtab");
        let off = out.len() as u32;
        out.extend_from_slice(&shstrtab);
        headers.push([
            shstrtab_name,
            SHT_STRTAB,
            0,
            0,
            off,
            shstrtab.len() as u32,
            0,
            0,
            1,
            0,
        ]);

        pad4(&mut out);
        let shoff = out.len() as u32;
        for h in &headers {
            for field in h {
                out.extend_from_slice(&field.to_le_bytes());
            }
        }

        let mut ehdr = Vec::with_capacity(EHDR_SIZE);
        ehdr.extend_from_slice(&[0x7f, b'E', b'L', b'F', 1, 1, 1, 0]);
        ehdr.extend_from_slice(&[0; 8]);
        ehdr.extend_from_slice(&2u16.to_le_bytes()); // ET_EXEC
        ehdr.extend_from_slice(&EM_ARM.to_le_bytes());
        ehdr.extend_from_slice(&1u32.to_le_bytes());
        ehdr.extend_from_slice(&0u32.to_le_bytes()); // e_entry
        ehdr.extend_from_slice(&0u32.to_le_bytes()); // e_phoff
        ehdr.extend_from_slice(&shoff.to_le_bytes());
        ehdr.extend_from_slice(&0x0500_0000u32.to_le_bytes()); // EABI5
        ehdr.extend_from_slice(&(EHDR_SIZE as u16).to_le_bytes());
        ehdr.extend_from_slice(&0u16.to_le_bytes()); // e_phentsize
        ehdr.extend_from_slice(&0u16.to_le_bytes()); // e_phnum
        ehdr.extend_from_slice(&(SHDR_SIZE as u16).to_le_bytes());
        ehdr.extend_from_slice(&(headers.len() as u16).to_le_bytes());
        ehdr.extend_from_slice(&shstrndx.to_le_bytes());
        out[..EHDR_SIZE].copy_from_slice(&ehdr);
        out
    }
}

fn pad4(out: &mut Vec<u8>) {
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

/// Creates a temporary file with the given content.
pub fn create_temp_file(content: &[u8]) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content).unwrap();
    temp_file
}
