//! Synthetic ELF64 fixtures written to a per-test temporary directory.

#![allow(dead_code)]

use std::path::PathBuf;

const SYM_SIZE: u64 = 24;

/// Section header fields for [`FixtureBuilder`].
#[derive(Clone, Copy, Default)]
struct Shdr {
    name: u32,
    sh_type: u32,
    offset: u64,
    size: u64,
    link: u32,
    entsize: u64,
}

/// Little-endian ELF64 executable with an optional `.symtab`.
pub struct Fixture {
    /// `(name, st_info, value, size)` of symbols after the null symbol.
    pub symbols: Vec<(&'static str, u8, u64, u64)>,
    /// Emit `.symtab` and `.strtab` sections.
    pub with_symtab: bool,
    /// Override for the declared `.symtab` size.
    pub symtab_size: Option<u64>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            symbols: vec![("main", 0x12, 0x40_1000, 0x10)],
            with_symtab: true,
            symtab_size: None,
        }
    }
}

impl Fixture {
    /// Serialize the fixture.
    pub fn bytes(&self) -> Vec<u8> {
        let mut strtab = vec![0u8];
        let mut symtab = vec![0u8; SYM_SIZE as usize];
        for &(name, info, value, size) in &self.symbols {
            let st_name = strtab.len() as u32;
            strtab.extend_from_slice(name.as_bytes());
            strtab.push(0);
            let mut sym = [0u8; 24];
            sym[0..4].copy_from_slice(&st_name.to_le_bytes());
            sym[4] = info;
            sym[6..8].copy_from_slice(&1u16.to_le_bytes());
            sym[8..16].copy_from_slice(&value.to_le_bytes());
            sym[16..24].copy_from_slice(&size.to_le_bytes());
            symtab.extend_from_slice(&sym);
        }
        let shstrtab = b"\0.strtab\0.symtab\0.shstrtab\0";

        let mut sections = vec![Shdr::default()];
        let mut data = Vec::new();
        let data_start = 64u64;
        if self.with_symtab {
            let strtab_off = data_start;
            let symtab_off = strtab_off + strtab.len() as u64;
            data.extend_from_slice(&strtab);
            data.extend_from_slice(&symtab);
            sections.push(Shdr {
                name: 1,
                sh_type: 3,
                offset: strtab_off,
                size: strtab.len() as u64,
                ..Shdr::default()
            });
            sections.push(Shdr {
                name: 9,
                sh_type: 2,
                offset: symtab_off,
                size: self.symtab_size.unwrap_or(symtab.len() as u64),
                link: 1,
                entsize: SYM_SIZE,
            });
        }
        let shstrtab_off = data_start + data.len() as u64;
        data.extend_from_slice(shstrtab);
        let shstrndx = sections.len() as u16;
        sections.push(Shdr {
            name: 17,
            sh_type: 3,
            offset: shstrtab_off,
            size: shstrtab.len() as u64,
            ..Shdr::default()
        });
        let shoff = data_start + data.len() as u64;

        let mut buf = vec![0u8; 64];
        buf[0..4].copy_from_slice(b"\x7fELF");
        buf[4] = 2;
        buf[5] = 1;
        buf[6] = 1;
        buf[16..18].copy_from_slice(&2u16.to_le_bytes());
        buf[18..20].copy_from_slice(&62u16.to_le_bytes());
        buf[20..24].copy_from_slice(&1u32.to_le_bytes());
        buf[24..32].copy_from_slice(&0x40_1000u64.to_le_bytes());
        buf[40..48].copy_from_slice(&shoff.to_le_bytes());
        buf[52..54].copy_from_slice(&64u16.to_le_bytes());
        buf[58..60].copy_from_slice(&64u16.to_le_bytes());
        buf[60..62].copy_from_slice(&(sections.len() as u16).to_le_bytes());
        buf[62..64].copy_from_slice(&shstrndx.to_le_bytes());
        buf.extend_from_slice(&data);

        for s in sections {
            let mut b = [0u8; 64];
            b[0..4].copy_from_slice(&s.name.to_le_bytes());
            b[4..8].copy_from_slice(&s.sh_type.to_le_bytes());
            b[24..32].copy_from_slice(&s.offset.to_le_bytes());
            b[32..40].copy_from_slice(&s.size.to_le_bytes());
            b[40..44].copy_from_slice(&s.link.to_le_bytes());
            b[56..64].copy_from_slice(&s.entsize.to_le_bytes());
            buf.extend_from_slice(&b);
        }
        buf
    }
}

/// Write `bytes` to a fresh file named after `test`.
pub fn write_fixture(test: &str, bytes: &[u8]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("elfview-tests-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create fixture dir");
    let path = dir.join(test);
    std::fs::write(&path, bytes).expect("write fixture");
    path
}
