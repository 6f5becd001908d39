//! ELF64 section header table and string table parsing.
//!
//! Section headers are decoded in file order; a section's index is its
//! position in the returned sequence and is used as the key for `sh_link`.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::header::FileHeader;
use crate::image::{BoundsError, read_at};

/// Section type: inactive.
pub const SHT_NULL: u32 = 0;
/// Section type: program-defined contents.
pub const SHT_PROGBITS: u32 = 1;
/// Section type: symbol table.
pub const SHT_SYMTAB: u32 = 2;
/// Section type: string table.
pub const SHT_STRTAB: u32 = 3;
/// Section type: relocation entries with addends.
pub const SHT_RELA: u32 = 4;
/// Section type: symbol hash table.
pub const SHT_HASH: u32 = 5;
/// Section type: dynamic linking information.
pub const SHT_DYNAMIC: u32 = 6;
/// Section type: notes.
pub const SHT_NOTE: u32 = 7;
/// Section type: occupies no file space.
pub const SHT_NOBITS: u32 = 8;
/// Section type: relocation entries without addends.
pub const SHT_REL: u32 = 9;
/// Section type: dynamic symbol table.
pub const SHT_DYNSYM: u32 = 11;
/// Section type: array of constructors.
pub const SHT_INIT_ARRAY: u32 = 14;
/// Section type: array of destructors.
pub const SHT_FINI_ARRAY: u32 = 15;
/// Section type: section group.
pub const SHT_GROUP: u32 = 17;
/// Section type: GNU-style hash table.
pub const SHT_GNU_HASH: u32 = 0x6fff_fff6;

/// Special section index: undefined.
pub const SHN_UNDEF: u16 = 0;

/// Size of the interpreted prefix of an ELF64 section header entry (64 bytes).
pub const ELF64_SHDR_SIZE: usize = 64;

bitflags::bitflags! {
    /// Section attribute flags (`sh_flags`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SectionFlags: u64 {
        /// Writable data.
        const WRITE = 0x1;
        /// Occupies memory during execution.
        const ALLOC = 0x2;
        /// Executable machine instructions.
        const EXECINSTR = 0x4;
        /// Might be merged.
        const MERGE = 0x10;
        /// Contains NUL-terminated strings.
        const STRINGS = 0x20;
        /// `sh_info` contains a section header table index.
        const INFO_LINK = 0x40;
        /// Preserve order after combining.
        const LINK_ORDER = 0x80;
        /// Non-standard OS-specific handling required.
        const OS_NONCONFORMING = 0x100;
        /// Member of a section group.
        const GROUP = 0x200;
        /// Holds thread-local data.
        const TLS = 0x400;
        /// Compressed contents.
        const COMPRESSED = 0x800;
        /// Excluded from the link unless referenced.
        const EXCLUDE = 0x8000_0000;
    }
}

impl SectionFlags {
    /// `readelf`-style flag letters, e.g. `"WA"` or `"AX"`.
    #[must_use]
    pub fn letters(self) -> String {
        const LETTERS: [(SectionFlags, char); 12] = [
            (SectionFlags::WRITE, 'W'),
            (SectionFlags::ALLOC, 'A'),
            (SectionFlags::EXECINSTR, 'X'),
            (SectionFlags::MERGE, 'M'),
            (SectionFlags::STRINGS, 'S'),
            (SectionFlags::INFO_LINK, 'I'),
            (SectionFlags::LINK_ORDER, 'L'),
            (SectionFlags::OS_NONCONFORMING, 'O'),
            (SectionFlags::GROUP, 'G'),
            (SectionFlags::TLS, 'T'),
            (SectionFlags::COMPRESSED, 'C'),
            (SectionFlags::EXCLUDE, 'E'),
        ];
        LETTERS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|&(_, c)| c)
            .collect()
    }
}

/// Errors produced while parsing the section header table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionError {
    /// The declared table runs past the end of the file.
    TruncatedSectionTable {
        /// `e_shoff`.
        offset: u64,
        /// `e_shnum`.
        count: u16,
        /// `e_shentsize`.
        entry_size: u16,
        /// Size of the file.
        file_size: u64,
    },
    /// `e_shentsize` is smaller than an ELF64 section header.
    BadEntrySize(u16),
    /// A field read left the image.
    Bounds(BoundsError),
}

impl fmt::Display for SectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedSectionTable {
                offset,
                count,
                entry_size,
                file_size,
            } => write!(
                f,
                "truncated section table: {count} entries of {entry_size} bytes at offset \
                 {offset:#x} exceed file size {file_size:#x}"
            ),
            Self::BadEntrySize(size) => write!(
                f,
                "section header entry size {size} is smaller than {ELF64_SHDR_SIZE}"
            ),
            Self::Bounds(e) => write!(f, "section table: {e}"),
        }
    }
}

impl core::error::Error for SectionError {}

impl From<BoundsError> for SectionError {
    fn from(e: BoundsError) -> Self {
        Self::Bounds(e)
    }
}

/// Parsed ELF64 section header entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeader {
    /// Offset into the section header string table for this section's name.
    pub sh_name: u32,
    /// Name resolved through `e_shstrndx`, if that table is usable.
    pub name: Option<String>,
    /// Section type (`SHT_SYMTAB`, `SHT_STRTAB`, etc.).
    pub sh_type: u32,
    /// Section flags.
    pub sh_flags: u64,
    /// Virtual address of the section in memory (0 for non-loaded sections).
    pub sh_addr: u64,
    /// File offset of the section data.
    pub sh_offset: u64,
    /// Size of the section data in bytes.
    pub sh_size: u64,
    /// Associated section index (e.g., `.strtab` index for `.symtab`).
    pub sh_link: u32,
    /// Extra info (interpretation depends on section type).
    pub sh_info: u32,
    /// Required alignment of the section.
    pub sh_addralign: u64,
    /// Size of each entry (for sections with fixed-size entries).
    pub sh_entsize: u64,
}

impl SectionHeader {
    /// Decode one entry from the first 64 bytes of `entry`.
    fn parse(header: &FileHeader, entry: &[u8]) -> Result<Self, BoundsError> {
        let r = header.reader(entry);
        Ok(Self {
            sh_name: r.u32(0)?,
            name: None,
            sh_type: r.u32(4)?,
            sh_flags: r.u64(8)?,
            sh_addr: r.u64(16)?,
            sh_offset: r.u64(24)?,
            sh_size: r.u64(32)?,
            sh_link: r.u32(40)?,
            sh_info: r.u32(44)?,
            sh_addralign: r.u64(48)?,
            sh_entsize: r.u64(56)?,
        })
    }

    /// Known flag bits of `sh_flags`.
    #[must_use]
    pub fn flags(&self) -> SectionFlags {
        SectionFlags::from_bits_truncate(self.sh_flags)
    }

    /// Bounds-checked contents of this section within `data`.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError`] if `sh_offset + sh_size` leaves the file.
    pub fn data<'a>(&self, data: &'a [u8]) -> Result<&'a [u8], BoundsError> {
        read_at(data, self.sh_offset, self.sh_size)
    }
}

/// Lookup failures in a [`StringTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrError {
    /// The offset is at or past the end of the table.
    OutOfRange,
    /// No NUL byte between the offset and the end of the table.
    Unterminated,
}

/// A NUL-terminated string table section, addressed by byte offset.
#[derive(Debug, Clone, Copy)]
pub struct StringTable<'a> {
    data: &'a [u8],
}

impl<'a> StringTable<'a> {
    /// Creates a new string table from the raw section data.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Returns the bytes of the string at `offset`, without the NUL.
    ///
    /// # Errors
    ///
    /// Returns [`StrError`] if the offset is outside the table or the run
    /// reaches the end of the table without a NUL.
    pub fn get(&self, offset: u32) -> Result<&'a [u8], StrError> {
        let start = offset as usize;
        let remaining = self.data.get(start..).filter(|r| !r.is_empty());
        let remaining = remaining.ok_or(StrError::OutOfRange)?;
        let nul = remaining
            .iter()
            .position(|&b| b == 0)
            .ok_or(StrError::Unterminated)?;
        Ok(&remaining[..nul])
    }
}

/// Parse the section header table described by `header`.
///
/// Entries are read with a stride of `e_shentsize`; only the first 64 bytes
/// of each entry are interpreted. Section names are resolved through
/// `e_shstrndx` when that section and offset are valid.
///
/// # Errors
///
/// Returns [`SectionError::TruncatedSectionTable`] if the table does not fit in
/// `data`, and [`SectionError::BadEntrySize`] for entries smaller than 64 bytes.
pub fn parse_sections(data: &[u8], header: &FileHeader) -> Result<Vec<SectionHeader>, SectionError> {
    let count = header.e_shnum;
    let entry_size = header.e_shentsize;
    if count == 0 {
        tracing::debug!("no section headers");
        return Ok(Vec::new());
    }
    if usize::from(entry_size) < ELF64_SHDR_SIZE {
        return Err(SectionError::BadEntrySize(entry_size));
    }

    let table_len = u64::from(count) * u64::from(entry_size);
    let table = read_at(data, header.e_shoff, table_len).map_err(|_| {
        SectionError::TruncatedSectionTable {
            offset: header.e_shoff,
            count,
            entry_size,
            file_size: data.len() as u64,
        }
    })?;

    tracing::debug!(
        offset = header.e_shoff,
        count,
        entry_size,
        "parsing section headers"
    );

    let mut sections = table
        .chunks_exact(usize::from(entry_size))
        .map(|entry| SectionHeader::parse(header, entry))
        .collect::<Result<Vec<_>, _>>()?;

    resolve_section_names(data, header, &mut sections);

    for (index, s) in sections.iter().enumerate() {
        tracing::trace!(index, sh_type = s.sh_type, name = ?s.name, "section header");
    }

    Ok(sections)
}

/// Fill in `name` for each section from the section name string table.
///
/// Names are display-only; an unusable `e_shstrndx` leaves them unresolved.
fn resolve_section_names(data: &[u8], header: &FileHeader, sections: &mut [SectionHeader]) {
    let index = usize::from(header.e_shstrndx);
    if index == usize::from(SHN_UNDEF) || index >= sections.len() {
        tracing::debug!(e_shstrndx = header.e_shstrndx, "no usable section name table");
        return;
    }
    let Ok(bytes) = sections[index].data(data) else {
        tracing::debug!(e_shstrndx = header.e_shstrndx, "section name table out of bounds");
        return;
    };
    let strtab = StringTable::new(bytes);
    for s in sections.iter_mut() {
        s.name = strtab
            .get(s.sh_name)
            .ok()
            .map(|n| String::from_utf8_lossy(n).into_owned());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::header::parse_header;
    use crate::header::tests::make_elf_header;

    /// Fields of one section header entry for test builders.
    #[derive(Clone, Copy, Default)]
    pub(crate) struct Shdr {
        pub name: u32,
        pub sh_type: u32,
        pub flags: u64,
        pub addr: u64,
        pub offset: u64,
        pub size: u64,
        pub link: u32,
        pub info: u32,
        pub align: u64,
        pub entsize: u64,
    }

    /// Append a little-endian section header of `entry_size` bytes and bump `e_shnum`.
    pub(crate) fn append_section(buf: &mut Vec<u8>, s: Shdr, entry_size: usize) {
        let start = buf.len();
        buf.resize(start + entry_size, 0);
        let b = &mut buf[start..];

        b[0..4].copy_from_slice(&s.name.to_le_bytes());
        b[4..8].copy_from_slice(&s.sh_type.to_le_bytes());
        b[8..16].copy_from_slice(&s.flags.to_le_bytes());
        b[16..24].copy_from_slice(&s.addr.to_le_bytes());
        b[24..32].copy_from_slice(&s.offset.to_le_bytes());
        b[32..40].copy_from_slice(&s.size.to_le_bytes());
        b[40..44].copy_from_slice(&s.link.to_le_bytes());
        b[44..48].copy_from_slice(&s.info.to_le_bytes());
        b[48..56].copy_from_slice(&s.align.to_le_bytes());
        b[56..64].copy_from_slice(&s.entsize.to_le_bytes());

        let shnum = u16::from_le_bytes([buf[60], buf[61]]) + 1;
        buf[60..62].copy_from_slice(&shnum.to_le_bytes());
    }

    /// Point `e_shoff` at the current end of `buf`, where headers will be appended.
    pub(crate) fn start_section_table(buf: &mut Vec<u8>, entry_size: u16) {
        let shoff = buf.len() as u64;
        buf[40..48].copy_from_slice(&shoff.to_le_bytes());
        buf[58..60].copy_from_slice(&entry_size.to_le_bytes());
    }

    /// NULL, .shstrtab, .text; names stored after the table.
    fn make_elf_with_sections(entry_size: u16) -> Vec<u8> {
        let shstrtab = b"\0.shstrtab\0.text\0";
        let mut buf = make_elf_header();
        start_section_table(&mut buf, entry_size);
        let data_off = buf.len() as u64 + 3 * u64::from(entry_size);
        buf[62..64].copy_from_slice(&1u16.to_le_bytes());

        let es = usize::from(entry_size);
        append_section(&mut buf, Shdr::default(), es);
        append_section(
            &mut buf,
            Shdr {
                name: 1,
                sh_type: SHT_STRTAB,
                offset: data_off,
                size: shstrtab.len() as u64,
                align: 1,
                ..Shdr::default()
            },
            es,
        );
        append_section(
            &mut buf,
            Shdr {
                name: 11,
                sh_type: SHT_PROGBITS,
                flags: 0x6,
                addr: 0x40_1000,
                offset: 0,
                size: 0,
                align: 16,
                ..Shdr::default()
            },
            es,
        );
        buf.extend_from_slice(shstrtab);
        buf
    }

    #[test]
    fn no_sections_yields_empty_sequence() {
        let buf = make_elf_header();
        let hdr = parse_header(&buf).unwrap();
        assert_eq!(parse_sections(&buf, &hdr), Ok(Vec::new()));
    }

    #[test]
    fn sections_in_file_order_with_names() {
        let buf = make_elf_with_sections(64);
        let hdr = parse_header(&buf).unwrap();
        let sections = parse_sections(&buf, &hdr).expect("valid table");

        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].sh_type, SHT_NULL);
        assert_eq!(sections[0].name.as_deref(), Some(""));
        assert_eq!(sections[1].name.as_deref(), Some(".shstrtab"));
        assert_eq!(sections[2].name.as_deref(), Some(".text"));
        assert_eq!(sections[2].sh_addr, 0x40_1000);
        assert_eq!(sections[2].flags(), SectionFlags::ALLOC | SectionFlags::EXECINSTR);
        assert_eq!(sections[2].flags().letters(), "AX");
    }

    #[test]
    fn larger_entry_size_uses_declared_stride() {
        let buf = make_elf_with_sections(80);
        let hdr = parse_header(&buf).unwrap();
        let sections = parse_sections(&buf, &hdr).expect("valid table");
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[2].name.as_deref(), Some(".text"));
        assert_eq!(sections[2].sh_addralign, 16);
    }

    #[test]
    fn truncated_table_is_rejected() {
        let mut buf = make_elf_with_sections(64);
        // Claim one more entry than is present past the end of the file.
        buf[60..62].copy_from_slice(&200u16.to_le_bytes());
        let hdr = parse_header(&buf).unwrap();
        assert!(matches!(
            parse_sections(&buf, &hdr),
            Err(SectionError::TruncatedSectionTable { count: 200, .. })
        ));
    }

    #[test]
    fn overflowing_offset_is_truncated() {
        let mut buf = make_elf_with_sections(64);
        buf[40..48].copy_from_slice(&u64::MAX.to_le_bytes());
        let hdr = parse_header(&buf).unwrap();
        assert!(matches!(
            parse_sections(&buf, &hdr),
            Err(SectionError::TruncatedSectionTable { .. })
        ));
    }

    #[test]
    fn short_entry_size_is_rejected() {
        let mut buf = make_elf_with_sections(64);
        buf[58..60].copy_from_slice(&40u16.to_le_bytes());
        let hdr = parse_header(&buf).unwrap();
        assert_eq!(parse_sections(&buf, &hdr), Err(SectionError::BadEntrySize(40)));
    }

    #[test]
    fn bad_shstrndx_leaves_names_unresolved() {
        let mut buf = make_elf_with_sections(64);
        buf[62..64].copy_from_slice(&9u16.to_le_bytes());
        let hdr = parse_header(&buf).unwrap();
        let sections = parse_sections(&buf, &hdr).expect("names are not structural");
        assert!(sections.iter().all(|s| s.name.is_none()));
    }

    #[test]
    fn string_table_lookups() {
        let strtab = StringTable::new(b"\0hello\0world\0");
        assert_eq!(strtab.get(0), Ok(&b""[..]));
        assert_eq!(strtab.get(1), Ok(&b"hello"[..]));
        assert_eq!(strtab.get(9), Ok(&b"rld"[..]));
        assert_eq!(strtab.get(13), Err(StrError::OutOfRange));
        assert_eq!(strtab.get(100), Err(StrError::OutOfRange));
    }

    #[test]
    fn string_table_no_nul_terminator() {
        let strtab = StringTable::new(b"abc");
        assert_eq!(strtab.get(0), Err(StrError::Unterminated));
    }
}
