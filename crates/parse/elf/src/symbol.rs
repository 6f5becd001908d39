//! ELF64 symbol table extraction.
//!
//! Finds the first `SHT_SYMTAB` section, resolves its `sh_link` string table,
//! and decodes every entry with its name and display labels.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::header::FileHeader;
use crate::image::BoundsError;
use crate::section::{SHT_SYMTAB, SectionHeader, StrError, StringTable};

/// Size of an ELF64 symbol entry (24 bytes).
pub const ELF64_SYM_SIZE: u64 = 24;

/// Symbol type: unspecified.
pub const STT_NOTYPE: u8 = 0;
/// Symbol type: data object.
pub const STT_OBJECT: u8 = 1;
/// Symbol type: function.
pub const STT_FUNC: u8 = 2;
/// Symbol type: section.
pub const STT_SECTION: u8 = 3;
/// Symbol type: source file.
pub const STT_FILE: u8 = 4;
/// Symbol type: uninitialized common block.
pub const STT_COMMON: u8 = 5;
/// Symbol type: thread-local storage.
pub const STT_TLS: u8 = 6;
/// Symbol type: GNU indirect function.
pub const STT_GNU_IFUNC: u8 = 10;

/// Symbol binding: local.
pub const STB_LOCAL: u8 = 0;
/// Symbol binding: global.
pub const STB_GLOBAL: u8 = 1;
/// Symbol binding: weak.
pub const STB_WEAK: u8 = 2;
/// Symbol binding: GNU unique.
pub const STB_GNU_UNIQUE: u8 = 10;

/// Symbol visibility: default.
pub const STV_DEFAULT: u8 = 0;
/// Symbol visibility: internal.
pub const STV_INTERNAL: u8 = 1;
/// Symbol visibility: hidden.
pub const STV_HIDDEN: u8 = 2;
/// Symbol visibility: protected.
pub const STV_PROTECTED: u8 = 3;

/// How symbol type, binding and visibility are turned into labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelMode {
    /// Two-way classification of the classic `read_symtab` report:
    /// `FUNC`/`OBJECT`/numeric, `GLOBAL`/`LOCAL`, `DEFAULT`/`HIDDEN`/`INTERNAL`.
    #[default]
    Compat,
    /// Every standard enumerant, with a numeric fallback.
    Full,
}

/// Errors produced while extracting the symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolError {
    /// The file has no `SHT_SYMTAB` section. Not fatal.
    NoSymbolTable,
    /// `sh_link` of the symbol table is zero or outside the section table.
    BadStringTableLink {
        /// Index of the symbol table section.
        symtab: usize,
        /// The offending `sh_link`.
        link: u32,
        /// Number of sections.
        count: usize,
    },
    /// `sh_size` is not a multiple of the symbol entry size.
    MisalignedSymbolTable {
        /// Index of the symbol table section.
        symtab: usize,
        /// The offending `sh_size`.
        size: u64,
    },
    /// `st_name` points outside the string table.
    NameOutOfRange {
        /// Symbol index.
        index: usize,
        /// The offending `st_name`.
        offset: u32,
    },
    /// The name starting at `st_name` runs to the end of the string table.
    UnterminatedSymbolName {
        /// Symbol index.
        index: usize,
        /// The offending `st_name`.
        offset: u32,
    },
    /// Symbol or string table data lies outside the file.
    Bounds(BoundsError),
}

impl SymbolError {
    /// Returns `false` for the informational [`SymbolError::NoSymbolTable`].
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::NoSymbolTable)
    }
}

impl fmt::Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSymbolTable => write!(f, "no symbol table"),
            Self::BadStringTableLink {
                symtab,
                link,
                count,
            } => write!(
                f,
                "bad string table link {link} in section {symtab} ({count} sections)"
            ),
            Self::MisalignedSymbolTable { symtab, size } => write!(
                f,
                "misaligned symbol table in section {symtab}: size {size:#x} is not a multiple \
                 of {ELF64_SYM_SIZE}"
            ),
            Self::NameOutOfRange { index, offset } => write!(
                f,
                "symbol {index}: name offset {offset:#x} outside string table"
            ),
            Self::UnterminatedSymbolName { index, offset } => write!(
                f,
                "symbol {index}: unterminated name at string table offset {offset:#x}"
            ),
            Self::Bounds(e) => write!(f, "symbol table: {e}"),
        }
    }
}

impl core::error::Error for SymbolError {}

impl From<BoundsError> for SymbolError {
    fn from(e: BoundsError) -> Self {
        Self::Bounds(e)
    }
}

/// One decoded symbol table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    /// Position in the symbol table.
    pub index: usize,
    /// Name resolved from the linked string table.
    pub name: String,
    /// Raw `st_name` offset.
    pub st_name: u32,
    /// Symbol type and binding packed into one byte.
    pub st_info: u8,
    /// Visibility (low two bits) and reserved bits.
    pub st_other: u8,
    /// Section index this symbol is defined in.
    pub st_shndx: u16,
    /// Symbol value (address for defined symbols).
    pub st_value: u64,
    /// Symbol size in bytes.
    pub st_size: u64,
    /// Display label for the type.
    pub type_label: Cow<'static, str>,
    /// Display label for the binding.
    pub bind_label: Cow<'static, str>,
    /// Display label for the visibility.
    pub vis_label: Cow<'static, str>,
}

impl SymbolEntry {
    /// Returns the symbol type (lower 4 bits of `st_info`).
    #[must_use]
    pub fn sym_type(&self) -> u8 {
        self.st_info & 0xf
    }

    /// Returns the symbol binding (upper 4 bits of `st_info`).
    #[must_use]
    pub fn sym_bind(&self) -> u8 {
        self.st_info >> 4
    }

    /// Returns the symbol visibility (lower 2 bits of `st_other`).
    #[must_use]
    pub fn visibility(&self) -> u8 {
        self.st_other & 0x3
    }
}

/// Label for a symbol type nibble.
#[must_use]
pub fn type_label(sym_type: u8, mode: LabelMode) -> Cow<'static, str> {
    let known = match (mode, sym_type) {
        (_, STT_FUNC) => Some("FUNC"),
        (_, STT_OBJECT) => Some("OBJECT"),
        (LabelMode::Compat, _) => None,
        (LabelMode::Full, STT_NOTYPE) => Some("NOTYPE"),
        (LabelMode::Full, STT_SECTION) => Some("SECTION"),
        (LabelMode::Full, STT_FILE) => Some("FILE"),
        (LabelMode::Full, STT_COMMON) => Some("COMMON"),
        (LabelMode::Full, STT_TLS) => Some("TLS"),
        (LabelMode::Full, STT_GNU_IFUNC) => Some("IFUNC"),
        (LabelMode::Full, _) => None,
    };
    known.map_or_else(|| Cow::Owned(alloc::format!("{sym_type}")), Cow::Borrowed)
}

/// Label for a symbol binding nibble.
#[must_use]
pub fn bind_label(bind: u8, mode: LabelMode) -> Cow<'static, str> {
    match (mode, bind) {
        (_, STB_GLOBAL) => Cow::Borrowed("GLOBAL"),
        (LabelMode::Compat, _) | (LabelMode::Full, STB_LOCAL) => Cow::Borrowed("LOCAL"),
        (LabelMode::Full, STB_WEAK) => Cow::Borrowed("WEAK"),
        (LabelMode::Full, STB_GNU_UNIQUE) => Cow::Borrowed("UNIQUE"),
        (LabelMode::Full, other) => Cow::Owned(alloc::format!("{other}")),
    }
}

/// Label for a visibility value.
#[must_use]
pub fn vis_label(vis: u8, mode: LabelMode) -> &'static str {
    match (mode, vis) {
        (_, STV_DEFAULT) => "DEFAULT",
        (_, STV_HIDDEN) => "HIDDEN",
        (LabelMode::Full, STV_PROTECTED) => "PROTECTED",
        _ => "INTERNAL",
    }
}

/// Extract the first `SHT_SYMTAB` symbol table of the file.
///
/// # Errors
///
/// Returns [`SymbolError::NoSymbolTable`] if there is none (not fatal), and a
/// fatal [`SymbolError`] for a bad string table link, a misaligned table,
/// unresolvable names, or table data outside the file.
pub fn extract_symbols(
    data: &[u8],
    header: &FileHeader,
    sections: &[SectionHeader],
    mode: LabelMode,
) -> Result<Vec<SymbolEntry>, SymbolError> {
    let (symtab_index, symtab) = sections
        .iter()
        .enumerate()
        .find(|(_, s)| s.sh_type == SHT_SYMTAB)
        .ok_or(SymbolError::NoSymbolTable)?;

    let link = symtab.sh_link;
    let strtab_section = match usize::try_from(link) {
        Ok(i) if i != 0 && i < sections.len() => &sections[i],
        _ => {
            return Err(SymbolError::BadStringTableLink {
                symtab: symtab_index,
                link,
                count: sections.len(),
            });
        }
    };

    if symtab.sh_size % ELF64_SYM_SIZE != 0 {
        return Err(SymbolError::MisalignedSymbolTable {
            symtab: symtab_index,
            size: symtab.sh_size,
        });
    }

    let table = symtab.data(data)?;
    let strtab = StringTable::new(strtab_section.data(data)?);

    tracing::debug!(
        section = symtab_index,
        strtab = link,
        count = symtab.sh_size / ELF64_SYM_SIZE,
        "extracting symbols"
    );

    #[expect(
        clippy::cast_possible_truncation,
        reason = "entry size is a small constant"
    )]
    let entry_size = ELF64_SYM_SIZE as usize;

    table
        .chunks_exact(entry_size)
        .enumerate()
        .map(|(index, entry)| decode_symbol(header, &strtab, index, entry, mode))
        .collect()
}

fn decode_symbol(
    header: &FileHeader,
    strtab: &StringTable<'_>,
    index: usize,
    entry: &[u8],
    mode: LabelMode,
) -> Result<SymbolEntry, SymbolError> {
    let r = header.reader(entry);
    let st_name = r.u32(0)?;
    let st_info = r.u8(4)?;
    let st_other = r.u8(5)?;

    let name = strtab.get(st_name).map_err(|e| match e {
        StrError::OutOfRange => SymbolError::NameOutOfRange {
            index,
            offset: st_name,
        },
        StrError::Unterminated => SymbolError::UnterminatedSymbolName {
            index,
            offset: st_name,
        },
    })?;

    let sym = SymbolEntry {
        index,
        name: String::from_utf8_lossy(name).into_owned(),
        st_name,
        st_info,
        st_other,
        st_shndx: r.u16(6)?,
        st_value: r.u64(8)?,
        st_size: r.u64(16)?,
        type_label: type_label(st_info & 0xf, mode),
        bind_label: bind_label(st_info >> 4, mode),
        vis_label: Cow::Borrowed(vis_label(st_other & 0x3, mode)),
    };
    tracing::trace!(index, name = %sym.name, value = sym.st_value, "symbol");
    Ok(sym)
}
