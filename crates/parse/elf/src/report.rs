//! Text rendering of parsed ELF structures.
//!
//! Pure formatting: the layout mirrors `readelf` with labels padded to a
//! fixed column. Addresses and offsets are `0x`-prefixed lowercase hex,
//! sizes and counts are decimal.

use alloc::string::String;
use core::fmt::{self, Write};

use crate::header::{
    ELFCLASS32, ELFCLASS64, ELFDATA2LSB, ELFDATA2MSB, ET_CORE, ET_DYN, ET_EXEC, ET_REL,
    FileHeader,
};
use crate::section::{
    SHT_DYNAMIC, SHT_DYNSYM, SHT_FINI_ARRAY, SHT_GNU_HASH, SHT_GROUP, SHT_HASH, SHT_INIT_ARRAY,
    SHT_NOBITS, SHT_NOTE, SHT_NULL, SHT_PROGBITS, SHT_REL, SHT_RELA, SHT_STRTAB, SHT_SYMTAB,
    SectionHeader,
};
use crate::symbol::SymbolEntry;

/// Width of the label column in the header report, colon included.
const LABEL_WIDTH: usize = 35;

/// Column header of the symbol table report.
pub const SYMBOL_COLUMNS: &str = "   Num:    Value          Size Type    Bind   Vis      Ndx Name";

/// Writes a `label: value` line padded to the label column.
fn field(out: &mut impl Write, label: &str, value: fmt::Arguments<'_>) -> fmt::Result {
    let label = alloc::format!("{label}:");
    writeln!(out, "  {label:<LABEL_WIDTH$}{value}")
}

fn class_label(class: u8) -> String {
    match class {
        ELFCLASS32 => "ELF32".into(),
        ELFCLASS64 => "ELF64".into(),
        other => alloc::format!("<unknown: {other:#x}>"),
    }
}

fn data_label(data: u8) -> String {
    match data {
        ELFDATA2LSB => "2's complement, little endian".into(),
        ELFDATA2MSB => "2's complement, big endian".into(),
        other => alloc::format!("<unknown: {other:#x}>"),
    }
}

fn osabi_label(osabi: u8) -> String {
    let name = match osabi {
        0 => "UNIX - System V",
        1 => "UNIX - HP-UX",
        2 => "UNIX - NetBSD",
        3 => "UNIX - GNU",
        6 => "UNIX - Solaris",
        7 => "UNIX - AIX",
        8 => "UNIX - IRIX",
        9 => "UNIX - FreeBSD",
        10 => "UNIX - TRU64",
        12 => "UNIX - OpenBSD",
        97 => "ARM",
        255 => "Standalone App",
        other => return alloc::format!("<unknown: {other:#x}>"),
    };
    name.into()
}

fn type_label(e_type: u16) -> String {
    let name = match e_type {
        0 => "NONE (None)",
        ET_REL => "REL (Relocatable file)",
        ET_EXEC => "EXEC (Executable file)",
        ET_DYN => "DYN (Shared object file)",
        ET_CORE => "CORE (Core file)",
        other => return alloc::format!("<unknown: {other:#x}>"),
    };
    name.into()
}

/// Label for a section type, e.g. `PROGBITS`.
#[must_use]
pub fn section_type_label(sh_type: u32) -> String {
    let name = match sh_type {
        SHT_NULL => "NULL",
        SHT_PROGBITS => "PROGBITS",
        SHT_SYMTAB => "SYMTAB",
        SHT_STRTAB => "STRTAB",
        SHT_RELA => "RELA",
        SHT_HASH => "HASH",
        SHT_DYNAMIC => "DYNAMIC",
        SHT_NOTE => "NOTE",
        SHT_NOBITS => "NOBITS",
        SHT_REL => "REL",
        SHT_DYNSYM => "DYNSYM",
        SHT_INIT_ARRAY => "INIT_ARRAY",
        SHT_FINI_ARRAY => "FINI_ARRAY",
        SHT_GROUP => "GROUP",
        SHT_GNU_HASH => "GNU_HASH",
        other => return alloc::format!("{other:#x}"),
    };
    name.into()
}

/// Render the file header block.
///
/// # Errors
///
/// Propagates errors from `out`.
pub fn render_header(out: &mut impl Write, h: &FileHeader) -> fmt::Result {
    writeln!(out, "ELF Header:")?;
    write!(out, "  Magic:  ")?;
    for b in &h.e_ident {
        write!(out, " {b:02x}")?;
    }
    writeln!(out)?;

    let version = if h.ident_version() == 1 {
        String::from("1 (current)")
    } else {
        alloc::format!("{}", h.ident_version())
    };

    field(out, "Class", format_args!("{}", class_label(h.class())))?;
    field(out, "Data", format_args!("{}", data_label(h.data())))?;
    field(out, "Version", format_args!("{version}"))?;
    field(out, "OS/ABI", format_args!("{}", osabi_label(h.osabi())))?;
    field(out, "ABI Version", format_args!("{}", h.abi_version()))?;
    field(out, "Type", format_args!("{}", type_label(h.e_type)))?;
    field(out, "Machine", format_args!("{:#x}", h.e_machine))?;
    field(out, "Version", format_args!("{:#x}", h.e_version))?;
    field(out, "Entry point address", format_args!("{:#x}", h.e_entry))?;
    field(
        out,
        "Start of program headers",
        format_args!("{:#x} (bytes into file)", h.e_phoff),
    )?;
    field(
        out,
        "Start of section headers",
        format_args!("{:#x} (bytes into file)", h.e_shoff),
    )?;
    field(out, "Flags", format_args!("{:#x}", h.e_flags))?;
    field(out, "Size of this header", format_args!("{} (bytes)", h.e_ehsize))?;
    field(
        out,
        "Size of program headers",
        format_args!("{} (bytes)", h.e_phentsize),
    )?;
    field(out, "Number of program headers", format_args!("{}", h.e_phnum))?;
    field(
        out,
        "Size of section headers",
        format_args!("{} (bytes)", h.e_shentsize),
    )?;
    field(out, "Number of section headers", format_args!("{}", h.e_shnum))?;
    field(
        out,
        "Section header string table index",
        format_args!("{}", h.e_shstrndx),
    )
}

/// Render the section header table, one row per section.
///
/// # Errors
///
/// Propagates errors from `out`.
pub fn render_sections(out: &mut impl Write, sections: &[SectionHeader]) -> fmt::Result {
    writeln!(out, "Section Headers:")?;
    writeln!(
        out,
        "  [Nr] Name               Type         Address          Offset   Size     EntSize  Flg Lk  Inf Al"
    )?;
    for (i, s) in sections.iter().enumerate() {
        let name = s.name.as_deref().unwrap_or("<corrupt>");
        writeln!(
            out,
            "  [{i:>2}] {name:<18} {ty:<12} {addr:016x} {off:08x} {size:08x} {ent:08x} {flg:>3} {link:>3} {info:>3} {align}",
            ty = section_type_label(s.sh_type),
            addr = s.sh_addr,
            off = s.sh_offset,
            size = s.sh_size,
            ent = s.sh_entsize,
            flg = s.flags().letters(),
            link = s.sh_link,
            info = s.sh_info,
            align = s.sh_addralign,
        )?;
    }
    Ok(())
}

/// Render the symbol table, one fixed-column row per symbol.
///
/// # Errors
///
/// Propagates errors from `out`.
pub fn render_symbols(out: &mut impl Write, symbols: &[SymbolEntry]) -> fmt::Result {
    writeln!(out, "Symbol table:")?;
    writeln!(out, "{SYMBOL_COLUMNS}")?;
    for s in symbols {
        writeln!(
            out,
            "{:>6}: {:016x} {:>5x} {:<7} {:<6} {:<8} {:>3} {}",
            s.index,
            s.st_value,
            s.st_size,
            s.type_label,
            s.bind_label,
            s.vis_label,
            s.st_shndx,
            s.name
        )?;
    }
    Ok(())
}

/// Render a full report. Absent parts are omitted.
#[must_use]
pub fn render(
    header: &FileHeader,
    sections: Option<&[SectionHeader]>,
    symbols: Option<&[SymbolEntry]>,
) -> String {
    let mut out = String::new();
    // Writing into a `String` cannot fail.
    let _ = render_into(&mut out, header, sections, symbols);
    out
}

fn render_into(
    out: &mut String,
    header: &FileHeader,
    sections: Option<&[SectionHeader]>,
    symbols: Option<&[SymbolEntry]>,
) -> fmt::Result {
    render_header(out, header)?;
    if let Some(sections) = sections {
        writeln!(out)?;
        render_sections(out, sections)?;
    }
    if let Some(symbols) = symbols {
        writeln!(out)?;
        render_symbols(out, symbols)?;
    }
    Ok(())
}
