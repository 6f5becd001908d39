//! Read-only ELF64 inspection.
//!
//! Parses the file header, section header table and `.symtab` symbol table
//! from raw byte slices using bounds-checked field extraction, and renders a
//! `readelf`-style text report. No struct overlays of file memory.
//!
//! # Usage
//!
//! ```
//! use elfview_elf::{LabelMode, inspect, report};
//!
//! fn show(data: &[u8]) {
//!     let inspection = inspect(data, LabelMode::Compat).expect("valid ELF");
//!     let symbols = inspection.symbols.as_deref().ok();
//!     print!("{}", report::render(&inspection.header, Some(&inspection.sections), symbols));
//! }
//! ```
//!
//! Pipeline: [`image`] → [`header`] → [`section`] → [`symbol`] → [`report`].

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod header;
pub mod image;
pub mod report;
pub mod section;
pub mod symbol;

use alloc::vec::Vec;
use core::fmt;

pub use header::{FileHeader, HeaderError, parse_header};
pub use image::{BoundsError, Endian, FieldReader, read_at};
#[cfg(feature = "std")]
pub use image::{FileError, RawImage, ReadMode};
pub use section::{
    SHN_UNDEF, SHT_STRTAB, SHT_SYMTAB, SectionError, SectionFlags, SectionHeader, StringTable,
    parse_sections,
};
pub use symbol::{
    LabelMode, STB_GLOBAL, STB_WEAK, STT_FUNC, STT_OBJECT, SymbolEntry, SymbolError,
    extract_symbols,
};

/// Any fatal failure of the inspection pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectError {
    /// The file header is invalid.
    Header(HeaderError),
    /// The section header table is invalid.
    Section(SectionError),
    /// The symbol table is invalid.
    Symbol(SymbolError),
}

impl fmt::Display for InspectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header(e) => write!(f, "header error: {e}"),
            Self::Section(e) => write!(f, "section error: {e}"),
            Self::Symbol(e) => write!(f, "symbol error: {e}"),
        }
    }
}

impl core::error::Error for InspectError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Header(e) => Some(e),
            Self::Section(e) => Some(e),
            Self::Symbol(e) => Some(e),
        }
    }
}

impl From<HeaderError> for InspectError {
    fn from(e: HeaderError) -> Self {
        Self::Header(e)
    }
}

impl From<SectionError> for InspectError {
    fn from(e: SectionError) -> Self {
        Self::Section(e)
    }
}

impl From<SymbolError> for InspectError {
    fn from(e: SymbolError) -> Self {
        Self::Symbol(e)
    }
}

/// Result of running the pipeline over one image.
///
/// Header and sections are always valid here; the symbol table is kept as a
/// `Result` so a bad or missing symbol table does not discard them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    /// Parsed file header.
    pub header: FileHeader,
    /// Section headers in index order.
    pub sections: Vec<SectionHeader>,
    /// Symbols of the first `SHT_SYMTAB`, or why there are none.
    pub symbols: Result<Vec<SymbolEntry>, SymbolError>,
}

/// Run header, section and symbol parsing over `data`.
///
/// # Errors
///
/// Returns [`InspectError`] if the header or section table is invalid.
/// Symbol table failures are reported in [`Inspection::symbols`].
pub fn inspect(data: &[u8], mode: LabelMode) -> Result<Inspection, InspectError> {
    let header = parse_header(data)?;
    let sections = parse_sections(data, &header)?;
    let symbols = extract_symbols(data, &header, &sections, mode);
    if let Err(e) = &symbols {
        tracing::debug!(error = %e, fatal = e.is_fatal(), "symbol extraction failed");
    }
    Ok(Inspection {
        header,
        sections,
        symbols,
    })
}
