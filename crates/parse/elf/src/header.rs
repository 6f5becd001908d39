//! ELF64 file header parsing.
//!
//! Reads the 16-byte identification block and the fixed 64-byte ELF64 header
//! through [`FieldReader`], honoring the encoding declared in `e_ident`.

use core::fmt;

use crate::image::{BoundsError, Endian, FieldReader, read_at};

/// ELF magic bytes: `\x7fELF`.
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Size of the identification block.
pub const EI_NIDENT: usize = 16;

/// Index of the class byte in `e_ident`.
pub const EI_CLASS: usize = 4;
/// Index of the data encoding byte in `e_ident`.
pub const EI_DATA: usize = 5;
/// Index of the identification version byte in `e_ident`.
pub const EI_VERSION: usize = 6;
/// Index of the OS/ABI byte in `e_ident`.
pub const EI_OSABI: usize = 7;
/// Index of the ABI version byte in `e_ident`.
pub const EI_ABIVERSION: usize = 8;

/// ELF class: 32-bit.
pub const ELFCLASS32: u8 = 1;
/// ELF class: 64-bit.
pub const ELFCLASS64: u8 = 2;

/// Data encoding: two's complement little-endian.
pub const ELFDATA2LSB: u8 = 1;
/// Data encoding: two's complement big-endian.
pub const ELFDATA2MSB: u8 = 2;

/// Current ELF version.
pub const EV_CURRENT: u32 = 1;

/// ELF type: relocatable object.
pub const ET_REL: u16 = 1;
/// ELF type: executable.
pub const ET_EXEC: u16 = 2;
/// ELF type: shared object (PIE).
pub const ET_DYN: u16 = 3;
/// ELF type: core dump.
pub const ET_CORE: u16 = 4;

/// ELF machine: x86-64.
pub const EM_X86_64: u16 = 62;

/// Size of an ELF64 file header (64 bytes).
pub const ELF64_EHDR_SIZE: usize = 64;

/// Errors produced while parsing the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderError {
    /// The input is shorter than a full ELF64 header.
    TruncatedHeader {
        /// Number of bytes available.
        len: usize,
    },
    /// The first four bytes are not `\x7fELF`.
    BadMagic {
        /// The bytes found instead.
        found: [u8; 4],
    },
    /// The class byte is not `ELFCLASS64`.
    UnsupportedClass(u8),
    /// The data encoding byte is neither little- nor big-endian.
    UnsupportedEncoding(u8),
    /// A field read left the image.
    Bounds(BoundsError),
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedHeader { len } => write!(
                f,
                "truncated header: {len} bytes, need {ELF64_EHDR_SIZE}"
            ),
            Self::BadMagic { found } => write!(
                f,
                "bad magic at offset 0x0: {:02x} {:02x} {:02x} {:02x}",
                found[0], found[1], found[2], found[3]
            ),
            Self::UnsupportedClass(class) => {
                write!(f, "unsupported class {class} at offset {EI_CLASS:#x} (expected ELFCLASS64)")
            }
            Self::UnsupportedEncoding(data) => {
                write!(f, "unsupported data encoding {data} at offset {EI_DATA:#x}")
            }
            Self::Bounds(e) => write!(f, "header: {e}"),
        }
    }
}

impl core::error::Error for HeaderError {}

impl From<BoundsError> for HeaderError {
    fn from(e: BoundsError) -> Self {
        Self::Bounds(e)
    }
}

/// Parsed ELF64 file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Raw identification bytes.
    pub e_ident: [u8; EI_NIDENT],
    /// Byte order declared by `e_ident[EI_DATA]`.
    pub endian: Endian,
    /// Object file type.
    pub e_type: u16,
    /// Target machine architecture.
    pub e_machine: u16,
    /// Object file version.
    pub e_version: u32,
    /// Virtual address of the entry point.
    pub e_entry: u64,
    /// Offset of the program header table in the file.
    pub e_phoff: u64,
    /// Offset of the section header table in the file.
    pub e_shoff: u64,
    /// Processor-specific flags.
    pub e_flags: u32,
    /// Size of this header.
    pub e_ehsize: u16,
    /// Size of each program header entry.
    pub e_phentsize: u16,
    /// Number of program header entries.
    pub e_phnum: u16,
    /// Size of each section header entry.
    pub e_shentsize: u16,
    /// Number of section header entries.
    pub e_shnum: u16,
    /// Section header string table index.
    pub e_shstrndx: u16,
}

impl FileHeader {
    /// `e_ident[EI_CLASS]`.
    #[must_use]
    pub fn class(&self) -> u8 {
        self.e_ident[EI_CLASS]
    }

    /// `e_ident[EI_DATA]`.
    #[must_use]
    pub fn data(&self) -> u8 {
        self.e_ident[EI_DATA]
    }

    /// `e_ident[EI_VERSION]`.
    #[must_use]
    pub fn ident_version(&self) -> u8 {
        self.e_ident[EI_VERSION]
    }

    /// `e_ident[EI_OSABI]`.
    #[must_use]
    pub fn osabi(&self) -> u8 {
        self.e_ident[EI_OSABI]
    }

    /// `e_ident[EI_ABIVERSION]`.
    #[must_use]
    pub fn abi_version(&self) -> u8 {
        self.e_ident[EI_ABIVERSION]
    }

    /// Field reader over `data` using this file's byte order.
    #[must_use]
    pub fn reader<'a>(&self, data: &'a [u8]) -> FieldReader<'a> {
        FieldReader::new(data, self.endian)
    }
}

/// Parse the ELF64 file header at the start of `data`.
///
/// # Errors
///
/// Returns [`HeaderError::TruncatedHeader`] for inputs shorter than 64 bytes,
/// [`HeaderError::BadMagic`] if the magic does not match, and
/// [`HeaderError::UnsupportedClass`] for anything but ELF64.
pub fn parse_header(data: &[u8]) -> Result<FileHeader, HeaderError> {
    let Ok(block) = read_at(data, 0, ELF64_EHDR_SIZE as u64) else {
        // Report a bad magic ahead of the length when we can see it.
        if let Some(&found) = data.first_chunk::<4>() {
            if found != ELF_MAGIC {
                return Err(HeaderError::BadMagic { found });
            }
        }
        return Err(HeaderError::TruncatedHeader { len: data.len() });
    };

    let mut e_ident = [0u8; EI_NIDENT];
    e_ident.copy_from_slice(&block[..EI_NIDENT]);

    if e_ident[..4] != ELF_MAGIC {
        let mut found = [0u8; 4];
        found.copy_from_slice(&e_ident[..4]);
        return Err(HeaderError::BadMagic { found });
    }

    if e_ident[EI_CLASS] != ELFCLASS64 {
        return Err(HeaderError::UnsupportedClass(e_ident[EI_CLASS]));
    }

    let endian = match e_ident[EI_DATA] {
        ELFDATA2LSB => Endian::Little,
        ELFDATA2MSB => Endian::Big,
        other => return Err(HeaderError::UnsupportedEncoding(other)),
    };

    let r = FieldReader::new(block, endian);
    let header = FileHeader {
        e_ident,
        endian,
        e_type: r.u16(16)?,
        e_machine: r.u16(18)?,
        e_version: r.u32(20)?,
        e_entry: r.u64(24)?,
        e_phoff: r.u64(32)?,
        e_shoff: r.u64(40)?,
        e_flags: r.u32(48)?,
        e_ehsize: r.u16(52)?,
        e_phentsize: r.u16(54)?,
        e_phnum: r.u16(56)?,
        e_shentsize: r.u16(58)?,
        e_shnum: r.u16(60)?,
        e_shstrndx: r.u16(62)?,
    };

    tracing::debug!(
        e_type = header.e_type,
        e_machine = header.e_machine,
        e_shoff = header.e_shoff,
        e_shnum = header.e_shnum,
        big_endian = endian == Endian::Big,
        "parsed ELF header"
    );

    Ok(header)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::section::ELF64_SHDR_SIZE;

    /// Build a minimal valid little-endian ELF64 header (64 bytes).
    ///
    /// Defaults: `ET_EXEC`, `EM_X86_64`, entry=0x401000, phoff=64, no sections.
    pub(crate) fn make_elf_header() -> Vec<u8> {
        let mut buf = vec![0u8; ELF64_EHDR_SIZE];

        buf[0..4].copy_from_slice(&ELF_MAGIC);
        buf[EI_CLASS] = ELFCLASS64;
        buf[EI_DATA] = ELFDATA2LSB;
        buf[EI_VERSION] = 1;
        buf[16..18].copy_from_slice(&ET_EXEC.to_le_bytes());
        buf[18..20].copy_from_slice(&EM_X86_64.to_le_bytes());
        buf[20..24].copy_from_slice(&EV_CURRENT.to_le_bytes());
        buf[24..32].copy_from_slice(&0x0040_1000u64.to_le_bytes());
        buf[32..40].copy_from_slice(&(ELF64_EHDR_SIZE as u64).to_le_bytes());
        // e_shoff stays 0
        buf[52..54].copy_from_slice(&(ELF64_EHDR_SIZE as u16).to_le_bytes());
        buf[54..56].copy_from_slice(&56u16.to_le_bytes());
        buf[58..60].copy_from_slice(&(ELF64_SHDR_SIZE as u16).to_le_bytes());

        buf
    }

    #[test]
    fn parse_valid_header() {
        let buf = make_elf_header();
        let hdr = parse_header(&buf).expect("valid header");
        assert_eq!(hdr.endian, Endian::Little);
        assert_eq!(hdr.e_type, ET_EXEC);
        assert_eq!(hdr.e_machine, EM_X86_64);
        assert_eq!(hdr.e_version, EV_CURRENT);
        assert_eq!(hdr.e_entry, 0x0040_1000);
        assert_eq!(hdr.e_phoff, ELF64_EHDR_SIZE as u64);
        assert_eq!(hdr.e_ehsize, 64);
        assert_eq!(hdr.e_phentsize, 56);
        assert_eq!(hdr.e_shentsize, 64);
        assert_eq!(hdr.e_shnum, 0);
        assert_eq!(hdr.ident_version(), 1);
    }

    #[test]
    fn parse_big_endian_header() {
        let mut buf = vec![0u8; ELF64_EHDR_SIZE];
        buf[0..4].copy_from_slice(&ELF_MAGIC);
        buf[EI_CLASS] = ELFCLASS64;
        buf[EI_DATA] = ELFDATA2MSB;
        buf[16..18].copy_from_slice(&ET_DYN.to_be_bytes());
        buf[18..20].copy_from_slice(&21u16.to_be_bytes()); // EM_PPC64
        buf[24..32].copy_from_slice(&0x1000_0000u64.to_be_bytes());
        buf[60..62].copy_from_slice(&7u16.to_be_bytes());

        let hdr = parse_header(&buf).expect("valid big-endian header");
        assert_eq!(hdr.endian, Endian::Big);
        assert_eq!(hdr.e_type, ET_DYN);
        assert_eq!(hdr.e_machine, 21);
        assert_eq!(hdr.e_entry, 0x1000_0000);
        assert_eq!(hdr.e_shnum, 7);
    }

    #[test]
    fn reject_bad_magic() {
        let mut buf = make_elf_header();
        buf[0] = 0x00;
        assert_eq!(
            parse_header(&buf),
            Err(HeaderError::BadMagic {
                found: [0x00, b'E', b'L', b'F']
            })
        );
    }

    #[test]
    fn bad_magic_wins_over_short_input() {
        assert_eq!(
            parse_header(b"MZ\x90\x00\x03"),
            Err(HeaderError::BadMagic {
                found: *b"MZ\x90\x00"
            })
        );
    }

    #[test]
    fn reject_32bit_class() {
        let mut buf = make_elf_header();
        buf[EI_CLASS] = ELFCLASS32;
        assert_eq!(parse_header(&buf), Err(HeaderError::UnsupportedClass(1)));
    }

    #[test]
    fn reject_unknown_encoding() {
        let mut buf = make_elf_header();
        buf[EI_DATA] = 3;
        assert_eq!(parse_header(&buf), Err(HeaderError::UnsupportedEncoding(3)));
    }

    #[test]
    fn reject_truncated_data() {
        let buf = make_elf_header();
        assert_eq!(
            parse_header(&buf[..32]),
            Err(HeaderError::TruncatedHeader { len: 32 })
        );
        assert_eq!(
            parse_header(&[]),
            Err(HeaderError::TruncatedHeader { len: 0 })
        );
    }

    #[test]
    fn display_names_offsets() {
        let msg = format!("{}", HeaderError::UnsupportedClass(1));
        assert!(msg.contains("0x4"));
        let msg = format!("{}", HeaderError::BadMagic { found: [0; 4] });
        assert!(msg.starts_with("bad magic"));
    }
}
