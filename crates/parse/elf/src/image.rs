//! Raw file image and bounds-checked field extraction.
//!
//! Every structured read in the crate goes through [`read_at`], which refuses
//! any `offset + len` that overflows or runs past the end of the image.
//! Integers are decoded with [`FieldReader`] using the file's declared
//! [`Endian`], never the host byte order.

use core::fmt;

/// Error returned when a read would leave the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundsError {
    /// Requested start offset.
    pub offset: u64,
    /// Requested length in bytes.
    pub len: u64,
    /// Total size of the image.
    pub size: u64,
}

impl fmt::Display for BoundsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "read of {} bytes at offset {:#x} exceeds image size {:#x}",
            self.len, self.offset, self.size
        )
    }
}

impl core::error::Error for BoundsError {}

/// Return `len` bytes of `data` starting at `offset`.
///
/// # Errors
///
/// Returns [`BoundsError`] if `offset + len` overflows or exceeds `data.len()`.
pub fn read_at(data: &[u8], offset: u64, len: u64) -> Result<&[u8], BoundsError> {
    let err = BoundsError {
        offset,
        len,
        size: data.len() as u64,
    };
    let end = offset.checked_add(len).ok_or(err)?;
    if end > data.len() as u64 {
        return Err(err);
    }
    #[expect(
        clippy::cast_possible_truncation,
        reason = "end <= data.len() checked above"
    )]
    let range = offset as usize..end as usize;
    Ok(&data[range])
}

/// Byte order of multi-byte fields, taken from `e_ident[EI_DATA]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// `ELFDATA2LSB`.
    Little,
    /// `ELFDATA2MSB`.
    Big,
}

/// Typed field decoder over a byte slice with a fixed byte order.
///
/// Offsets are relative to the start of `data`, which is usually a slice
/// already obtained from [`read_at`] for one record.
#[derive(Debug, Clone, Copy)]
pub struct FieldReader<'a> {
    data: &'a [u8],
    endian: Endian,
}

impl<'a> FieldReader<'a> {
    /// Creates a reader over `data` decoding with `endian`.
    #[must_use]
    pub fn new(data: &'a [u8], endian: Endian) -> Self {
        Self { data, endian }
    }

    /// Returns the byte order used by this reader.
    #[must_use]
    pub fn endian(&self) -> Endian {
        self.endian
    }

    fn array<const N: usize>(&self, off: u64) -> Result<[u8; N], BoundsError> {
        let b = read_at(self.data, off, N as u64)?;
        let mut out = [0u8; N];
        out.copy_from_slice(b);
        Ok(out)
    }

    /// Reads one byte at `off`.
    pub fn u8(&self, off: u64) -> Result<u8, BoundsError> {
        Ok(self.array::<1>(off)?[0])
    }

    /// Reads a `u16` at `off`.
    pub fn u16(&self, off: u64) -> Result<u16, BoundsError> {
        let b = self.array(off)?;
        Ok(match self.endian {
            Endian::Little => u16::from_le_bytes(b),
            Endian::Big => u16::from_be_bytes(b),
        })
    }

    /// Reads a `u32` at `off`.
    pub fn u32(&self, off: u64) -> Result<u32, BoundsError> {
        let b = self.array(off)?;
        Ok(match self.endian {
            Endian::Little => u32::from_le_bytes(b),
            Endian::Big => u32::from_be_bytes(b),
        })
    }

    /// Reads a `u64` at `off`.
    pub fn u64(&self, off: u64) -> Result<u64, BoundsError> {
        let b = self.array(off)?;
        Ok(match self.endian {
            Endian::Little => u64::from_le_bytes(b),
            Endian::Big => u64::from_be_bytes(b),
        })
    }
}

#[cfg(feature = "std")]
pub use self::file::{FileError, RawImage, ReadMode};

#[cfg(feature = "std")]
mod file {
    use std::fs::File;
    use std::io::Read;
    use std::path::{Path, PathBuf};
    use std::{fmt, io};

    use super::{BoundsError, read_at};

    /// How [`RawImage::open`] obtains the file contents.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum ReadMode {
        /// Map the file read-only (falls back to a buffered read for empty files).
        #[default]
        Mapped,
        /// Read the whole file into an owned buffer.
        Buffered,
    }

    /// Failure to open, stat, read or map the input file.
    #[derive(Debug)]
    pub struct FileError {
        /// Path that was being opened.
        pub path: PathBuf,
        /// Operation that failed (`"open"`, `"stat"`, `"read"`, `"mmap"`).
        pub op: &'static str,
        /// Underlying I/O error.
        pub source: io::Error,
    }

    impl fmt::Display for FileError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{} {}: {}", self.op, self.path.display(), self.source)
        }
    }

    impl std::error::Error for FileError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.source)
        }
    }

    enum Backing {
        #[cfg(feature = "mmap")]
        Mapped(memmap::Mmap),
        Owned(Vec<u8>),
    }

    /// Immutable bytes of one input file.
    ///
    /// The mapping or buffer is released when the image is dropped.
    pub struct RawImage {
        backing: Backing,
    }

    impl fmt::Debug for RawImage {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let kind = match self.backing {
                #[cfg(feature = "mmap")]
                Backing::Mapped(_) => "mapped",
                Backing::Owned(_) => "owned",
            };
            f.debug_struct("RawImage")
                .field("backing", &kind)
                .field("len", &self.len())
                .finish()
        }
    }

    impl RawImage {
        /// Opens `path` and makes its contents available as an image.
        ///
        /// # Errors
        ///
        /// Returns [`FileError`] if the file cannot be opened, inspected,
        /// read or mapped.
        pub fn open(path: impl AsRef<Path>, mode: ReadMode) -> Result<Self, FileError> {
            let path = path.as_ref();
            let fail = |op: &'static str| {
                move |source: io::Error| FileError {
                    path: path.to_path_buf(),
                    op,
                    source,
                }
            };

            let mut file = File::open(path).map_err(fail("open"))?;
            let len = file.metadata().map_err(fail("stat"))?.len();

            #[cfg(feature = "mmap")]
            if mode == ReadMode::Mapped && len > 0 {
                // SAFETY: the mapping is private and read-only; the image never
                // hands out the mapping itself, only bounds-checked slices.
                #[allow(unsafe_code)]
                let map = unsafe { memmap::MmapOptions::new().map(&file) }.map_err(fail("mmap"))?;
                tracing::debug!(path = %path.display(), len, "mapped input file");
                return Ok(Self {
                    backing: Backing::Mapped(map),
                });
            }
            #[cfg(not(feature = "mmap"))]
            let _ = mode;

            let mut buf = Vec::with_capacity(usize::try_from(len).unwrap_or(0));
            file.read_to_end(&mut buf).map_err(fail("read"))?;
            tracing::debug!(path = %path.display(), len = buf.len(), "read input file");
            Ok(Self::from_bytes(buf))
        }

        /// Wraps an in-memory buffer as an image.
        #[must_use]
        pub fn from_bytes(bytes: Vec<u8>) -> Self {
            Self {
                backing: Backing::Owned(bytes),
            }
        }

        /// Returns the full contents of the image.
        #[must_use]
        pub fn as_bytes(&self) -> &[u8] {
            match &self.backing {
                #[cfg(feature = "mmap")]
                Backing::Mapped(map) => map,
                Backing::Owned(buf) => buf,
            }
        }

        /// Size of the image in bytes.
        #[must_use]
        pub fn len(&self) -> usize {
            self.as_bytes().len()
        }

        /// Returns `true` if the image holds no bytes.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        /// Bounds-checked slice of the image, see [`read_at`].
        ///
        /// # Errors
        ///
        /// Returns [`BoundsError`] if the range leaves the image.
        pub fn read_at(&self, offset: u64, len: u64) -> Result<&[u8], BoundsError> {
            read_at(self.as_bytes(), offset, len)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_at_in_range() {
        let data = [1u8, 2, 3, 4];
        assert_eq!(read_at(&data, 1, 2), Ok(&data[1..3]));
        assert_eq!(read_at(&data, 4, 0), Ok(&data[4..4]));
    }

    #[test]
    fn read_at_past_end() {
        let data = [0u8; 4];
        assert_eq!(
            read_at(&data, 2, 3),
            Err(BoundsError {
                offset: 2,
                len: 3,
                size: 4
            })
        );
    }

    #[test]
    fn read_at_overflowing_offset() {
        let data = [0u8; 4];
        assert!(read_at(&data, u64::MAX, 2).is_err());
    }

    #[test]
    fn field_reader_honors_endianness() {
        let data = [0x12u8, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0];
        let le = FieldReader::new(&data, Endian::Little);
        let be = FieldReader::new(&data, Endian::Big);
        assert_eq!(le.u16(0), Ok(0x3412));
        assert_eq!(be.u16(0), Ok(0x1234));
        assert_eq!(le.u32(4), Ok(0xf0de_bc9a));
        assert_eq!(be.u32(4), Ok(0x9abc_def0));
        assert_eq!(be.u64(0), Ok(0x1234_5678_9abc_def0));
        assert_eq!(le.u8(7), Ok(0xf0));
    }

    #[test]
    fn field_reader_rejects_short_field() {
        let data = [0u8; 6];
        let r = FieldReader::new(&data, Endian::Little);
        assert!(r.u32(2).is_ok());
        assert!(r.u32(3).is_err());
        assert!(r.u64(0).is_err());
    }

    #[cfg(feature = "std")]
    #[test]
    fn owned_image_reads() {
        let img = RawImage::from_bytes(vec![9, 8, 7]);
        assert_eq!(img.len(), 3);
        assert_eq!(img.read_at(1, 2), Ok(&[8u8, 7][..]));
        assert!(img.read_at(2, 2).is_err());
    }

    #[cfg(feature = "std")]
    #[test]
    fn open_missing_file_is_file_error() {
        let err = RawImage::open("/nonexistent/elfview/input", ReadMode::Buffered).unwrap_err();
        assert_eq!(err.op, "open");
    }
}
