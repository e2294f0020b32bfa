//! MCPL header constants and header read/write helpers.
//!
//! The fixed part of the header is 48 bytes (52 with a universal weight):
//!
//! ```text
//! [magic "MCPL"][version "003"][endianness 'L'|'B']
//! [nparticles: u64]
//! [ncomments][nblobs][userflags][polarisation][singleprec][univ_pdg][particle_size][univ_weight_flag]  (u32 each)
//! [universal_weight: f64]   (only if univ_weight_flag != 0)
//! ```
//!
//! The variable part follows as length-prefixed (`u32`) buffers: the source
//! name, each comment, each blob key, then each blob payload.

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

use crate::McplError;

/// Magic bytes every MCPL file starts with.
pub const MAGIC: [u8; 4] = *b"MCPL";

/// The only format version this crate reads and writes.
pub const FORMAT_VERSION: u32 = 3;

/// Byte offset of the `nparticles` field: magic (4) + version (3) + endianness (1).
pub const PARTICLE_COUNT_OFFSET: u64 = 8;

/// Upper bound on the capacity reserved ahead of reading a header buffer.
/// Larger buffers grow as their bytes arrive.
const PREALLOC_BYTES: u64 = 1024 * 1024;

/// Byte order declared by a file's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

macro_rules! endian_io {
    ($read:ident, $write:ident, $ty:ty) => {
        pub(crate) fn $read<R: Read + ?Sized>(self, r: &mut R) -> io::Result<$ty> {
            match self {
                Endian::Little => r.$read::<LittleEndian>(),
                Endian::Big => r.$read::<BigEndian>(),
            }
        }

        pub(crate) fn $write<W: Write + ?Sized>(self, w: &mut W, value: $ty) -> io::Result<()> {
            match self {
                Endian::Little => w.$write::<LittleEndian>(value),
                Endian::Big => w.$write::<BigEndian>(value),
            }
        }
    };
}

impl Endian {
    /// Byte order of the running platform.
    #[must_use]
    pub fn native() -> Self {
        if cfg!(target_endian = "little") {
            Endian::Little
        } else {
            Endian::Big
        }
    }

    /// Parses the endianness byte of the header.
    #[must_use]
    pub fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            b'L' => Some(Endian::Little),
            b'B' => Some(Endian::Big),
            _ => None,
        }
    }

    /// The endianness byte written to the header.
    #[must_use]
    pub fn marker(self) -> u8 {
        match self {
            Endian::Little => b'L',
            Endian::Big => b'B',
        }
    }

    #[must_use]
    pub fn is_little(self) -> bool {
        self == Endian::Little
    }

    endian_io!(read_u32, write_u32, u32);
    endian_io!(read_u64, write_u64, u64);
    endian_io!(read_i32, write_i32, i32);
    endian_io!(read_f32, write_f32, f32);
    endian_io!(read_f64, write_f64, f64);
}

/// Record layout declared by the header.
///
/// Determines which optional fields each particle record carries and the
/// width of its floating point fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    /// Records carry a `u32` user-flags field.
    pub userflags: bool,
    /// Records carry a 3-component polarisation vector.
    pub polarisation: bool,
    /// Floating point fields are `f32` instead of `f64`.
    pub single_precision: bool,
    /// Every record has this pdg code; the per-record field is omitted.
    pub universal_pdg_code: Option<i32>,
    /// Every record has this weight; the per-record field is omitted.
    pub universal_weight: Option<f64>,
}

impl Default for Layout {
    /// The layout of a freshly created file: single precision, no optional
    /// fields, no universal values.
    fn default() -> Self {
        Self {
            userflags: false,
            polarisation: false,
            single_precision: true,
            universal_pdg_code: None,
            universal_weight: None,
        }
    }
}

impl Layout {
    /// Width in bytes of one floating point field.
    #[must_use]
    pub fn fp_size(&self) -> usize {
        if self.single_precision {
            4
        } else {
            8
        }
    }

    /// Size in bytes of one particle record.
    #[must_use]
    pub fn particle_size(&self) -> usize {
        // position (3) + ekindir (3) + time (1)
        let mut fp_fields = 7;
        if self.polarisation {
            fp_fields += 3;
        }
        if self.universal_weight.is_none() {
            fp_fields += 1;
        }
        let mut size = fp_fields * self.fp_size();
        if self.universal_pdg_code.is_none() {
            size += 4;
        }
        if self.userflags {
            size += 4;
        }
        size
    }
}

/// Parsed MCPL header.
///
/// Text fields and blob keys are kept as raw bytes so that they survive a
/// read/write cycle unchanged; use [`Header::source_name`] and
/// [`Header::comment`] for checked UTF-8 access.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub endian: Endian,
    /// Number of particle records following the header.
    pub particle_count: u64,
    pub layout: Layout,
    pub source_name: Vec<u8>,
    pub comments: Vec<Vec<u8>>,
    /// Named blobs in header order. Keys are unique.
    pub blobs: Vec<(Vec<u8>, Vec<u8>)>,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            endian: Endian::native(),
            particle_count: 0,
            layout: Layout::default(),
            source_name: Vec::new(),
            comments: Vec::new(),
            blobs: Vec::new(),
        }
    }
}

impl Header {
    /// Returns the source name as UTF-8.
    pub fn source_name(&self) -> Result<&str, McplError> {
        std::str::from_utf8(&self.source_name).map_err(|_| McplError::InvalidText)
    }

    /// Returns comment `index` as UTF-8, or `None` if out of range.
    pub fn comment(&self, index: usize) -> Option<Result<&str, McplError>> {
        self.comments
            .get(index)
            .map(|c| std::str::from_utf8(c).map_err(|_| McplError::InvalidText))
    }

    /// Returns the payload stored under `key`, if any.
    #[must_use]
    pub fn blob(&self, key: impl AsRef<[u8]>) -> Option<&[u8]> {
        let key = key.as_ref();
        self.blobs
            .iter()
            .find(|(k, _)| k.as_slice() == key)
            .map(|(_, data)| data.as_slice())
    }

    /// Returns all blob keys in header order.
    pub fn blob_keys(&self) -> impl Iterator<Item = &[u8]> {
        self.blobs.iter().map(|(k, _)| k.as_slice())
    }
}

/// Reads a complete header from `r`, leaving the cursor at the first particle.
///
/// # Errors
///
/// Returns [`McplError::BadMagic`] or [`McplError::UnsupportedVersion`] for
/// files this crate cannot read, [`McplError::Corrupt`] for inconsistent
/// headers, and [`McplError::Io`] on read failure (including a short file).
pub fn read_header<R: Read + ?Sized>(r: &mut R) -> Result<Header, McplError> {
    let mut start = [0u8; 8];
    r.read_exact(&mut start)?;

    if start[..4] != MAGIC {
        return Err(McplError::BadMagic);
    }
    if !start[4..7].iter().all(u8::is_ascii_digit) {
        return Err(McplError::Corrupt("version field is not numeric".to_string()));
    }
    let version = start[4..7]
        .iter()
        .fold(0u32, |acc, d| acc * 10 + u32::from(d - b'0'));
    if version != FORMAT_VERSION {
        return Err(McplError::UnsupportedVersion(version));
    }
    let endian = Endian::from_marker(start[7]).ok_or_else(|| {
        McplError::Corrupt(format!("unknown endianness marker {:#04x}", start[7]))
    })?;

    let particle_count = endian.read_u64(r)?;

    let mut fields = [0u32; 8];
    for field in fields.iter_mut() {
        *field = endian.read_u32(r)?;
    }
    let [ncomments, nblobs, userflags, polarisation, singleprec, pdg_code, particle_size, has_weight] =
        fields;

    let universal_weight = if has_weight != 0 {
        Some(endian.read_f64(r)?)
    } else {
        None
    };
    // Stored as an i32 on disk; reinterpret the bits.
    let pdg_code = pdg_code as i32;

    let layout = Layout {
        userflags: userflags != 0,
        polarisation: polarisation != 0,
        single_precision: singleprec != 0,
        universal_pdg_code: (pdg_code != 0).then_some(pdg_code),
        universal_weight,
    };
    if layout.particle_size() != particle_size as usize {
        return Err(McplError::Corrupt(format!(
            "declared particle size {} does not match layout size {}",
            particle_size,
            layout.particle_size()
        )));
    }

    let source_name = read_buffer(r, endian)?;
    let comments = (0..ncomments)
        .map(|_| read_buffer(r, endian))
        .collect::<Result<Vec<_>, _>>()?;
    let keys = (0..nblobs)
        .map(|_| read_buffer(r, endian))
        .collect::<Result<Vec<_>, _>>()?;
    let mut blobs = Vec::with_capacity(keys.len());
    for key in keys {
        let data = read_buffer(r, endian)?;
        blobs.push((key, data));
    }

    Ok(Header {
        endian,
        particle_count,
        layout,
        source_name,
        comments,
        blobs,
    })
}

/// Writes a complete header to `w`.
///
/// The `nparticles` field is written from `header.particle_count`; writers
/// that do not know the final count yet write `0` and patch it on close.
pub fn write_header<W: Write + ?Sized>(w: &mut W, header: &Header) -> Result<(), McplError> {
    let endian = header.endian;
    let layout = &header.layout;

    w.write_all(&MAGIC)?;
    w.write_all(format!("{:03}", FORMAT_VERSION).as_bytes())?;
    w.write_all(&[endian.marker()])?;
    endian.write_u64(w, header.particle_count)?;

    let fields = [
        len_u32(header.comments.len())?,
        len_u32(header.blobs.len())?,
        u32::from(layout.userflags),
        u32::from(layout.polarisation),
        u32::from(layout.single_precision),
        layout.universal_pdg_code.unwrap_or(0) as u32,
        len_u32(layout.particle_size())?,
        u32::from(layout.universal_weight.is_some()),
    ];
    for field in fields {
        endian.write_u32(w, field)?;
    }
    if let Some(weight) = layout.universal_weight {
        endian.write_f64(w, weight)?;
    }

    write_buffer(w, endian, &header.source_name)?;
    for comment in &header.comments {
        write_buffer(w, endian, comment)?;
    }
    for (key, _) in &header.blobs {
        write_buffer(w, endian, key)?;
    }
    for (_, data) in &header.blobs {
        write_buffer(w, endian, data)?;
    }
    Ok(())
}

/// Reads one length-prefixed buffer. A length running past the end of the
/// stream is reported as [`io::ErrorKind::UnexpectedEof`].
fn read_buffer<R: Read + ?Sized>(r: &mut R, endian: Endian) -> Result<Vec<u8>, McplError> {
    let len = u64::from(endian.read_u32(r)?);
    let mut buf = Vec::with_capacity(len.min(PREALLOC_BYTES) as usize);
    Read::take(&mut *r, len).read_to_end(&mut buf)?;
    if buf.len() as u64 != len {
        return Err(McplError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("header buffer declares {} bytes, only {} present", len, buf.len()),
        )));
    }
    Ok(buf)
}

fn write_buffer<W: Write + ?Sized>(w: &mut W, endian: Endian, data: &[u8]) -> Result<(), McplError> {
    endian.write_u32(w, len_u32(data.len())?)?;
    w.write_all(data)?;
    Ok(())
}

fn len_u32(len: usize) -> Result<u32, McplError> {
    u32::try_from(len)
        .map_err(|_| McplError::InvalidArgument(format!("length {} does not fit in u32", len)))
}
