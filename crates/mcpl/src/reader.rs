use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::format::{read_header, Header};
use crate::gzip::GZIP_MAGIC;
use crate::{McplError, Particle};

/// Sequential reader for an MCPL file.
///
/// [`open`](McplReader::open) parses the whole header up front; particles are
/// then streamed one record at a time with
/// [`read_particle`](McplReader::read_particle). Gzip-compressed files are
/// decompressed on the fly, including files made of several concatenated
/// gzip members.
///
/// The file handle is released when the reader is dropped or
/// [`close`](McplReader::close)d.
pub struct McplReader {
    path: PathBuf,
    header: Header,
    input: Box<dyn Read>,
    /// Particles declared by the header that have not been read yet.
    remaining: u64,
    /// Reusable buffer holding one raw record.
    record: Vec<u8>,
}

impl std::fmt::Debug for McplReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McplReader")
            .field("path", &self.path)
            .field("particle_count", &self.header.particle_count)
            .field("remaining", &self.remaining)
            .finish()
    }
}

impl McplReader {
    /// Opens an MCPL file (plain or gzip-compressed) and parses its header.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or its header is not a
    /// readable MCPL version 3 header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, McplError> {
        let path = path.as_ref().to_path_buf();
        let mut buffered = BufReader::new(File::open(&path)?);

        let gzipped = buffered.fill_buf()?.starts_with(&GZIP_MAGIC);
        let mut input: Box<dyn Read> = if gzipped {
            Box::new(BufReader::new(MultiGzDecoder::new(buffered)))
        } else {
            Box::new(buffered)
        };

        let header = read_header(&mut input)?;
        let record = vec![0u8; header.layout.particle_size()];

        Ok(Self {
            path,
            remaining: header.particle_count,
            header,
            input,
            record,
        })
    }

    /// Path this reader was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Number of particles declared by the header.
    #[must_use]
    pub fn particle_count(&self) -> u64 {
        self.header.particle_count
    }

    /// Reads the next particle, or `Ok(None)` once all declared particles
    /// have been read.
    ///
    /// # Errors
    ///
    /// Returns [`McplError::Truncated`] if the file ends before the declared
    /// particle count is reached.
    pub fn read_particle(&mut self) -> Result<Option<Particle>, McplError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        match self.input.read_exact(&mut self.record) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(McplError::Truncated {
                    missing: self.remaining,
                });
            }
            Err(e) => return Err(McplError::Io(e)),
        }
        self.remaining -= 1;
        Particle::decode(&self.record, &self.header.layout, self.header.endian).map(Some)
    }

    /// Releases the file handle.
    pub fn close(self) {}
}
