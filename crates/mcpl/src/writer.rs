use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::format::{write_header, Header, PARTICLE_COUNT_OFFSET};
use crate::gzip::compress_in_place;
use crate::{McplError, Particle};

/// Streaming writer for a new MCPL file.
///
/// Header edits (source name, comments, blobs, layout options) are collected
/// in memory and written together with the first particle, or on close if no
/// particle is ever added. After that the header is frozen and further edits
/// fail with [`McplError::HeaderFrozen`].
///
/// The header's particle count is written as `0` and patched on
/// [`close`](McplWriter::close), so an unfinished file never claims records it
/// does not contain.
///
/// Exactly one of [`close`](McplWriter::close),
/// [`close_and_gzip`](McplWriter::close_and_gzip) or
/// [`abandon`](McplWriter::abandon) finishes the writer.
pub struct McplWriter {
    path: PathBuf,
    file: BufWriter<File>,
    header: Header,
    header_written: bool,
    particles_written: u64,
    /// Reusable buffer for encoding one record.
    record: Vec<u8>,
}

impl std::fmt::Debug for McplWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McplWriter")
            .field("path", &self.path)
            .field("header_written", &self.header_written)
            .field("particles_written", &self.particles_written)
            .finish()
    }
}

impl McplWriter {
    /// Creates (or truncates) the file at `path`.
    ///
    /// The new file uses the platform's byte order and the default
    /// [`Layout`](crate::Layout).
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, McplError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        Ok(Self {
            path,
            file: BufWriter::new(file),
            header: Header::default(),
            header_written: false,
            particles_written: 0,
            record: Vec::with_capacity(96),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The header as it will be (or was) written.
    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    #[must_use]
    pub fn particles_written(&self) -> u64 {
        self.particles_written
    }

    /// Sets the source name. Any bytes are accepted and stored as given.
    pub fn set_source_name(&mut self, name: impl AsRef<[u8]>) -> Result<(), McplError> {
        self.header_mut()?.source_name = name.as_ref().to_vec();
        Ok(())
    }

    pub fn add_comment(&mut self, comment: impl AsRef<[u8]>) -> Result<(), McplError> {
        self.header_mut()?.comments.push(comment.as_ref().to_vec());
        Ok(())
    }

    /// Adds a named blob to the header.
    ///
    /// # Errors
    ///
    /// Returns [`McplError::DuplicateBlobKey`] if `key` is already present.
    pub fn add_blob(&mut self, key: impl AsRef<[u8]>, data: &[u8]) -> Result<(), McplError> {
        let key = key.as_ref();
        let header = self.header_mut()?;
        if header.blob(key).is_some() {
            return Err(McplError::DuplicateBlobKey(
                String::from_utf8_lossy(key).into_owned(),
            ));
        }
        header.blobs.push((key.to_vec(), data.to_vec()));
        Ok(())
    }

    pub fn enable_userflags(&mut self) -> Result<(), McplError> {
        self.header_mut()?.layout.userflags = true;
        Ok(())
    }

    pub fn enable_polarisation(&mut self) -> Result<(), McplError> {
        self.header_mut()?.layout.polarisation = true;
        Ok(())
    }

    pub fn enable_double_precision(&mut self) -> Result<(), McplError> {
        self.header_mut()?.layout.single_precision = false;
        Ok(())
    }

    /// Declares that every particle has pdg code `code`. Zero is reserved
    /// for "no universal pdg code" and is rejected.
    pub fn set_universal_pdg_code(&mut self, code: i32) -> Result<(), McplError> {
        if code == 0 {
            return Err(McplError::InvalidArgument(
                "universal pdg code must be non-zero".to_string(),
            ));
        }
        self.header_mut()?.layout.universal_pdg_code = Some(code);
        Ok(())
    }

    /// Declares that every particle has weight `weight`, which must be
    /// finite and positive.
    pub fn set_universal_weight(&mut self, weight: f64) -> Result<(), McplError> {
        if !(weight.is_finite() && weight > 0.0) {
            return Err(McplError::InvalidArgument(format!(
                "universal weight must be finite and positive, got {}",
                weight
            )));
        }
        self.header_mut()?.layout.universal_weight = Some(weight);
        Ok(())
    }

    /// Encodes `particle` with this file's layout and appends it.
    ///
    /// The first call writes the header.
    pub fn add_particle(&mut self, particle: &Particle) -> Result<(), McplError> {
        self.write_header_once()?;
        self.record.clear();
        particle.encode(&self.header.layout, self.header.endian, &mut self.record)?;
        self.file.write_all(&self.record)?;
        self.particles_written += 1;
        Ok(())
    }

    /// Finishes the file: writes the header if still pending, patches the
    /// particle count, and syncs to disk. Returns the file's path.
    pub fn close(mut self) -> Result<PathBuf, McplError> {
        self.write_header_once()?;
        self.file.seek(SeekFrom::Start(PARTICLE_COUNT_OFFSET))?;
        self.header
            .endian
            .write_u64(&mut self.file, self.particles_written)?;
        self.file.flush()?;
        self.file
            .into_inner()
            .map_err(io::Error::from)?
            .sync_all()?;
        Ok(self.path)
    }

    /// Closes the file and compresses it to `<path>.gz`, removing the
    /// uncompressed file. Returns the path of the compressed file.
    ///
    /// # Errors
    ///
    /// If compression fails the closed, uncompressed file is left on disk and
    /// [`McplError::Compress`] names it.
    pub fn close_and_gzip(self) -> Result<PathBuf, McplError> {
        let plain = self.close()?;
        compress_in_place(&plain)
    }

    /// Discards the file: releases the handle and removes the file from disk.
    pub fn abandon(self) -> Result<(), McplError> {
        let McplWriter { path, file, .. } = self;
        drop(file);
        fs::remove_file(&path)?;
        Ok(())
    }

    fn header_mut(&mut self) -> Result<&mut Header, McplError> {
        if self.header_written {
            return Err(McplError::HeaderFrozen);
        }
        Ok(&mut self.header)
    }

    fn write_header_once(&mut self) -> Result<(), McplError> {
        if !self.header_written {
            write_header(&mut self.file, &self.header)?;
            self.header_written = true;
        }
        Ok(())
    }
}
