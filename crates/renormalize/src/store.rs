//! The particle-file capability the merge engine is written against.
//!
//! The engine never touches a concrete file format. It opens inputs, creates
//! the output, copies header metadata and streams records exclusively through
//! these traits, so the same merge logic runs against MCPL files
//! ([`McplStore`](crate::McplStore)) or an in-memory store in tests.

use anyhow::Result;
use std::path::{Path, PathBuf};

/// A particle record as seen by the merge loop.
///
/// Records are opaque apart from their weight; everything else is carried
/// through unchanged.
pub trait ParticleRecord {
    fn weight(&self) -> f64;
    fn set_weight(&mut self, weight: f64);
}

/// Optional record features a file header can enable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Features {
    pub userflags: bool,
    pub polarisation: bool,
    pub double_precision: bool,
}

/// An open input file: header metadata plus a forward-only record cursor.
///
/// Header text and blob keys are raw bytes. They are copied to the output
/// exactly as stored, whatever their encoding.
pub trait ParticleInput {
    type Record: ParticleRecord;

    /// Byte order the file's header declares.
    fn is_little_endian(&self) -> bool;

    fn source_name(&self) -> Result<&[u8]>;

    fn comment_count(&self) -> usize;

    /// Returns comment `index`. Fails if the comment cannot be read.
    fn comment(&self, index: usize) -> Result<&[u8]>;

    /// Blob keys in header order.
    fn blob_keys(&self) -> Vec<&[u8]>;

    /// Returns the payload stored under `key`, `Ok(None)` if there is no such
    /// blob, or an error if it exists but cannot be read.
    fn blob(&self, key: &[u8]) -> Result<Option<&[u8]>>;

    fn features(&self) -> Features;

    fn universal_pdg_code(&self) -> Option<i32>;

    fn universal_weight(&self) -> Option<f64>;

    /// Reads the next record in file order, `Ok(None)` once exhausted.
    fn read_record(&mut self) -> Result<Option<Self::Record>>;

    /// Releases the underlying handle.
    fn close(self);
}

/// An output file under construction.
///
/// Header setters are only valid before the first [`append`](Self::append).
/// Exactly one of [`close`](Self::close), [`close_and_gzip`](Self::close_and_gzip)
/// or [`abandon`](Self::abandon) finishes the output.
pub trait ParticleOutput {
    type Record: ParticleRecord;

    fn set_source_name(&mut self, name: &[u8]) -> Result<()>;

    fn add_comment(&mut self, comment: &[u8]) -> Result<()>;

    fn add_blob(&mut self, key: &[u8], data: &[u8]) -> Result<()>;

    /// Enables every feature set in `features`; unset ones are left alone.
    fn enable_features(&mut self, features: Features) -> Result<()>;

    fn set_universal_pdg_code(&mut self, code: i32) -> Result<()>;

    fn set_universal_weight(&mut self, weight: f64) -> Result<()>;

    fn append(&mut self, record: &Self::Record) -> Result<()>;

    /// Finishes the file and returns its path.
    fn close(self) -> Result<PathBuf>;

    /// Finishes the file, compresses it in place, and returns the compressed
    /// file's path. On failure the uncompressed file stays on disk.
    fn close_and_gzip(self) -> Result<PathBuf>;

    /// Releases the handle and removes whatever was written.
    fn abandon(self) -> Result<()>;
}

/// Factory for input and output handles of one file format.
pub trait ParticleStore {
    /// File name suffix of the format, including the leading dot.
    const EXTENSION: &'static str;

    type Record: ParticleRecord;
    type Input: ParticleInput<Record = Self::Record>;
    type Output: ParticleOutput<Record = Self::Record>;

    fn open_input(&self, path: &Path) -> Result<Self::Input>;

    fn create_output(&self, path: &Path) -> Result<Self::Output>;
}
