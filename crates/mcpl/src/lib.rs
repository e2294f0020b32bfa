//! # MCPL - Monte Carlo Particle Lists
//!
//! Reader and writer for MCPL particle files, the container the combine tool
//! reads its inputs from and writes its merged output to.
//!
//! An MCPL file is a header followed by a flat array of fixed-size particle
//! records. The header declares the byte order, the record layout (which
//! optional fields are present and whether floating point values are stored in
//! single or double precision) and carries free-form metadata: a source name,
//! comments, and named binary blobs.
//!
//! ## File layout (format version 3)
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ HEADER                                                        │
//! │                                                               │
//! │ "MCPL" | "003" | endianness ('L' or 'B')                      │
//! │ nparticles (u64)                                              │
//! │ ncomments (u32) | nblobs (u32) | userflags (u32)              │
//! │ polarisation (u32) | singleprec (u32) | univ. pdgcode (i32)   │
//! │ particle_size (u32) | univ. weight flag (u32)                 │
//! │ [universal weight (f64)]                                      │
//! │ srcname | comments... | blob keys... | blob data...           │
//! │ (each: len (u32) | bytes)                                     │
//! ├───────────────────────────────────────────────────────────────┤
//! │ PARTICLES (nparticles records of particle_size bytes)          │
//! │                                                               │
//! │ [polarisation x3] | position x3 | ekindir x3 | time           │
//! │ [weight] | [pdgcode (i32)] | [userflags (u32)]                 │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! All numbers use the byte order declared in the header. Floating point
//! fields are `f32` when `singleprec` is set and `f64` otherwise. Fields in
//! brackets are only present when the header enables them; a universal weight
//! or pdg code replaces the per-record field.
//!
//! Files may be gzip-compressed as a whole. [`McplReader`] detects this from
//! the gzip magic bytes, and [`McplWriter::close_and_gzip`] compresses the
//! finished file in place.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mcpl::{McplReader, McplWriter, Particle};
//!
//! let mut w = McplWriter::create("out.mcpl").unwrap();
//! w.set_source_name("example").unwrap();
//! w.add_particle(&Particle { weight: 1.0, pdg_code: 2112, ..Particle::default() }).unwrap();
//! w.close().unwrap();
//!
//! let mut r = McplReader::open("out.mcpl").unwrap();
//! while let Some(p) = r.read_particle().unwrap() {
//!     println!("{:?}", p);
//! }
//! ```

mod format;
mod gzip;
mod particle;
mod reader;
mod writer;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use format::{Endian, Header, Layout, FORMAT_VERSION, MAGIC, PARTICLE_COUNT_OFFSET};
pub use gzip::{compress_in_place, gzip_path};
pub use particle::Particle;
pub use reader::McplReader;
pub use writer::McplWriter;

/// Errors that can occur while reading or writing MCPL files.
#[derive(Debug, Error)]
pub enum McplError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The file does not start with the `MCPL` magic.
    #[error("not an MCPL file (bad magic)")]
    BadMagic,

    /// The header declares a format version this crate cannot read.
    #[error("unsupported MCPL format version {0}")]
    UnsupportedVersion(u32),

    /// The header is structurally invalid.
    #[error("corrupt header: {0}")]
    Corrupt(String),

    /// The file ended before all declared particles were read.
    #[error("file truncated: {missing} particle(s) missing")]
    Truncated { missing: u64 },

    /// A header edit was attempted after the first particle was written.
    #[error("header is frozen once particles have been written")]
    HeaderFrozen,

    /// A blob with this key was already added to the output header.
    #[error("duplicate blob key {0:?}")]
    DuplicateBlobKey(String),

    /// A writer option was given an unusable value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A particle's weight differs from the file's universal weight.
    #[error("particle weight {weight} differs from universal weight {universal}")]
    WeightNotUniversal { weight: f64, universal: f64 },

    /// A particle's pdg code differs from the file's universal pdg code.
    #[error("particle pdg code {pdg_code} differs from universal pdg code {universal}")]
    PdgNotUniversal { pdg_code: i32, universal: i32 },

    /// A header text field is not valid UTF-8.
    #[error("header text is not valid UTF-8")]
    InvalidText,

    /// Compressing a closed file failed; the uncompressed file is kept.
    #[error("failed to gzip {}: {source}", .path.display())]
    Compress {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
