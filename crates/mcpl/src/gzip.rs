//! Whole-file gzip compression of finished MCPL files.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::McplError;

/// First two bytes of every gzip stream.
pub(crate) const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Returns `path` with `.gz` appended to its file name.
#[must_use]
pub fn gzip_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".gz");
    PathBuf::from(name)
}

/// Compresses the file at `path` into `<path>.gz` and removes the original.
///
/// On failure the partially written `.gz` file is removed and the original
/// file is left untouched.
///
/// # Errors
///
/// Returns [`McplError::Compress`] if compression fails, or
/// [`McplError::Io`] if the original cannot be removed afterwards.
pub fn compress_in_place(path: &Path) -> Result<PathBuf, McplError> {
    let gz = gzip_path(path);
    if let Err(source) = write_gzip(path, &gz) {
        let _ = fs::remove_file(&gz);
        return Err(McplError::Compress {
            path: path.to_path_buf(),
            source,
        });
    }
    fs::remove_file(path)?;
    Ok(gz)
}

fn write_gzip(src: &Path, dst: &Path) -> io::Result<()> {
    let mut input = BufReader::new(File::open(src)?);
    let out = BufWriter::new(File::create(dst)?);
    let mut encoder = GzEncoder::new(out, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    let mut out = encoder.finish()?;
    out.flush()?;
    out.into_inner().map_err(io::Error::from)?.sync_all()
}
