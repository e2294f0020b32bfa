//! Particle count codec.
//!
//! Every file produced by the simulation stores the number of particles the
//! run injected (not the number of records it contains) as an 8-byte blob
//! under [`COUNT_KEY`]. The merge needs these counts to renormalize weights,
//! and writes the summed count back under the same key.
//!
//! ## Byte layout
//!
//! ```text
//! byte:   0     1     2     3     4     5     6     7
//!       ┌─────┬─────┬─────┬─────┬─────┬─────┬─────┬─────┐
//!       │ b0  │ b7  │ b6  │ b5  │ b4  │ b3  │ b2  │ b1  │
//!       └─────┴─────┴─────┴─────┴─────┴─────┴─────┴─────┘
//!  bN = (count >> 8*N) & 0xff
//! ```
//!
//! This is the pattern the existing simulation tools write on every
//! mainstream platform, so counts stay interchangeable with them. It equals
//! the big-endian encoding of `count.rotate_right(8)`.

use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::warn;

use crate::store::{ParticleInput, ParticleOutput};

/// Reserved header blob key holding the injected particle count.
pub const COUNT_KEY: &str = "mccode_neutron_count";

/// Size of an encoded count.
pub const COUNT_BYTES: usize = 8;

/// Returns the reserved blob key under which counts are stored.
#[must_use]
pub fn count_key() -> &'static str {
    COUNT_KEY
}

/// A count buffer that is not exactly [`COUNT_BYTES`] long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("particle count buffer must be 8 bytes, got {0}")]
pub struct CountLengthError(pub usize);

/// Encodes `count` into its 8-byte blob form.
#[must_use]
pub fn encode_count(count: u64) -> [u8; COUNT_BYTES] {
    count.rotate_right(8).to_be_bytes()
}

/// Encodes `count` into `buf`, which must be exactly [`COUNT_BYTES`] long.
/// On error `buf` is left untouched.
pub fn encode_count_into(count: u64, buf: &mut [u8]) -> Result<(), CountLengthError> {
    if buf.len() != COUNT_BYTES {
        return Err(CountLengthError(buf.len()));
    }
    buf.copy_from_slice(&encode_count(count));
    Ok(())
}

/// Decodes a count blob. Any length other than [`COUNT_BYTES`] is rejected.
pub fn decode_count(buf: &[u8]) -> Result<u64, CountLengthError> {
    let bytes: [u8; COUNT_BYTES] = buf.try_into().map_err(|_| CountLengthError(buf.len()))?;
    Ok(u64::from_be_bytes(bytes).rotate_left(8))
}

/// Reads the stored count of `input`.
///
/// A missing, unreadable or malformed count blob is not fatal: it is logged
/// and the file counts as zero.
pub(crate) fn read_count<I: ParticleInput>(input: &I, path: &Path) -> u64 {
    let blob = match input.blob(COUNT_KEY.as_bytes()) {
        Ok(Some(blob)) => blob,
        Ok(None) => {
            warn!(
                path = %path.display(),
                "no {COUNT_KEY} blob found, its particles get zero weight"
            );
            return 0;
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "could not read {COUNT_KEY} blob, its particles get zero weight"
            );
            return 0;
        }
    };

    match decode_count(blob) {
        Ok(count) => count,
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "malformed {COUNT_KEY} blob, its particles get zero weight"
            );
            0
        }
    }
}

/// Stores `total` under the reserved key of `output`.
pub(crate) fn write_count<O: ParticleOutput>(output: &mut O, total: u64) -> Result<()> {
    output
        .add_blob(COUNT_KEY.as_bytes(), &encode_count(total))
        .context("failed to store merged particle count")
}
