//! Header metadata transfer from the first input to the output.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::count::{write_count, COUNT_KEY};
use crate::store::{Features, ParticleInput, ParticleOutput};

/// What [`transfer_metadata`] copied and skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferReport {
    pub comments_copied: usize,
    pub comments_skipped: usize,
    pub blobs_copied: usize,
    pub blobs_skipped: usize,
}

/// Copies the header of `source` onto `target` and stores `total` under the
/// reserved count key.
///
/// Unreadable comments and blobs are skipped with a warning. A byte order
/// that differs from the platform's is only reported. Fails if `target`
/// refuses any write.
pub(crate) fn transfer_metadata<I, O>(
    source: &I,
    source_path: &Path,
    target: &mut O,
    total: u64,
) -> Result<TransferReport>
where
    I: ParticleInput,
    O: ParticleOutput,
{
    let mut report = TransferReport::default();

    if source.is_little_endian() != cfg!(target_endian = "little") {
        warn!(
            path = %source_path.display(),
            "input byte order differs from this platform, header values are copied as stored"
        );
    }

    match source.source_name() {
        Ok(name) => target
            .set_source_name(name)
            .context("failed to set source name")?,
        Err(e) => warn!(path = %source_path.display(), error = %e, "could not read source name"),
    }

    for index in 0..source.comment_count() {
        match source.comment(index) {
            Ok(comment) => {
                target
                    .add_comment(comment)
                    .with_context(|| format!("failed to add comment {index}"))?;
                report.comments_copied += 1;
            }
            Err(e) => {
                warn!(path = %source_path.display(), index, error = %e, "skipping unreadable comment");
                report.comments_skipped += 1;
            }
        }
    }

    for key in source.blob_keys() {
        if key == COUNT_KEY.as_bytes() {
            continue;
        }
        let shown = String::from_utf8_lossy(key);
        match source.blob(key) {
            Ok(Some(data)) => {
                target
                    .add_blob(key, data)
                    .with_context(|| format!("failed to add blob {shown:?}"))?;
                report.blobs_copied += 1;
            }
            Ok(None) => {
                warn!(path = %source_path.display(), key = %shown, "listed blob is missing, skipping it");
                report.blobs_skipped += 1;
            }
            Err(e) => {
                warn!(path = %source_path.display(), key = %shown, error = %e, "skipping unreadable blob");
                report.blobs_skipped += 1;
            }
        }
    }

    let features = source.features();
    if features != Features::default() {
        target
            .enable_features(features)
            .context("failed to enable record features")?;
    }
    if let Some(code) = source.universal_pdg_code() {
        target
            .set_universal_pdg_code(code)
            .context("failed to set universal pdg code")?;
    }
    if let Some(weight) = source.universal_weight() {
        target
            .set_universal_weight(weight)
            .context("failed to set universal weight")?;
    }

    write_count(target, total)?;

    debug!(
        comments = report.comments_copied,
        blobs = report.blobs_copied,
        total,
        "header metadata transferred"
    );
    Ok(report)
}
