//! The merge orchestrator.
//!
//! ```text
//! create output ──► open inputs ──► aggregate counts ──► transfer metadata
//!      │                                  │                     │
//!      │ bad extension / create fails     │ zero / overflow     │ write fails
//!      ▼                                  ▼                     ▼
//!   Aborted ◄──────────────────────── release inputs, abandon output
//!
//! stream input 1 ─► close ─► stream input 2 ─► close ─► ... ─► finalize
//! ```
//!
//! Each input is released exactly once: closed right after its records are
//! streamed, or closed on an abort path. The output is finalized or abandoned
//! exactly once.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::acquire::{create_output, open_inputs, OutputFile};
use crate::aggregate::{aggregate, release, Aggregation, InputFile};
use crate::metadata::{transfer_metadata, TransferReport};
use crate::store::{ParticleInput, ParticleOutput, ParticleRecord, ParticleStore};
use crate::MergeError;

/// Outcome of a successful merge.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeSummary {
    /// Final path of the merged file (with `.gz` if it was compressed).
    pub output: PathBuf,
    pub inputs_merged: usize,
    /// Inputs that could not be opened and were left out.
    pub unopened: usize,
    /// Summed particle count stored in the output header.
    pub total_count: u64,
    pub particles_written: u64,
    pub metadata: TransferReport,
}

impl MergeSummary {
    /// `0` if every input was merged, otherwise the number of inputs that
    /// could not be opened.
    #[must_use]
    pub fn status_code(&self) -> i32 {
        i32::try_from(self.unopened).unwrap_or(i32::MAX)
    }
}

/// Integer status of a merge result; see [`MergeError::status_code`] for the
/// failure codes.
#[must_use]
pub fn status_code(result: &Result<MergeSummary, MergeError>) -> i32 {
    match result {
        Ok(summary) => summary.status_code(),
        Err(e) => e.status_code(),
    }
}

/// Merges `inputs` into a new file at `output`, renormalizing weights.
///
/// Every record of input `i` is copied with its weight multiplied by
/// `count_i / total`, where `count_i` is the particle count stored in that
/// input's header and `total` their sum. Records keep their input order, and
/// the header of the first opened input is carried over. An `output` ending in
/// `<EXTENSION>.gz` is compressed once complete.
///
/// Inputs that cannot be opened are skipped and reported through
/// [`MergeSummary::unopened`].
///
/// # Errors
///
/// See [`MergeError`]. On every error after the output was created, the
/// partial output is removed, except for a failed compression which leaves
/// the finished uncompressed file in place.
pub fn merge<S, P>(
    store: &S,
    output: impl AsRef<Path>,
    inputs: &[P],
) -> Result<MergeSummary, MergeError>
where
    S: ParticleStore,
    P: AsRef<Path>,
{
    if inputs.is_empty() {
        return Err(MergeError::NoInputs);
    }

    let mut output = create_output(store, output.as_ref())?;
    let (opened, unopened) = open_inputs(store, inputs);

    let Aggregation { inputs, total } = match aggregate(opened, unopened) {
        Ok(aggregation) => aggregation,
        Err(e) => return Err(abort(output, e)),
    };
    info!(inputs = inputs.len(), unopened, total, "particle counts aggregated");

    // aggregate never succeeds without inputs
    let metadata = match transfer_metadata(
        &inputs[0].handle,
        &inputs[0].path,
        &mut output.handle,
        total,
    ) {
        Ok(report) => report,
        Err(source) => {
            let err = MergeError::Write {
                path: output.path.clone(),
                source,
            };
            release(inputs.into_iter().map(|input| input.handle));
            return Err(abort(output, err));
        }
    };

    let inputs_merged = inputs.len();
    let mut particles_written = 0u64;
    let mut pending = inputs.into_iter();
    while let Some(input) = pending.next() {
        match stream_input::<S>(input, &mut output.handle, &output.path) {
            Ok(written) => particles_written += written,
            Err(e) => {
                release(pending.map(|input| input.handle));
                return Err(abort(output, e));
            }
        }
    }

    let output = finalize(output)?;
    info!(
        output = %output.display(),
        particles = particles_written,
        total,
        "merge complete"
    );

    Ok(MergeSummary {
        output,
        inputs_merged,
        unopened,
        total_count: total,
        particles_written,
        metadata,
    })
}

/// Copies every record of `input` to `output` with its weight scaled, then
/// closes `input`. Returns the number of records copied.
fn stream_input<S: ParticleStore>(
    input: InputFile<S::Input>,
    output: &mut S::Output,
    output_path: &Path,
) -> Result<u64, MergeError> {
    let InputFile {
        path,
        mut handle,
        count,
        factor,
    } = input;

    let mut written = 0u64;
    let result = loop {
        let mut record = match handle.read_record() {
            Ok(Some(record)) => record,
            Ok(None) => break Ok(written),
            Err(source) => {
                break Err(MergeError::Read {
                    path: path.clone(),
                    source,
                })
            }
        };
        record.set_weight(record.weight() * factor);
        if let Err(source) = output.append(&record) {
            break Err(MergeError::Write {
                path: output_path.to_path_buf(),
                source,
            });
        }
        written += 1;
    };
    handle.close();

    if let Ok(records) = result {
        debug!(path = %path.display(), count, factor, records, "input merged");
    }
    result
}

/// Closes the output, compressing it if requested.
fn finalize<O: ParticleOutput>(output: OutputFile<O>) -> Result<PathBuf, MergeError> {
    let OutputFile { path, handle, gzip } = output;
    if gzip {
        handle.close_and_gzip().map_err(|source| {
            warn!(path = %path.display(), "compression failed, uncompressed output left in place");
            MergeError::Finalize {
                path,
                compressed: true,
                source,
            }
        })
    } else {
        handle.close().map_err(|source| MergeError::Finalize {
            path,
            compressed: false,
            source,
        })
    }
}

/// Removes the partial output and hands `err` back.
fn abort<O: ParticleOutput>(output: OutputFile<O>, err: MergeError) -> MergeError {
    let OutputFile { path, handle, .. } = output;
    if let Err(e) = handle.abandon() {
        warn!(path = %path.display(), error = %e, "could not remove partial output");
    }
    err
}
