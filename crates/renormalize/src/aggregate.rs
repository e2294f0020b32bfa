//! Count aggregation and per-file weight factors.

use std::path::PathBuf;

use tracing::debug;

use crate::acquire::OpenedInput;
use crate::count::read_count;
use crate::store::ParticleInput;
use crate::MergeError;

/// An opened input with its stored count and the factor its weights are
/// scaled by.
pub(crate) struct InputFile<I> {
    pub(crate) path: PathBuf,
    pub(crate) handle: I,
    pub(crate) count: u64,
    pub(crate) factor: f64,
}

/// Result of aggregation: inputs in their original order plus the summed
/// count. `total` is never zero.
pub(crate) struct Aggregation<I> {
    pub(crate) inputs: Vec<InputFile<I>>,
    pub(crate) total: u64,
}

/// Reads every input's count, sums them, and derives `factor = count / total`
/// for each input.
///
/// On failure every handle is released before returning.
pub(crate) fn aggregate<I: ParticleInput>(
    opened: Vec<OpenedInput<I>>,
    unopened: usize,
) -> Result<Aggregation<I>, MergeError> {
    let counted = opened
        .into_iter()
        .map(|input| {
            let count = read_count(&input.handle, &input.path);
            (input, count)
        })
        .collect::<Vec<_>>();

    let total = counted
        .iter()
        .try_fold(0u64, |sum, (_, count)| sum.checked_add(*count));

    let total = match total {
        Some(total) => total,
        None => {
            release(counted.into_iter().map(|(input, _)| input.handle));
            return Err(MergeError::CountOverflow);
        }
    };

    if total == 0 {
        let opened = counted.len();
        release(counted.into_iter().map(|(input, _)| input.handle));
        return Err(MergeError::ZeroTotalCount { opened, unopened });
    }

    let inputs = counted
        .into_iter()
        .map(|(input, count)| {
            let factor = count as f64 / total as f64;
            debug!(path = %input.path.display(), count, factor, "weight factor");
            InputFile {
                path: input.path,
                handle: input.handle,
                count,
                factor,
            }
        })
        .collect();

    Ok(Aggregation { inputs, total })
}

/// Closes every handle in `handles`.
pub(crate) fn release<I: ParticleInput>(handles: impl IntoIterator<Item = I>) {
    for handle in handles {
        handle.close();
    }
}
