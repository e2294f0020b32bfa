//! # Renormalize - weight-preserving merge of particle files
//!
//! Combines particle files written by independent simulation runs into one
//! file that looks as if it came from a single run.
//!
//! Every input stores the number of particles its run injected under a
//! reserved header key (see [`count`]). The merged file stores the sum of
//! those counts, and every record copied from input `i` has its weight
//! multiplied by `count_i / total`. Summing weights over the merged file then
//! gives the count-weighted average of the per-input sums, which is what one
//! long run would have produced.
//!
//! ## Architecture
//!
//! ```text
//! merge(store, output, inputs)
//!   |
//!   v
//! ┌─────────────────────────────────────────────────────────┐
//! │ acquire.rs   create output (.mcpl / .mcpl.gz)           │
//! │              open inputs, skip failures                 │
//! │                     |                                   │
//! │ aggregate.rs read counts (count.rs), sum, factors       │
//! │                     |                                   │
//! │ metadata.rs  first input's header → output, store total │
//! │                     |                                   │
//! │ merge.rs     stream records, scale weights, close each  │
//! │              finalize (close or close + gzip)           │
//! └─────────────────────────────────────────────────────────┘
//!   |
//!   v
//! ParticleStore (store.rs) ── McplStore (mcpl_store.rs) ── mcpl crate
//! ```
//!
//! The engine only talks to files through the [`ParticleStore`] family of
//! traits; [`McplStore`] is the implementation used by the command line tool.
//!
//! ## Status codes
//!
//! [`status_code`] maps a merge result onto the integer contract shared with
//! other tools: `0` for a complete merge, `N > 0` when `N` inputs could not
//! be opened, and negative values for failures (see
//! [`MergeError::status_code`]).
//!
//! ## Example
//!
//! ```rust,no_run
//! let summary = renormalize::merge_files("combined.mcpl.gz", &["run1.mcpl", "run2.mcpl"])?;
//! println!("{} particles from {} files", summary.particles_written, summary.inputs_merged);
//! # Ok::<(), renormalize::MergeError>(())
//! ```

mod acquire;
mod aggregate;
pub mod count;
mod error;
mod mcpl_store;
mod merge;
mod metadata;
mod store;

use std::path::Path;

pub use acquire::split_output_path;
pub use count::{count_key, decode_count, encode_count, encode_count_into, CountLengthError, COUNT_KEY};
pub use error::MergeError;
pub use mcpl_store::McplStore;
pub use merge::{merge, status_code, MergeSummary};
pub use metadata::TransferReport;
pub use store::{Features, ParticleInput, ParticleOutput, ParticleRecord, ParticleStore};

/// Merges MCPL `inputs` into `output`.
///
/// Shorthand for [`merge`] with [`McplStore`].
pub fn merge_files<P: AsRef<Path>>(
    output: impl AsRef<Path>,
    inputs: &[P],
) -> Result<MergeSummary, MergeError> {
    merge(&McplStore, output, inputs)
}

#[cfg(test)]
mod tests;
