use std::path::PathBuf;

use thiserror::Error;

/// Reasons a merge fails.
///
/// Each variant maps to a fixed integer through [`MergeError::status_code`];
/// successful merges report through
/// [`MergeSummary::status_code`](crate::MergeSummary::status_code).
#[derive(Debug, Error)]
pub enum MergeError {
    /// The input list was empty.
    #[error("no input files given")]
    NoInputs,

    /// The output path does not carry a supported extension.
    #[error("output file {} must end in {extension} or {extension}.gz", .path.display())]
    BadExtension { path: PathBuf, extension: &'static str },

    /// The output file could not be created.
    #[error("could not create output file {}: {source:#}", .path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// Every opened input has a stored particle count of zero, so no weight
    /// can be renormalized. `unopened` inputs could not be opened at all.
    #[error("total particle count of the {opened} opened input file(s) is zero")]
    ZeroTotalCount { opened: usize, unopened: usize },

    /// The summed particle count does not fit in 64 bits.
    #[error("total particle count overflows 64 bits")]
    CountOverflow,

    /// Reading header metadata or records from an input failed.
    #[error("failed reading {}: {source:#}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// Writing header metadata or records to the output failed.
    #[error("failed writing {}: {source:#}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// Closing or compressing the output failed. When `compressed` was
    /// requested the uncompressed file is left at `path`.
    #[error("failed to finalize {}: {source:#}", .path.display())]
    Finalize {
        path: PathBuf,
        compressed: bool,
        #[source]
        source: anyhow::Error,
    },
}

impl MergeError {
    /// Integer status of a failed merge.
    ///
    /// ```text
    ///  -1        no inputs
    ///  -2        bad output extension, or output could not be created
    ///  -3        read or write failure while merging
    ///  -4        output could not be finalized
    ///  -5        total count overflow
    ///  -10 - M   total count is zero, M inputs could not be opened
    ///            (saturates at -i32::MAX)
    /// ```
    #[must_use]
    pub fn status_code(&self) -> i32 {
        match self {
            MergeError::NoInputs => -1,
            MergeError::BadExtension { .. } | MergeError::CreateOutput { .. } => -2,
            MergeError::Read { .. } | MergeError::Write { .. } => -3,
            MergeError::Finalize { .. } => -4,
            MergeError::CountOverflow => -5,
            MergeError::ZeroTotalCount { unopened, .. } => {
                -i32::try_from(*unopened)
                    .unwrap_or(i32::MAX)
                    .saturating_add(10)
            }
        }
    }
}
