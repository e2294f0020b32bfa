//! Output creation and best-effort input opening.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::store::ParticleStore;
use crate::MergeError;

const GZIP_SUFFIX: &str = ".gz";

/// The merged output while it is being written.
pub(crate) struct OutputFile<O> {
    /// Path of the uncompressed file actually being written.
    pub(crate) path: PathBuf,
    pub(crate) handle: O,
    /// Compress on finalize.
    pub(crate) gzip: bool,
}

/// An input that opened successfully.
pub(crate) struct OpenedInput<I> {
    pub(crate) path: PathBuf,
    pub(crate) handle: I,
}

/// Validates the output path against `extension` and splits off a trailing
/// `.gz`.
///
/// Returns the path of the uncompressed file to create and whether the caller
/// asked for compression. Only the suffix is checked, so `run.1.mcpl` is
/// accepted while `a.mcpl.txt` is not.
pub fn split_output_path(
    path: &Path,
    extension: &'static str,
) -> Result<(PathBuf, bool), MergeError> {
    let bad_extension = || MergeError::BadExtension {
        path: path.to_path_buf(),
        extension,
    };
    // Non UTF-8 paths cannot end in an ASCII extension we recognise.
    let text = path.to_str().ok_or_else(bad_extension)?;

    if let Some(plain) = text.strip_suffix(GZIP_SUFFIX) {
        if plain.ends_with(extension) {
            return Ok((PathBuf::from(plain), true));
        }
    } else if text.ends_with(extension) {
        return Ok((path.to_path_buf(), false));
    }
    Err(bad_extension())
}

/// Validates `path` and creates the output file.
///
/// Nothing is created when the extension is rejected.
pub(crate) fn create_output<S: ParticleStore>(
    store: &S,
    path: &Path,
) -> Result<OutputFile<S::Output>, MergeError> {
    let (plain, gzip) = split_output_path(path, S::EXTENSION)?;
    let handle = store
        .create_output(&plain)
        .map_err(|source| MergeError::CreateOutput {
            path: plain.clone(),
            source,
        })?;
    debug!(path = %plain.display(), gzip, "created output file");
    Ok(OutputFile {
        path: plain,
        handle,
        gzip,
    })
}

/// Opens every path in order, skipping the ones that fail.
///
/// Returns the opened inputs in their original relative order together with
/// the number of paths that could not be opened.
pub(crate) fn open_inputs<S, P>(store: &S, paths: &[P]) -> (Vec<OpenedInput<S::Input>>, usize)
where
    S: ParticleStore,
    P: AsRef<Path>,
{
    let mut opened = Vec::with_capacity(paths.len());
    let mut unopened = 0;

    for path in paths {
        let path = path.as_ref();
        match store.open_input(path) {
            Ok(handle) => {
                debug!(path = %path.display(), "opened input file");
                opened.push(OpenedInput {
                    path: path.to_path_buf(),
                    handle,
                });
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not open input file, skipping it");
                unopened += 1;
            }
        }
    }

    (opened, unopened)
}
