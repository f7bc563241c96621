//! Output path derivation and collision detection.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::converter::TargetFormat;

use super::error::JobError;

/// Derives the output path for `input`: its stem plus the format extension,
/// placed directly in `output_dir`.
///
/// The mapping is a pure function of its arguments, so identical runs always
/// produce identically named outputs.
pub fn derive_output_path(input: &Path, output_dir: &Path, format: TargetFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("output"));
    let mut name = stem;
    name.push(".");
    name.push(format.extension());
    output_dir.join(name)
}

/// Tracks which input owns each output path within one run.
///
/// Claims are made in dispatch order: the first job to claim a path keeps
/// it, every later job mapping onto the same path fails.
#[derive(Debug, Default)]
pub(crate) struct OutputClaims {
    /// Output path -> input that produces it.
    claimed: HashMap<PathBuf, PathBuf>,
    /// Input paths of the run; these are never valid outputs.
    inputs: HashMap<PathBuf, usize>,
}

impl OutputClaims {
    pub(crate) fn new<'a>(inputs: impl IntoIterator<Item = (usize, &'a Path)>) -> Self {
        let mut claims = Self::default();
        for (index, path) in inputs {
            claims.inputs.entry(path.to_path_buf()).or_insert(index);
        }
        claims
    }

    /// Claims `output` for `input` (the job at `index`).
    pub(crate) fn claim(&mut self, index: usize, input: &Path, output: &Path) -> Result<(), JobError> {
        if output == input {
            return Err(JobError::OutputOverwritesInput {
                path: output.to_path_buf(),
            });
        }

        // Writing over another job's input would corrupt that job.
        if let Some(&owner) = self.inputs.get(output) {
            if owner != index {
                return Err(JobError::OutputNamingCollision {
                    output_path: output.to_path_buf(),
                    claimed_by: output.to_path_buf(),
                });
            }
        }

        if let Some(owner) = self.claimed.get(output) {
            return Err(JobError::OutputNamingCollision {
                output_path: output.to_path_buf(),
                claimed_by: owner.clone(),
            });
        }

        self.claimed.insert(output.to_path_buf(), input.to_path_buf());
        Ok(())
    }
}
