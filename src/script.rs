//! The Praat script that performs the formant analysis
//!
//! The script is written to disk once per [`FormantExtractor`](crate::FormantExtractor)
//! and reused for every invocation. It is never templated: the audio file and
//! analysis parameters arrive as positional command-line arguments, in the
//! order the `form` block declares them.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::debug;

use crate::{PraatError, Result};

/// File suffix Praat expects for scripts
pub const SCRIPT_SUFFIX: &str = ".praat";

/// Fixed analysis script: Burg formants with a 0.01 s step and 5 formants,
/// listed with time (6 decimals) and frequencies (3 decimals), no frame
/// numbers, no intensity, no bandwidths, header included.
pub const FORMANT_SCRIPT: &str = "form File
sentence filename
positive maxformant 5500
real winlen 0.025
positive preemph 50
endform
Read from file... 'filename$'
To Formant (burg)... 0.01 5 'maxformant' 'winlen' 'preemph'
List... no yes 6 no 3 no 3 no
exit
";

/// An analysis script materialized in a temporary file
///
/// The file is deleted when this value is dropped.
#[derive(Debug)]
pub struct AnalysisScript {
    path: TempPath,
}

impl AnalysisScript {
    /// Write the script into the system temporary directory
    pub fn provision() -> Result<Self> {
        Self::provision_in(std::env::temp_dir())
    }

    /// Write the script into `dir`
    pub fn provision_in<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("formants_")
            .suffix(SCRIPT_SUFFIX)
            .tempfile_in(dir)?;
        file.write_all(FORMANT_SCRIPT.as_bytes())?;
        file.flush()?;

        // Close the handle so Praat can open the file on every platform
        let path = file.into_temp_path();
        debug!(path = %path.display(), "Provisioned formant analysis script");

        Ok(Self { path })
    }

    /// Location of the script on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the script on disk after this value is dropped
    pub fn keep(self) -> Result<PathBuf> {
        self.path
            .keep()
            .map_err(|e| PraatError::Io(e.error))
    }
}
