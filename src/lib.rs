//! praat-formants: formant tables from Praat, cached and queryable
//!
//! This library runs Praat's Burg formant analysis on an audio file as an
//! external process and turns its tab-separated listing into a
//! [`FormantTable`]. Tables can be memoized in a caller-owned
//! [`FormantCache`] and queried at a time point or over an interval.
//!
//! # Core Types
//!
//! - [`FormantExtractor`] - Provisions the analysis script and runs Praat
//! - [`FormantParams`] - Formant ceiling, window length and pre-emphasis
//! - [`FormantTable`] - Rows of `(time, F1, F2, F3)`, NaN where undefined
//! - [`FormantCache`] - Memoized tables keyed by file and parameters
//! - [`PraatCommand`] - Which Praat binary to run and how
//!
//! # Example
//! ```no_run
//! use praat_formants::{FormantCache, FormantExtractor, FormantParams};
//!
//! let extractor = FormantExtractor::new()?;
//! let mut cache = FormantCache::new();
//! let params = FormantParams::male();
//!
//! let [f1, f2, f3] = extractor.formants_at_time("vowel.wav", 0.25, &params, Some(&mut cache))?;
//! println!("F1={f1} F2={f2} F3={f3}");
//! # Ok::<(), praat_formants::PraatError>(())
//! ```

pub mod cache;
pub mod extractor;
pub mod params;
pub mod praat;
pub mod script;
pub mod table;

// Re-export main types at crate root
pub use cache::{CacheKey, FormantCache};
pub use extractor::FormantExtractor;
pub use params::FormantParams;
pub use praat::PraatCommand;
pub use script::AnalysisScript;
pub use table::{FormantRow, FormantTable};

use thiserror::Error;

/// Errors that can occur while extracting or querying formants
#[derive(Error, Debug)]
pub enum PraatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Praat failed (exit code {code:?}): {stderr}")]
    ExternalTool { code: Option<i32>, stderr: String },

    #[error("Malformed Praat output at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("time out of range for file length: {0}")]
    OutOfRange(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, PraatError>;

/// Message of the warning emitted when a query returns an undefined formant
pub const UNDEFINED_FORMANT_WARNING: &str = "undefined formant found";
