//! Formant extraction entry points
//!
//! A [`FormantExtractor`] owns the provisioned analysis script and the Praat
//! command. Memoization is opt-in per call: pass `Some(&mut cache)` to reuse
//! and populate a [`FormantCache`], or `None` to always run Praat.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, debug_span};

use crate::cache::{CacheKey, FormantCache};
use crate::params::FormantParams;
use crate::praat::PraatCommand;
use crate::script::AnalysisScript;
use crate::table::{FormantTable, NUM_FORMANTS};
use crate::Result;

/// Runs Praat's formant analysis on audio files
#[derive(Debug)]
pub struct FormantExtractor {
    command: PraatCommand,
    script: AnalysisScript,
}

impl FormantExtractor {
    /// Extractor using `$PRAAT_BIN` (or `praat`) with the script in the system temp directory
    pub fn new() -> Result<Self> {
        Self::with_command(PraatCommand::from_env())
    }

    pub fn with_command(command: PraatCommand) -> Result<Self> {
        Ok(Self {
            command,
            script: AnalysisScript::provision()?,
        })
    }

    /// Like [`with_command`](Self::with_command), writing the script into `dir`
    pub fn with_command_in<P: AsRef<Path>>(command: PraatCommand, dir: P) -> Result<Self> {
        Ok(Self {
            command,
            script: AnalysisScript::provision_in(dir)?,
        })
    }

    pub fn command(&self) -> &PraatCommand {
        &self.command
    }

    pub fn script_path(&self) -> &Path {
        self.script.path()
    }

    /// Extract the full formant table of `filename`
    ///
    /// The returned table is laid out as rows of `[time, f1, f2, f3]`, with
    /// NaN for formants Praat reports as undefined.
    ///
    /// # Arguments
    /// * `filename` - Audio file Praat can read
    /// * `params` - Formant ceiling, window length and pre-emphasis
    /// * `cache` - `Some` to memoize: a cached table is returned as the same
    ///   `Arc` without running Praat. `None` always runs Praat and leaves
    ///   every cache untouched.
    ///
    /// # Errors
    /// Invalid parameters, failure to launch Praat, a nonzero Praat exit
    /// status, or malformed output.
    pub fn extract<P: AsRef<Path>>(
        &self,
        filename: P,
        params: &FormantParams,
        cache: Option<&mut FormantCache>,
    ) -> Result<Arc<FormantTable>> {
        let filename = filename.as_ref();
        params.validate()?;

        let Some(cache) = cache else {
            return self.run(filename, params).map(Arc::new);
        };

        let key = CacheKey::new(filename, params);
        if let Some(table) = cache.get(&key) {
            debug!(file = %filename.display(), "Formant cache hit");
            return Ok(table);
        }

        debug!(file = %filename.display(), "Formant cache miss");
        let table = Arc::new(self.run(filename, params)?);
        cache.insert(key, Arc::clone(&table));
        Ok(table)
    }

    /// Formants (F1, F2, F3) at the first frame at or after `time`
    ///
    /// See [`FormantTable::formants_at_time`] for lookup semantics.
    pub fn formants_at_time<P: AsRef<Path>>(
        &self,
        filename: P,
        time: f64,
        params: &FormantParams,
        cache: Option<&mut FormantCache>,
    ) -> Result<[f64; NUM_FORMANTS]> {
        let filename = filename.as_ref();
        let table = self.extract(filename, params, cache)?;

        let _span = debug_span!("formants_at_time", file = %filename.display()).entered();
        table.formants_at_time(time)
    }

    /// Frames between `start` and `end` inclusive, with the time column
    ///
    /// See [`FormantTable::formants_at_interval`] for boundary semantics.
    pub fn formants_at_interval<P: AsRef<Path>>(
        &self,
        filename: P,
        start: f64,
        end: f64,
        params: &FormantParams,
        cache: Option<&mut FormantCache>,
    ) -> Result<FormantTable> {
        let filename = filename.as_ref();
        let table = self.extract(filename, params, cache)?;

        let _span = debug_span!("formants_at_interval", file = %filename.display()).entered();
        let rows = table.formants_at_interval(start, end)?;
        Ok(FormantTable::from_sorted_rows(rows.to_vec()))
    }

    fn run(&self, filename: &Path, params: &FormantParams) -> Result<FormantTable> {
        let stdout = self.command.run(self.script.path(), filename, params)?;
        FormantTable::parse(&stdout)
    }
}
