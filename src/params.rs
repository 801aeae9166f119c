//! Analysis parameters passed to Praat's `To Formant (burg)...`
//!
//! The time step (0.01 s), the number of formants (5) and the listing format
//! are fixed by the analysis script. Only the values below vary per call.

use crate::{PraatError, Result};

/// Parameters for one formant analysis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormantParams {
    /// Formant ceiling in Hz (5500 for female speech, 5000 for male)
    pub max_formant: f64,
    /// Analysis window length in seconds
    pub window_length: f64,
    /// Pre-emphasis corner frequency in Hz
    pub pre_emphasis: f64,
}

impl Default for FormantParams {
    fn default() -> Self {
        Self {
            max_formant: 5500.0,
            window_length: 0.025,
            pre_emphasis: 50.0,
        }
    }
}

impl FormantParams {
    /// Defaults with the ceiling conventionally used for female speakers
    pub fn female() -> Self {
        Self::default()
    }

    /// Defaults with the ceiling conventionally used for male speakers
    pub fn male() -> Self {
        Self::default().with_max_formant(5000.0)
    }

    pub fn with_max_formant(mut self, max_formant: f64) -> Self {
        self.max_formant = max_formant;
        self
    }

    pub fn with_window_length(mut self, window_length: f64) -> Self {
        self.window_length = window_length;
        self
    }

    pub fn with_pre_emphasis(mut self, pre_emphasis: f64) -> Self {
        self.pre_emphasis = pre_emphasis;
        self
    }

    /// Reject values Praat's form would refuse or that make no sense as an analysis window
    pub fn validate(&self) -> Result<()> {
        check_positive("max_formant", self.max_formant)?;
        check_positive("window_length", self.window_length)?;
        check_positive("pre_emphasis", self.pre_emphasis)?;
        Ok(())
    }

    /// Positional arguments in the order the script's form declares them
    pub(crate) fn to_args(&self) -> [String; 3] {
        [
            self.max_formant.to_string(),
            self.window_length.to_string(),
            self.pre_emphasis.to_string(),
        ]
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PraatError::InvalidParameter(format!(
            "{} must be a positive finite number, got {}",
            name, value
        )))
    }
}
