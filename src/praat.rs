//! Running the Praat executable
//!
//! Praat is invoked directly (no shell) as
//! `praat [prefix args...] <script> <filename> <maxformant> <winlen> <preemph>`.
//! The call blocks until Praat exits; there is no timeout and no retry.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::params::FormantParams;
use crate::{PraatError, Result};

/// Default Praat executable name, resolved through `PATH`
pub const DEFAULT_PRAAT_PROGRAM: &str = "praat";

/// Environment variable overriding the Praat executable
pub const PRAAT_BIN_ENV: &str = "PRAAT_BIN";

/// How to launch Praat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PraatCommand {
    program: OsString,
    prefix_args: Vec<OsString>,
}

impl Default for PraatCommand {
    fn default() -> Self {
        Self::new(DEFAULT_PRAAT_PROGRAM)
    }
}

impl PraatCommand {
    pub fn new<S: Into<OsString>>(program: S) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
        }
    }

    /// Use `$PRAAT_BIN` when set and non-empty, otherwise `praat`
    pub fn from_env() -> Self {
        match std::env::var_os(PRAAT_BIN_ENV) {
            Some(program) if !program.is_empty() => Self::new(program),
            _ => Self::default(),
        }
    }

    /// Arguments placed before the script path, e.g. `--run` for Praat 6
    pub fn with_prefix_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.prefix_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &OsString {
        &self.program
    }

    pub fn prefix_args(&self) -> &[OsString] {
        &self.prefix_args
    }

    /// Full argument list after the program name
    pub(crate) fn args(&self, script: &Path, filename: &Path, params: &FormantParams) -> Vec<OsString> {
        let mut args = self.prefix_args.clone();
        args.push(script.as_os_str().to_owned());
        args.push(filename.as_os_str().to_owned());
        args.extend(params.to_args().into_iter().map(OsString::from));
        args
    }

    /// Run the analysis script on `filename` and return Praat's standard output
    ///
    /// # Errors
    /// - [`PraatError::Launch`] if the program cannot be started
    /// - [`PraatError::ExternalTool`] if it exits unsuccessfully; the message
    ///   is whatever Praat wrote to standard error
    pub fn run(&self, script: &Path, filename: &Path, params: &FormantParams) -> Result<String> {
        let program = self.program.to_string_lossy().into_owned();

        debug!(
            program = %program,
            file = %filename.display(),
            max_formant = params.max_formant,
            window_length = params.window_length,
            pre_emphasis = params.pre_emphasis,
            "Running Praat formant analysis"
        );

        let output = Command::new(&self.program)
            .args(self.args(script, filename, params))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| PraatError::Launch { program, source })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(PraatError::ExternalTool {
                code: output.status.code(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_order() {
        let cmd = PraatCommand::default();
        let args = cmd.args(
            Path::new("/tmp/formants.praat"),
            Path::new("speech.wav"),
            &FormantParams::default(),
        );
        assert_eq!(
            args,
            ["/tmp/formants.praat", "speech.wav", "5500", "0.025", "50"]
                .iter()
                .map(OsString::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_prefix_args_come_first() {
        let cmd = PraatCommand::new("/opt/praat/praat").with_prefix_args(["--run"]);
        let args = cmd.args(Path::new("s.praat"), Path::new("a.wav"), &FormantParams::male());
        assert_eq!(args[0], "--run");
        assert_eq!(args[1], "s.praat");
        assert_eq!(args[3], "5000");
        assert_eq!(cmd.program(), "/opt/praat/praat");
    }

    #[test]
    fn test_missing_program_is_launch_error() {
        let cmd = PraatCommand::new("praat-formants-no-such-binary");
        let result = cmd.run(Path::new("s.praat"), Path::new("a.wav"), &FormantParams::default());
        match result {
            Err(PraatError::Launch { program, .. }) => {
                assert_eq!(program, "praat-formants-no-such-binary")
            }
            other => panic!("expected launch error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_carries_stderr() {
        // `sh <script> ...` runs a script file; a missing one makes sh fail with a message on stderr
        let cmd = PraatCommand::new("sh");
        let result = cmd.run(
            Path::new("/definitely/missing/script.praat"),
            Path::new("a.wav"),
            &FormantParams::default(),
        );
        match result {
            Err(PraatError::ExternalTool { code, stderr }) => {
                assert_ne!(code, Some(0));
                assert!(!stderr.is_empty());
            }
            other => panic!("expected external tool error, got {:?}", other),
        }
    }
}
