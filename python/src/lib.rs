//! Python bindings for praat-formants
//!
//! This module provides Python bindings using PyO3. Formant tables are
//! returned as numpy arrays laid out as `[[time, f1, f2, f3], ...]` with NaN
//! for undefined formants. Undefined formants in a query result raise a
//! `UserWarning` (once per call).

use std::path::PathBuf;
use std::sync::Mutex;

use numpy::{IntoPyArray, PyArray1, PyArray2};
use pyo3::exceptions::{PyRuntimeError, PyUserWarning, PyValueError};
use pyo3::prelude::*;

// Use :: to disambiguate the library from this module
use ::praat_formants::{
    FormantCache, FormantExtractor, FormantParams, FormantTable, PraatCommand, PraatError,
    UNDEFINED_FORMANT_WARNING,
};

/// Extractor plus the cache it memoizes into
struct Session {
    extractor: FormantExtractor,
    cache: FormantCache,
}

impl Session {
    fn new(command: PraatCommand) -> PyResult<Self> {
        Ok(Self {
            extractor: FormantExtractor::with_command(command).map_err(to_py_err)?,
            cache: FormantCache::new(),
        })
    }

    fn file2formants(
        &mut self,
        filename: PathBuf,
        params: &FormantParams,
        memoize_call: bool,
    ) -> PyResult<Vec<Vec<f64>>> {
        let cache = memoize_call.then_some(&mut self.cache);
        let table = self
            .extractor
            .extract(filename, params, cache)
            .map_err(to_py_err)?;
        Ok(table_rows(&table))
    }

    fn formants_at_time(
        &mut self,
        filename: PathBuf,
        time: f64,
        params: &FormantParams,
        memoize_call: bool,
    ) -> PyResult<Vec<f64>> {
        let cache = memoize_call.then_some(&mut self.cache);
        let formants = self
            .extractor
            .formants_at_time(filename, time, params, cache)
            .map_err(to_py_err)?;
        Ok(formants.to_vec())
    }

    fn formants_at_interval(
        &mut self,
        filename: PathBuf,
        start: f64,
        end: f64,
        params: &FormantParams,
        memoize_call: bool,
    ) -> PyResult<Vec<Vec<f64>>> {
        let cache = memoize_call.then_some(&mut self.cache);
        let table = self
            .extractor
            .formants_at_interval(filename, start, end, params, cache)
            .map_err(to_py_err)?;
        Ok(table_rows(&table))
    }
}

/// Default session behind the module-level functions, created on first use
static DEFAULT_SESSION: Mutex<Option<Session>> = Mutex::new(None);

fn with_default_session<T>(f: impl FnOnce(&mut Session) -> PyResult<T>) -> PyResult<T> {
    let mut guard = DEFAULT_SESSION
        .lock()
        .map_err(|_| PyRuntimeError::new_err("default formant extractor is poisoned"))?;
    let mut session = match guard.take() {
        Some(session) => session,
        None => Session::new(PraatCommand::from_env())?,
    };
    let result = f(&mut session);
    *guard = Some(session);
    result
}

/// Python wrapper for FormantExtractor, with its own formant cache
#[pyclass(name = "FormantExtractor")]
pub struct PyFormantExtractor {
    session: Session,
}

#[pymethods]
impl PyFormantExtractor {
    /// Create an extractor
    ///
    /// Parameters
    /// ----------
    /// praat : str, optional
    ///     Praat executable. Defaults to $PRAAT_BIN, then "praat".
    /// prefix_args : list of str, optional
    ///     Arguments placed before the script path, e.g. ["--run"]
    #[new]
    #[pyo3(signature = (praat=None, prefix_args=None))]
    fn new(praat: Option<String>, prefix_args: Option<Vec<String>>) -> PyResult<Self> {
        let mut command = match praat {
            Some(program) => PraatCommand::new(program),
            None => PraatCommand::from_env(),
        };
        if let Some(args) = prefix_args {
            command = command.with_prefix_args(args);
        }
        Ok(Self {
            session: Session::new(command)?,
        })
    }

    /// Extract the formant table of an audio file
    ///
    /// Returns an (n, 4) array of [time, f1, f2, f3] rows.
    #[pyo3(signature = (filename, maxformant=5500.0, winlen=0.025, preemph=50.0, memoize_call=true))]
    fn file2formants<'py>(
        &mut self,
        py: Python<'py>,
        filename: PathBuf,
        maxformant: f64,
        winlen: f64,
        preemph: f64,
        memoize_call: bool,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let params = params(maxformant, winlen, preemph);
        let rows = self.session.file2formants(filename, &params, memoize_call)?;
        rows_to_array(py, &rows)
    }

    /// Formants [f1, f2, f3] at the first frame at or after `time`
    #[pyo3(signature = (filename, time, maxformant=5500.0, winlen=0.025, preemph=50.0, memoize_call=true))]
    #[allow(clippy::too_many_arguments)]
    fn formants_at_time<'py>(
        &mut self,
        py: Python<'py>,
        filename: PathBuf,
        time: f64,
        maxformant: f64,
        winlen: f64,
        preemph: f64,
        memoize_call: bool,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        let params = params(maxformant, winlen, preemph);
        let formants = self.session.formants_at_time(filename, time, &params, memoize_call)?;
        warn_if_undefined(py, formants.iter().any(|f| f.is_nan()))?;
        Ok(formants.into_pyarray_bound(py))
    }

    /// Rows of [time, f1, f2, f3] with start <= time <= end
    #[pyo3(signature = (filename, start, end, maxformant=5500.0, winlen=0.025, preemph=50.0, memoize_call=true))]
    #[allow(clippy::too_many_arguments)]
    fn formants_at_interval<'py>(
        &mut self,
        py: Python<'py>,
        filename: PathBuf,
        start: f64,
        end: f64,
        maxformant: f64,
        winlen: f64,
        preemph: f64,
        memoize_call: bool,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let params = params(maxformant, winlen, preemph);
        let rows = self
            .session
            .formants_at_interval(filename, start, end, &params, memoize_call)?;
        warn_if_undefined(py, rows_have_undefined(&rows))?;
        rows_to_array(py, &rows)
    }

    /// Drop every memoized table
    fn clear_cache(&mut self) {
        self.session.cache.clear();
    }

    /// Number of memoized tables
    #[getter]
    fn cache_size(&self) -> usize {
        self.session.cache.len()
    }

    /// Path of the provisioned Praat script
    #[getter]
    fn script_path(&self) -> PathBuf {
        self.session.extractor.script_path().to_path_buf()
    }
}

/// Extract the formant table of an audio file using the default extractor
///
/// Parameters
/// ----------
/// filename : str
///     Audio file
/// maxformant : float
///     Formant ceiling (5500 for female speech, 5000 for male)
/// winlen : float
///     Window length in seconds
/// preemph : float
///     Pre-emphasis in Hz
/// memoize_call : bool
///     Memoize the call. Use `clear_formant_cache()` to reset.
#[pyfunction]
#[pyo3(signature = (filename, maxformant=5500.0, winlen=0.025, preemph=50.0, memoize_call=true))]
fn file2formants<'py>(
    py: Python<'py>,
    filename: PathBuf,
    maxformant: f64,
    winlen: f64,
    preemph: f64,
    memoize_call: bool,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let params = params(maxformant, winlen, preemph);
    let rows = with_default_session(|s| s.file2formants(filename, &params, memoize_call))?;
    rows_to_array(py, &rows)
}

/// Clear the default extractor's formant cache
#[pyfunction]
fn clear_formant_cache() -> PyResult<()> {
    with_default_session(|s| {
        s.cache.clear();
        Ok(())
    })
}

/// Formants [f1, f2, f3] at a time point, using the default extractor
#[pyfunction]
#[pyo3(signature = (filename, time, maxformant=5500.0, winlen=0.025, preemph=50.0, memoize_call=true))]
fn formants_at_time<'py>(
    py: Python<'py>,
    filename: PathBuf,
    time: f64,
    maxformant: f64,
    winlen: f64,
    preemph: f64,
    memoize_call: bool,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    let params = params(maxformant, winlen, preemph);
    let formants =
        with_default_session(|s| s.formants_at_time(filename, time, &params, memoize_call))?;
    warn_if_undefined(py, formants.iter().any(|f| f.is_nan()))?;
    Ok(formants.into_pyarray_bound(py))
}

/// Formant rows between start and end (inclusive), using the default extractor
#[pyfunction]
#[pyo3(signature = (filename, start, end, maxformant=5500.0, winlen=0.025, preemph=50.0, memoize_call=true))]
#[allow(clippy::too_many_arguments)]
fn formants_at_interval<'py>(
    py: Python<'py>,
    filename: PathBuf,
    start: f64,
    end: f64,
    maxformant: f64,
    winlen: f64,
    preemph: f64,
    memoize_call: bool,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let params = params(maxformant, winlen, preemph);
    let rows = with_default_session(|s| {
        s.formants_at_interval(filename, start, end, &params, memoize_call)
    })?;
    warn_if_undefined(py, rows_have_undefined(&rows))?;
    rows_to_array(py, &rows)
}

// Helper functions

fn params(maxformant: f64, winlen: f64, preemph: f64) -> FormantParams {
    FormantParams::default()
        .with_max_formant(maxformant)
        .with_window_length(winlen)
        .with_pre_emphasis(preemph)
}

fn to_py_err(e: PraatError) -> PyErr {
    match e {
        PraatError::OutOfRange(_) | PraatError::InvalidParameter(_) => {
            PyValueError::new_err(e.to_string())
        }
        _ => PyRuntimeError::new_err(e.to_string()),
    }
}

fn table_rows(table: &FormantTable) -> Vec<Vec<f64>> {
    table.rows().iter().map(|r| r.to_array().to_vec()).collect()
}

fn rows_have_undefined(rows: &[Vec<f64>]) -> bool {
    rows.iter().flatten().any(|v| v.is_nan())
}

fn rows_to_array<'py>(py: Python<'py>, rows: &[Vec<f64>]) -> PyResult<Bound<'py, PyArray2<f64>>> {
    if rows.is_empty() {
        return Ok(PyArray2::zeros_bound(py, [0, 4], false));
    }
    PyArray2::from_vec2_bound(py, rows).map_err(|e| PyValueError::new_err(e.to_string()))
}

fn warn_if_undefined(py: Python<'_>, undefined: bool) -> PyResult<()> {
    if undefined {
        let category = py.get_type_bound::<PyUserWarning>();
        PyErr::warn_bound(py, category.as_any(), UNDEFINED_FORMANT_WARNING, 1)?;
    }
    Ok(())
}

/// praat_formants_python - formant tables from Praat, as numpy arrays
///
/// Functions:
/// - file2formants: full [time, f1, f2, f3] table of an audio file
/// - formants_at_time: [f1, f2, f3] at a time point
/// - formants_at_interval: table rows between two times
/// - clear_formant_cache: reset memoized tables
///
/// Classes:
/// - FormantExtractor: the same operations with a private cache
#[pymodule]
fn praat_formants_python(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyFormantExtractor>()?;
    m.add_function(wrap_pyfunction!(file2formants, m)?)?;
    m.add_function(wrap_pyfunction!(clear_formant_cache, m)?)?;
    m.add_function(wrap_pyfunction!(formants_at_time, m)?)?;
    m.add_function(wrap_pyfunction!(formants_at_interval, m)?)?;
    Ok(())
}
