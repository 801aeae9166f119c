//! Formant tables parsed from Praat's `List...` output
//!
//! Praat prints one header line followed by one tab-separated line per
//! analysis frame: time, F1, F2, F3, F4, F5. Only the first four columns are
//! kept. Undefined formants (printed as `--undefined--`) become NaN.
//!
//! Rows are ordered by non-decreasing time, which the lookups rely on:
//! both [`FormantTable::formants_at_time`] and
//! [`FormantTable::formants_at_interval`] binary-search the time column.

use serde::Serialize;
use tracing::{debug, warn};

use crate::{PraatError, Result, UNDEFINED_FORMANT_WARNING};

/// Number of formant columns kept per frame
pub const NUM_FORMANTS: usize = 3;

/// Number of leading fields read from each output record (time + F1..F3)
const FIELDS_PER_RECORD: usize = 1 + NUM_FORMANTS;

/// One analysis frame: time and the first three formant frequencies
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FormantRow {
    /// Frame time in seconds
    pub time: f64,
    /// F1 in Hz (NaN if undefined)
    pub f1: f64,
    /// F2 in Hz (NaN if undefined)
    pub f2: f64,
    /// F3 in Hz (NaN if undefined)
    pub f3: f64,
}

impl FormantRow {
    pub fn new(time: f64, f1: f64, f2: f64, f3: f64) -> Self {
        Self { time, f1, f2, f3 }
    }

    /// Formant frequencies without the time column
    pub fn formants(&self) -> [f64; NUM_FORMANTS] {
        [self.f1, self.f2, self.f3]
    }

    /// Get a specific formant (1-indexed: F1, F2, F3)
    pub fn get_formant(&self, formant_number: usize) -> Option<f64> {
        match formant_number {
            1 => Some(self.f1),
            2 => Some(self.f2),
            3 => Some(self.f3),
            _ => None,
        }
    }

    pub fn has_undefined(&self) -> bool {
        self.formants().iter().any(|f| f.is_nan())
    }

    /// `[time, f1, f2, f3]`
    pub fn to_array(&self) -> [f64; FIELDS_PER_RECORD] {
        [self.time, self.f1, self.f2, self.f3]
    }
}

/// Formant tracks of one audio file, one row per analysis frame
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormantTable {
    rows: Vec<FormantRow>,
}

impl FormantTable {
    /// Build a table from rows already in time order
    ///
    /// # Errors
    /// Returns [`PraatError::Parse`] if a time is not finite or the times decrease.
    pub fn from_rows(rows: Vec<FormantRow>) -> Result<Self> {
        let mut previous = f64::NEG_INFINITY;
        for (i, row) in rows.iter().enumerate() {
            check_time(row.time, previous, i + 1)?;
            previous = row.time;
        }
        Ok(Self { rows })
    }

    /// Parse Praat's standard output
    ///
    /// The first line is a header and is skipped, as is the empty record
    /// after the final newline. Every other line must carry at least four
    /// tab-separated fields; formant fields that are not numbers become NaN.
    ///
    /// # Errors
    /// Returns [`PraatError::Parse`] for a record with fewer than four
    /// fields, a time that is not a finite number, or a time smaller than
    /// the one before it. Line numbers in the error are 1-based and count
    /// the header.
    pub fn parse(output: &str) -> Result<Self> {
        let records: Vec<&str> = output.split('\n').collect();
        let mut body = records.get(1..).unwrap_or_default();
        if let Some((last, rest)) = body.split_last() {
            if last.trim().is_empty() {
                body = rest;
            }
        }

        let mut rows = Vec::with_capacity(body.len());
        let mut previous = f64::NEG_INFINITY;

        for (i, record) in body.iter().enumerate() {
            let line = i + 2;
            let row = parse_record(record, line)?;
            check_time(row.time, previous, line)?;
            previous = row.time;
            rows.push(row);
        }

        debug!(frames = rows.len(), "Parsed formant table");

        Ok(Self { rows })
    }

    /// Formants at the first frame whose time is at or after `time`
    ///
    /// This is a leftmost insertion-point lookup, not a nearest-frame one:
    /// an exact match returns that frame, anything between two frames
    /// returns the later one. A warning is logged if any returned formant is
    /// undefined; the values are still returned.
    ///
    /// # Errors
    /// - [`PraatError::OutOfRange`] if `time` is after the last frame or the table is empty
    /// - [`PraatError::InvalidParameter`] if `time` is NaN
    pub fn formants_at_time(&self, time: f64) -> Result<[f64; NUM_FORMANTS]> {
        if time.is_nan() {
            return Err(PraatError::InvalidParameter("query time is NaN".to_string()));
        }

        let index = self.lower_bound(time);
        let row = self.rows.get(index).ok_or_else(|| self.out_of_range(time))?;

        if row.has_undefined() {
            warn!(time, frame_time = row.time, "{}", UNDEFINED_FORMANT_WARNING);
        }

        Ok(row.formants())
    }

    /// Frames with `start <= time <= end`, time column included
    ///
    /// `end < start` yields an empty slice. A warning is logged once if any
    /// formant in the slice is undefined.
    ///
    /// # Errors
    /// - [`PraatError::OutOfRange`] if `start` is after the last frame or the table is empty
    /// - [`PraatError::InvalidParameter`] if either bound is NaN
    pub fn formants_at_interval(&self, start: f64, end: f64) -> Result<&[FormantRow]> {
        if start.is_nan() || end.is_nan() {
            return Err(PraatError::InvalidParameter(format!(
                "interval bounds must not be NaN (start = {}, end = {})",
                start, end
            )));
        }

        let start_idx = self.lower_bound(start);
        if start_idx >= self.rows.len() {
            return Err(self.out_of_range(start));
        }
        let end_idx = self.upper_bound(end).max(start_idx);

        let rows = &self.rows[start_idx..end_idx];
        if rows.iter().any(FormantRow::has_undefined) {
            warn!(start, end, frames = rows.len(), "{}", UNDEFINED_FORMANT_WARNING);
        }

        Ok(rows)
    }

    /// Index of the first row with `time >= t`
    fn lower_bound(&self, t: f64) -> usize {
        self.rows.partition_point(|row| row.time < t)
    }

    /// Index of the first row with `time > t`
    fn upper_bound(&self, t: f64) -> usize {
        self.rows.partition_point(|row| row.time <= t)
    }

    fn out_of_range(&self, time: f64) -> PraatError {
        match self.end_time() {
            Some(end) => PraatError::OutOfRange(format!(
                "t = {} s is after the last frame at {} s",
                time, end
            )),
            None => PraatError::OutOfRange(format!("t = {} s, formant table is empty", time)),
        }
    }

    /// Rows taken from an existing table, already known to be in order
    pub(crate) fn from_sorted_rows(rows: Vec<FormantRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[FormantRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<FormantRow> {
        self.rows
    }

    pub fn row(&self, frame: usize) -> Option<&FormantRow> {
        self.rows.get(frame)
    }

    /// Get the number of frames
    pub fn num_frames(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Frame times in seconds
    pub fn times(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.time).collect()
    }

    /// All values of one formant (1 = F1, 2 = F2, 3 = F3), NaN where undefined
    pub fn formant_values(&self, formant_number: usize) -> Option<Vec<f64>> {
        if !(1..=NUM_FORMANTS).contains(&formant_number) {
            return None;
        }
        self.rows
            .iter()
            .map(|r| r.get_formant(formant_number))
            .collect()
    }

    /// Get formant value at a specific frame, None if undefined
    pub fn get_value_at_frame(&self, formant_number: usize, frame: usize) -> Option<f64> {
        self.rows
            .get(frame)
            .and_then(|r| r.get_formant(formant_number))
            .filter(|f| !f.is_nan())
    }

    /// Time of the first frame
    pub fn start_time(&self) -> Option<f64> {
        self.rows.first().map(|r| r.time)
    }

    /// Time of the last frame
    pub fn end_time(&self) -> Option<f64> {
        self.rows.last().map(|r| r.time)
    }

    pub fn has_undefined(&self) -> bool {
        self.rows.iter().any(FormantRow::has_undefined)
    }

    /// Rows as `[time, f1, f2, f3]` arrays
    pub fn to_arrays(&self) -> Vec<[f64; FIELDS_PER_RECORD]> {
        self.rows.iter().map(FormantRow::to_array).collect()
    }

    /// Get mean value for a formant across all frames where it is defined
    pub fn get_mean(&self, formant_number: usize) -> Option<f64> {
        let values: Vec<f64> = self.defined_values(formant_number).collect();

        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }

    /// Get minimum value for a formant
    pub fn get_min(&self, formant_number: usize) -> Option<f64> {
        self.defined_values(formant_number).reduce(f64::min)
    }

    /// Get maximum value for a formant
    pub fn get_max(&self, formant_number: usize) -> Option<f64> {
        self.defined_values(formant_number).reduce(f64::max)
    }

    fn defined_values(&self, formant_number: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows
            .iter()
            .filter_map(move |r| r.get_formant(formant_number))
            .filter(|f| f.is_finite())
    }
}

fn parse_record(record: &str, line: usize) -> Result<FormantRow> {
    let fields: Vec<&str> = record
        .trim_end()
        .split('\t')
        .take(FIELDS_PER_RECORD)
        .collect();

    if fields.len() < FIELDS_PER_RECORD {
        return Err(PraatError::Parse {
            line,
            reason: format!(
                "expected at least {} tab-separated fields, found {}",
                FIELDS_PER_RECORD,
                fields.len()
            ),
        });
    }

    let time = fields[0]
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|t| t.is_finite())
        .ok_or_else(|| PraatError::Parse {
            line,
            reason: format!("invalid frame time {:?}", fields[0]),
        })?;

    Ok(FormantRow::new(
        time,
        parse_formant(fields[1]),
        parse_formant(fields[2]),
        parse_formant(fields[3]),
    ))
}

/// Praat marks undefined values with a non-numeric token
fn parse_formant(field: &str) -> f64 {
    field.trim().parse::<f64>().unwrap_or(f64::NAN)
}

fn check_time(time: f64, previous: f64, line: usize) -> Result<()> {
    if !time.is_finite() {
        return Err(PraatError::Parse {
            line,
            reason: format!("invalid frame time {}", time),
        });
    }
    if time < previous {
        return Err(PraatError::Parse {
            line,
            reason: format!("frame time {} is before previous frame time {}", time, previous),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const HEADER: &str = "time(s)\tF1(Hz)\tF2(Hz)\tF3(Hz)\tF4(Hz)\tF5(Hz)\n";

    fn table(times: &[f64]) -> FormantTable {
        let rows = times
            .iter()
            .enumerate()
            .map(|(i, &t)| {
                let i = i as f64;
                FormantRow::new(t, 500.0 + i, 1500.0 + i, 2500.0 + i)
            })
            .collect();
        FormantTable::from_rows(rows).unwrap()
    }

    #[test]
    fn test_parse_basic() {
        let output = format!(
            "{}0.026000\t612.345\t1720.100\t2650.000\t3500.123\t4400.000\n\
             0.036000\t598.000\t1700.500\t2640.250\t3510.000\t4390.000\n",
            HEADER
        );
        let t = FormantTable::parse(&output).unwrap();

        assert_eq!(t.num_frames(), 2);
        assert_relative_eq!(t.rows()[0].time, 0.026);
        assert_relative_eq!(t.rows()[0].f1, 612.345);
        assert_relative_eq!(t.rows()[1].f3, 2640.25);
        assert!(!t.has_undefined());
    }

    #[test]
    fn test_parse_undefined_becomes_nan() {
        let output = format!(
            "{}0.010000\t--undefined--\t1500.000\t--undefined--\t--undefined--\t--undefined--\n",
            HEADER
        );
        let t = FormantTable::parse(&output).unwrap();
        let row = t.rows()[0];

        assert!(row.f1.is_nan());
        assert_relative_eq!(row.f2, 1500.0);
        assert!(row.f3.is_nan());
        assert!(t.has_undefined());
        assert_eq!(t.get_value_at_frame(1, 0), None);
        assert_eq!(t.get_value_at_frame(2, 0), Some(1500.0));
    }

    #[test]
    fn test_parse_handles_crlf_and_missing_final_newline() {
        let output = "header\r\n0.01\t500\t1500\t2500\t3500\t4500\r\n0.02\t510\t1510\t2510";
        let t = FormantTable::parse(output).unwrap();
        assert_eq!(t.num_frames(), 2);
        assert_relative_eq!(t.rows()[1].f3, 2510.0);
    }

    #[test]
    fn test_parse_empty_and_header_only() {
        assert!(FormantTable::parse("").unwrap().is_empty());
        assert!(FormantTable::parse(HEADER).unwrap().is_empty());
    }

    #[test]
    fn test_parse_short_record_is_error() {
        let output = format!("{}0.01\t500\t1500\t2500\n0.02\t510\n", HEADER);
        match FormantTable::parse(&output) {
            Err(PraatError::Parse { line, reason }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("found 2"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_blank_line_inside_body_is_error() {
        let output = format!("{}0.01\t500\t1500\t2500\n\n0.02\t510\t1510\t2510\n", HEADER);
        assert!(matches!(
            FormantTable::parse(&output),
            Err(PraatError::Parse { line: 3, .. })
        ));
    }

    #[test]
    fn test_parse_bad_time_is_error() {
        let output = format!("{}--undefined--\t500\t1500\t2500\n", HEADER);
        assert!(matches!(
            FormantTable::parse(&output),
            Err(PraatError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_parse_decreasing_time_is_error() {
        let output = format!("{}0.02\t500\t1500\t2500\n0.01\t510\t1510\t2510\n", HEADER);
        assert!(matches!(
            FormantTable::parse(&output),
            Err(PraatError::Parse { line: 3, .. })
        ));
    }

    #[test]
    fn test_time_column_is_monotonic() {
        let output = format!(
            "{}0.00\t1\t2\t3\n0.01\t1\t2\t3\n0.01\t1\t2\t3\n0.02\t1\t2\t3\n",
            HEADER
        );
        let t = FormantTable::parse(&output).unwrap();
        let times = t.times();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_at_time_exact_match() {
        let t = table(&[0.0, 0.01, 0.02, 0.03]);
        let f = t.formants_at_time(0.01).unwrap();
        assert_eq!(f, [501.0, 1501.0, 2501.0]);
    }

    #[test]
    fn test_at_time_between_frames_takes_later_frame() {
        let t = table(&[0.0, 0.01, 0.02, 0.03]);
        let f = t.formants_at_time(0.015).unwrap();
        assert_eq!(f, [502.0, 1502.0, 2502.0]);
    }

    #[test]
    fn test_at_time_before_first_frame_takes_first() {
        let t = table(&[0.026, 0.036]);
        assert_eq!(t.formants_at_time(0.0).unwrap(), [500.0, 1500.0, 2500.0]);
        assert_eq!(t.formants_at_time(-1.0).unwrap(), [500.0, 1500.0, 2500.0]);
    }

    #[test]
    fn test_at_time_last_frame_and_beyond() {
        let t = table(&[0.0, 0.01, 0.02]);
        assert!(t.formants_at_time(0.02).is_ok());
        assert!(matches!(t.formants_at_time(0.021), Err(PraatError::OutOfRange(_))));
    }

    #[test]
    fn test_at_time_empty_table() {
        let t = FormantTable::default();
        assert!(matches!(t.formants_at_time(0.0), Err(PraatError::OutOfRange(_))));
    }

    #[test]
    fn test_at_time_nan_rejected() {
        let t = table(&[0.0, 0.01]);
        assert!(matches!(
            t.formants_at_time(f64::NAN),
            Err(PraatError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_interval_inclusive_bounds() {
        let t = table(&[0.0, 0.01, 0.02, 0.03, 0.04]);
        let rows = t.formants_at_interval(0.01, 0.03).unwrap();
        let times: Vec<f64> = rows.iter().map(|r| r.time).collect();
        assert_eq!(times, [0.01, 0.02, 0.03]);
    }

    #[test]
    fn test_interval_between_frames() {
        let t = table(&[0.0, 0.01, 0.02, 0.03, 0.04]);
        let rows = t.formants_at_interval(0.005, 0.025).unwrap();
        let times: Vec<f64> = rows.iter().map(|r| r.time).collect();
        assert_eq!(times, [0.01, 0.02]);
    }

    #[test]
    fn test_interval_end_past_last_frame_is_clamped() {
        let t = table(&[0.0, 0.01, 0.02]);
        let rows = t.formants_at_interval(0.01, 10.0).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_interval_reversed_is_empty() {
        let t = table(&[0.0, 0.01, 0.02, 0.03]);
        assert!(t.formants_at_interval(0.03, 0.01).unwrap().is_empty());
    }

    #[test]
    fn test_interval_out_of_range() {
        let t = table(&[0.0, 0.01, 0.02]);
        assert!(matches!(
            t.formants_at_interval(0.5, 0.6),
            Err(PraatError::OutOfRange(_))
        ));
        assert!(matches!(
            FormantTable::default().formants_at_interval(0.0, 1.0),
            Err(PraatError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_statistics_skip_undefined() {
        let rows = vec![
            FormantRow::new(0.0, 500.0, 1500.0, f64::NAN),
            FormantRow::new(0.01, f64::NAN, 1700.0, f64::NAN),
            FormantRow::new(0.02, 700.0, 1600.0, f64::NAN),
        ];
        let t = FormantTable::from_rows(rows).unwrap();

        assert_relative_eq!(t.get_mean(1).unwrap(), 600.0);
        assert_eq!(t.get_min(2), Some(1500.0));
        assert_eq!(t.get_max(2), Some(1700.0));
        assert_eq!(t.get_mean(3), None);

        // Invalid formant number should return None
        assert!(t.get_mean(0).is_none());
        assert!(t.get_mean(4).is_none());
        assert!(t.formant_values(4).is_none());
    }

    #[test]
    fn test_accessors() {
        let t = table(&[0.026, 0.036, 0.046]);
        assert_eq!(t.start_time(), Some(0.026));
        assert_eq!(t.end_time(), Some(0.046));
        assert_eq!(t.formant_values(2).unwrap(), vec![1500.0, 1501.0, 1502.0]);
        assert_eq!(t.to_arrays()[1], [0.036, 501.0, 1501.0, 2501.0]);
        assert_eq!(t.row(5), None);
        assert_eq!(FormantTable::default().start_time(), None);
    }

    #[test]
    fn test_from_rows_rejects_unsorted() {
        let rows = vec![FormantRow::new(0.02, 1.0, 2.0, 3.0), FormantRow::new(0.01, 1.0, 2.0, 3.0)];
        assert!(FormantTable::from_rows(rows).is_err());
    }

    #[test]
    fn test_serialize_json() {
        let rows = vec![FormantRow::new(0.01, 500.0, f64::NAN, 2500.0)];
        let t = FormantTable::from_rows(rows).unwrap();
        let json = serde_json::to_value(&t).unwrap();

        assert_eq!(json["rows"][0]["time"], 0.01);
        assert_eq!(json["rows"][0]["f1"], 500.0);
        assert!(json["rows"][0]["f2"].is_null());
    }
}
