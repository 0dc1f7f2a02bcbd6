//! CSV export of the rolling history.

use std::{
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
};

use jiff::{Zoned, civil};
use serde::Serialize;
use thiserror::Error;

use crate::{HistoryBuffer, HistoryRow};

/// Column headers of an exported history.
pub const HEADERS: [&str; 7] = [
    "Time(s)",
    "P_Total(a.u.)",
    "ATP+NADPH(a.u.)",
    "ADP+NADP+(a.u.)",
    "C3(a.u.)",
    "C5(a.u.)",
    "Event",
];

/// Errors that can occur while exporting history.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to create {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One exported line, with values already formatted.
#[derive(Debug, Serialize)]
struct CsvRecord<'a> {
    time: String,
    net_rate: String,
    energy: String,
    precursor: String,
    fixation: String,
    regeneration: String,
    event: &'a str,
}

impl<'a> From<&'a HistoryRow> for CsvRecord<'a> {
    fn from(row: &'a HistoryRow) -> Self {
        Self {
            time: format!("{:.1}", row.time),
            net_rate: format!("{:.3}", row.net_rate),
            energy: format!("{:.3}", row.energy),
            precursor: format!("{:.3}", row.precursor),
            fixation: format!("{:.3}", row.fixation),
            regeneration: format!("{:.3}", row.regeneration),
            event: row.marker.as_deref().unwrap_or_default(),
        }
    }
}

/// Writes a header line followed by one line per row.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns an error if writing to `writer` fails.
pub fn write_csv<'a, W: Write>(
    rows: impl IntoIterator<Item = &'a HistoryRow>,
    writer: W,
) -> Result<usize, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(HEADERS)?;

    let mut count = 0;
    for row in rows {
        writer.serialize(CsvRecord::from(row))?;
        count += 1;
    }
    writer.flush()?;

    Ok(count)
}

/// Writes the history into a new timestamped file in `dir`.
///
/// Returns the path of the written file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn export_csv(history: &HistoryBuffer, dir: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
    let path = dir.as_ref().join(default_file_name());
    let file = File::create(&path).map_err(|source| ExportError::File {
        path: path.clone(),
        source,
    })?;

    let count = write_csv(history.iter(), io::BufWriter::new(file))?;
    log::info!("exported {count} history rows to {}", path.display());

    Ok(path)
}

/// Returns the export file name for the current local time.
#[must_use]
pub fn default_file_name() -> String {
    file_name_at(Zoned::now().time())
}

/// Returns the export file name for a wall-clock time, e.g.
/// `chloroplast_data_14-05-09.csv`.
#[must_use]
pub fn file_name_at(time: civil::Time) -> String {
    format!("chloroplast_data_{}.csv", time.strftime("%H-%M-%S"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::num::NonZeroUsize;

    use crate::SteadyState;

    fn row(time: f64, marker: Option<&str>) -> HistoryRow {
        HistoryRow::new(
            time,
            SteadyState {
                fixation: 200.0,
                regeneration: 120.0,
                net_rate: 74.123_456,
                energy: 57.5,
                precursor: 142.5,
            },
            marker.map(str::to_owned),
        )
    }

    fn to_string(rows: &[HistoryRow]) -> String {
        let mut buffer = Vec::new();
        write_csv(rows, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn writes_header_and_formatted_rows() {
        let text = to_string(&[row(0.0, None), row(0.30000000000000004, Some("关灯"))]);

        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "Time(s),P_Total(a.u.),ATP+NADPH(a.u.),ADP+NADP+(a.u.),C3(a.u.),C5(a.u.),Event",
                "0.0,74.123,57.500,142.500,200.000,120.000,",
                "0.3,74.123,57.500,142.500,200.000,120.000,关灯",
            ]
        );
    }

    #[test]
    fn empty_input_still_writes_header() {
        let text = to_string(&[]);
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn exports_history_in_chronological_order() {
        let mut history = HistoryBuffer::new(NonZeroUsize::new(3).unwrap(), row(0.0, None));
        for time in [0.1, 0.2, 0.3, 0.4] {
            history.append(row(time, None));
        }

        let mut buffer = Vec::new();
        let count = write_csv(history.iter(), &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let times: Vec<_> = text
            .lines()
            .skip(1)
            .map(|line| line.split(',').next().unwrap())
            .collect();
        assert_eq!(count, 3);
        assert_eq!(times, ["0.2", "0.3", "0.4"]);
    }

    #[test]
    fn file_name_uses_wall_clock_time() {
        let time = civil::time(9, 5, 7, 0);
        assert_eq!(file_name_at(time), "chloroplast_data_09-05-07.csv");
    }

    #[test]
    fn export_reports_missing_directory() {
        let history = HistoryBuffer::new(NonZeroUsize::new(1).unwrap(), row(0.0, None));
        let result = export_csv(&history, "/nonexistent/stroma/exports");

        assert!(matches!(result, Err(ExportError::File { .. })));
    }
}
