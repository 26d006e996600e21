//! Rendering record sets for the terminal.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::record::{RecordSet, Scalar};

/// Longest cell the table format prints before eliding.
const MAX_TABLE_CELL_CHARS: usize = 48;
const COLUMN_GAP: &str = "  ";

/// Output format for [`render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Csv => "csv",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown format '{other}' (expected table, json or csv)")),
        }
    }
}

/// Errors from serializing a record set.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV output was not valid UTF-8")]
    Utf8,
}

/// Renders `records` in `format`.
///
/// JSON is an array of objects with `Missing` cells omitted. CSV and table
/// print `Missing` as an empty cell.
///
/// # Errors
///
/// Returns [`OutputError`] if serialization fails.
pub fn render(records: &RecordSet, format: OutputFormat) -> Result<String, OutputError> {
    match format {
        OutputFormat::Table => Ok(render_table(records)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(records.records())?),
        OutputFormat::Csv => render_csv(records),
    }
}

fn render_csv(records: &RecordSet) -> Result<String, OutputError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(records.columns())?;
    for record in records {
        writer.write_record(record.iter().map(|(_, value)| value.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| OutputError::Csv(e.into_error().into()))?;
    String::from_utf8(bytes).map_err(|_| OutputError::Utf8)
}

fn table_cell(value: &Scalar) -> String {
    let text: String = value
        .to_string()
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if text.chars().count() <= MAX_TABLE_CELL_CHARS {
        return text;
    }
    let mut cut: String = text.chars().take(MAX_TABLE_CELL_CHARS - 3).collect();
    cut.push_str("...");
    cut
}

fn render_table(records: &RecordSet) -> String {
    if records.columns().is_empty() {
        return "(no records)\n".to_string();
    }

    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| record.iter().map(|(_, value)| table_cell(value)).collect())
        .collect();

    let mut widths: Vec<usize> = records
        .columns()
        .iter()
        .map(|c| c.chars().count())
        .collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, records.columns(), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &rule, &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row<S: AsRef<str>>(out: &mut String, cells: &[S], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let cell = cell.as_ref();
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    out.push_str(line.join(COLUMN_GAP).trim_end());
    out.push('\n');
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::record::Record;

    fn sample() -> RecordSet {
        RecordSet::reconcile(vec![
            Record::new()
                .with("name", Scalar::Text("433 Eros".into()))
                .with("hazardous", Scalar::Bool(false)),
            Record::new()
                .with("name", Scalar::Text("Apophis, 99942".into()))
                .with("diameter_m", Scalar::Float(370.0))
                .with("note", Scalar::Null),
        ])
    }

    #[test]
    fn test_render_json_omits_missing_keeps_null() {
        let out = render(&sample(), OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        let first = parsed[0].as_object().unwrap();
        assert!(!first.contains_key("diameter_m"));
        assert_eq!(parsed[1]["note"], serde_json::Value::Null);
        assert_eq!(parsed[1]["diameter_m"], serde_json::json!(370.0));
    }

    #[test]
    fn test_render_csv_quotes_and_blanks_missing() {
        let out = render(&sample(), OutputFormat::Csv).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], "name,hazardous,diameter_m,note");
        assert_eq!(lines[1], "433 Eros,false,,");
        assert_eq!(lines[2], "\"Apophis, 99942\",,370,null");
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let out = render(&sample(), OutputFormat::Table).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert!(lines[0].starts_with("name            hazardous"));
        assert!(lines[1].starts_with("--------------  ---------"));
        assert!(lines[2].starts_with("433 Eros        false"));
    }

    #[test]
    fn test_render_table_elides_long_cells() {
        let set = RecordSet::reconcile(vec![
            Record::new().with("explanation", Scalar::Text("x".repeat(500))),
        ]);
        let out = render(&set, OutputFormat::Table).unwrap();
        let row = out.lines().nth(2).unwrap();
        assert_eq!(row.chars().count(), MAX_TABLE_CELL_CHARS);
        assert!(row.ends_with("..."));
    }

    #[test]
    fn test_render_empty_set() {
        assert_eq!(
            render(&RecordSet::default(), OutputFormat::Table).unwrap(),
            "(no records)\n"
        );
        assert_eq!(render(&RecordSet::default(), OutputFormat::Json).unwrap(), "[]");
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
