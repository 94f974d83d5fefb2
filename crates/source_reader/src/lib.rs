//! Source reader crate for the Telco-churn file.
//!
//! This crate wraps the `polars` CSV reader to load a delimited file of
//! unknown dialect into untyped `RawCustomerRecord`s for feature derivation.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use churn_structs::RawCustomerRecord;
use polars::prelude::*;
use tracing::{debug, info};

/// Delimiters considered when sniffing, in preference order on ties.
pub const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b'\t', b';', b'|'];

/// Delimiter used when sniffing finds no consistent candidate.
pub const DEFAULT_DELIMITER: u8 = b'\t';

/// Bytes of the file inspected by [`sniff_delimiter`].
const SNIFF_SAMPLE_BYTES: u64 = 5000;

/// Lines of the sample compared against each other.
const SNIFF_MAX_LINES: usize = 10;

/// A loaded source file.
#[derive(Debug, Clone, Default)]
pub struct RawSource {
    /// Delimiter the file was parsed with.
    pub delimiter: u8,
    /// Header names, whitespace-trimmed, in file order.
    pub columns: Vec<String>,
    /// One record per data row.
    pub records: Vec<RawCustomerRecord>,
}

/// Picks the delimiter of a text sample.
///
/// A candidate qualifies when it appears the same non-zero number of times on
/// every complete sample line, not counting occurrences inside double-quoted
/// values. The qualifying candidate with the most occurrences per line wins.
/// Falls back to [`DEFAULT_DELIMITER`].
#[must_use]
pub fn sniff_delimiter(sample: &str) -> u8 {
    let mut lines: Vec<&str> = sample.lines().filter(|l| !l.trim().is_empty()).collect();

    // The last line may be cut off by the sample window.
    if lines.len() > 1 && !sample.ends_with('\n') {
        lines.pop();
    }
    lines.truncate(SNIFF_MAX_LINES);

    let Some(first) = lines.first() else {
        return DEFAULT_DELIMITER;
    };

    let mut best: Option<(u8, usize)> = None;

    for &delimiter in &CANDIDATE_DELIMITERS {
        let count = count_unquoted(first, delimiter);
        if count == 0 {
            continue;
        }

        let consistent = lines
            .iter()
            .all(|line| count_unquoted(line, delimiter) == count);

        if consistent && best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((delimiter, count));
        }
    }

    best.map_or(DEFAULT_DELIMITER, |(delimiter, _)| delimiter)
}

/// Occurrences of `delimiter` outside double-quoted spans.
fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for byte in line.bytes() {
        if byte == b'"' {
            // An escaped `""` toggles twice and leaves the state unchanged.
            in_quotes = !in_quotes;
        } else if byte == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Reads the start of a file and sniffs its delimiter.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn sniff_file_delimiter(path: &Path) -> Result<u8> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut sample = Vec::new();
    file.take(SNIFF_SAMPLE_BYTES)
        .read_to_end(&mut sample)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    Ok(sniff_delimiter(&String::from_utf8_lossy(&sample)))
}

/// Loads a delimited file into raw records.
///
/// Every column is read as text; empty cells become nulls. No value is
/// validated here.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn read_raw_records(path: &Path) -> Result<RawSource> {
    if !path.exists() {
        anyhow::bail!("Missing source file: {}", path.display());
    }

    let delimiter = sniff_file_delimiter(path)?;
    debug!(delimiter = %char::from(delimiter).escape_default(), "Detected delimiter");

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_separator(delimiter))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to open {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let source = dataframe_to_records(&df, delimiter)?;

    info!(
        path = %path.display(),
        rows = source.records.len(),
        columns = source.columns.len(),
        "Loaded source file"
    );

    Ok(source)
}

/// Converts an all-text `DataFrame` into raw records.
fn dataframe_to_records(df: &DataFrame, delimiter: u8) -> Result<RawSource> {
    let mut columns = Vec::with_capacity(df.width());
    let mut values = Vec::with_capacity(df.width());

    for column in df.get_columns() {
        let series = column.as_materialized_series();
        let text = series
            .str()
            .with_context(|| format!("Column `{}` was not read as text", series.name()))?;

        columns.push(series.name().as_str().trim().to_string());
        values.push(text);
    }

    let records = (0..df.height())
        .map(|row| {
            columns
                .iter()
                .zip(&values)
                .map(|(name, ca)| (name.clone(), ca.get(row).map(str::to_string)))
                .collect::<RawCustomerRecord>()
        })
        .collect();

    Ok(RawSource {
        delimiter,
        columns,
        records,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_fixture(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write fixture");
        file
    }

    #[test]
    fn test_sniff_comma() {
        assert_eq!(sniff_delimiter("a,b,c\n1,2,3\n4,5,6\n"), b',');
    }

    #[test]
    fn test_sniff_tab_with_commas_in_values() {
        let sample = "id\tname\tamount\nA1\tSmith, J\t1\nA2\tDoe\t2\n";
        assert_eq!(sniff_delimiter(sample), b'\t');
    }

    #[test]
    fn test_sniff_comma_with_quoted_commas() {
        let sample = "customerID,PaymentMethod,Churn\n\
                      A1,\"Bank transfer, automatic\",Yes\n\
                      A2,Mailed check,No\n";
        assert_eq!(sniff_delimiter(sample), b',');
        assert_eq!(count_unquoted("a,\"b \"\"x, y\"\"\",c", b','), 2);
    }

    #[test]
    fn test_read_comma_file_with_quoted_value() {
        let file = write_fixture(
            "customerID,PaymentMethod,Churn\n\
             A1,\"Bank transfer, automatic\",Yes\n\
             A2,Mailed check,No\n",
        );

        let source = read_raw_records(file.path()).expect("fixture should load");

        assert_eq!(source.delimiter, b',');
        assert_eq!(source.columns, vec!["customerID", "PaymentMethod", "Churn"]);
        assert_eq!(
            source.records[0].get("PaymentMethod"),
            Some("Bank transfer, automatic")
        );
        assert_eq!(source.records[1].get("Churn"), Some("No"));
    }

    #[test]
    fn test_sniff_semicolon_and_pipe() {
        assert_eq!(sniff_delimiter("a;b\n1;2\n"), b';');
        assert_eq!(sniff_delimiter("a|b|c\n1|2|3\n"), b'|');
    }

    #[test]
    fn test_sniff_defaults_to_tab() {
        assert_eq!(sniff_delimiter(""), DEFAULT_DELIMITER);
        assert_eq!(sniff_delimiter("single\ncolumn\n"), DEFAULT_DELIMITER);
    }

    #[test]
    fn test_sniff_ignores_truncated_last_line() {
        assert_eq!(sniff_delimiter("a,b,c\n1,2,3\n4,5"), b',');
    }

    #[test]
    fn test_read_tab_file_with_blanks() {
        let file = write_fixture(
            "customerID\ttenure\tTotalCharges\tChurn\n\
             A1\t5\t\tYes\n\
             A2\t12\t 100.5\tNo\n",
        );

        let source = read_raw_records(file.path()).expect("fixture should load");

        assert_eq!(source.delimiter, b'\t');
        assert_eq!(source.columns, vec!["customerID", "tenure", "TotalCharges", "Churn"]);
        assert_eq!(source.records.len(), 2);

        let first = &source.records[0];
        assert_eq!(first.get("customerID"), Some("A1"));
        assert_eq!(first.get("tenure"), Some("5"));
        assert_eq!(first.get("TotalCharges"), None);

        let second = &source.records[1];
        assert_eq!(second.get("TotalCharges"), Some(" 100.5"));
    }

    #[test]
    fn test_read_trims_header_names() {
        let file = write_fixture("customerID , tenure\nA1,5\n");
        let source = read_raw_records(file.path()).expect("fixture should load");

        assert_eq!(source.columns, vec!["customerID", "tenure"]);
        assert_eq!(source.records[0].get("tenure"), Some("5"));
    }

    #[test]
    fn test_missing_file() {
        let err = read_raw_records(Path::new("/definitely/not/here.csv"))
            .expect_err("missing file should fail");
        assert!(err.to_string().contains("Missing source file"));
    }
}
