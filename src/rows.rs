// Row tokenization for raw CSV exports.

use thiserror::Error;

/// A line the tokenizer could not turn into fields (e.g. invalid UTF-8).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {message}")]
pub struct RowError {
    pub line: u64,
    pub message: String,
}

/// Splits a CSV blob into ordered rows of raw string fields, header line included.
pub trait RowReader: Send + Sync {
    fn read_rows(&self, input: &[u8]) -> Vec<Result<Vec<String>, RowError>>;
}

/// Comma-separated reader over the `csv` crate. Rows may have any number of fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRowReader;

impl RowReader for CsvRowReader {
    fn read_rows(&self, input: &[u8]) -> Vec<Result<Vec<String>, RowError>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(input);

        reader
            .records()
            .map(|result| {
                result
                    .map(|record| record.iter().map(str::to_string).collect::<Vec<_>>())
                    .map_err(|e| RowError {
                        line: e.position().map(|p| p.line()).unwrap_or(0),
                        message: e.to_string(),
                    })
            })
            .collect()
    }
}
