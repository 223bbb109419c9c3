//! Writing tables as delimited text.
//!
//! The write phase renders the whole CSV into memory under each candidate
//! encoding in turn, so a failed attempt leaves nothing on disk. A value
//! that cannot be represented in the target encoding fails that candidate;
//! after all candidates fail, a sanitized copy of the table gets exactly
//! one more attempt with byte-order-marked UTF-8.

use csv::{ReaderBuilder, WriterBuilder};
use encoding_rs::{BIG5, Encoding, GBK};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::constants::UTF8_BOM;
use crate::error::{ConvertError, Result, StrategyFailure};
use crate::models::{Column, Table, Value};

/// How a table ended up on disk
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    /// Label of the output encoding that succeeded
    pub encoding: String,
    /// True when only the sanitization retry succeeded
    pub sanitized: bool,
}

/// One candidate output encoding
#[derive(Debug, Clone, Copy)]
enum OutputEncoding {
    /// UTF-8 with a leading byte-order mark
    Utf8Sig,
    Utf8,
    Legacy(&'static Encoding),
}

/// Candidates in fallback order, labelled as
/// [`crate::constants::WRITE_ENCODING_CANDIDATES`] spells them.
fn candidates() -> [(&'static str, OutputEncoding); 4] {
    [
        ("utf-8-sig", OutputEncoding::Utf8Sig),
        ("utf-8", OutputEncoding::Utf8),
        ("big5", OutputEncoding::Legacy(BIG5)),
        ("gbk", OutputEncoding::Legacy(GBK)),
    ]
}

/// Write a table to `path`, walking the encoding candidates and finally
/// the sanitization retry. The input table is never modified.
pub fn write_table(table: &Table, path: &Path) -> Result<WriteOutcome> {
    let mut attempts = Vec::new();

    for (label, encoding) in candidates() {
        match try_write(table, path, encoding) {
            Ok(()) => {
                debug!("wrote {} as {}", path.display(), label);
                return Ok(WriteOutcome {
                    encoding: label.to_string(),
                    sanitized: false,
                });
            }
            Err(error) => {
                warn!("output encoding {} failed: {}", label, error);
                attempts.push(StrategyFailure::new(label, error.to_string()));
            }
        }
    }

    // Last resort: strip known problem characters from a copy and retry
    // byte-order-marked UTF-8 exactly once.
    let cleaned = table.sanitized_copy();
    match try_write(&cleaned, path, OutputEncoding::Utf8Sig) {
        Ok(()) => {
            debug!("wrote {} as utf-8-sig after sanitization", path.display());
            Ok(WriteOutcome {
                encoding: "utf-8-sig".to_string(),
                sanitized: true,
            })
        }
        Err(error) => {
            warn!("sanitized retry failed: {}", error);
            attempts.push(StrategyFailure::new("utf-8-sig (sanitized)", error.to_string()));
            Err(ConvertError::EncodeExhausted {
                path: path.to_path_buf(),
                attempts,
            })
        }
    }
}

fn try_write(table: &Table, path: &Path, encoding: OutputEncoding) -> Result<()> {
    let buffer = render(table, encoding)?;
    fs::write(path, buffer)?;
    Ok(())
}

/// Render the full CSV into memory. Nothing is written on error, which
/// keeps failed conversions from leaving partial files behind.
fn render(table: &Table, encoding: OutputEncoding) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut writer = WriterBuilder::new().from_writer(&mut buffer);

        let header: Vec<Vec<u8>> = table
            .columns()
            .iter()
            .map(|column| encode_field(&column.name, &column.name, encoding))
            .collect::<Result<_>>()?;
        writer.write_record(&header)?;

        for row in table.rows() {
            let mut record = Vec::with_capacity(row.len());
            for (column, value) in table.columns().iter().zip(row) {
                record.push(encode_field(&value.to_field(), &column.name, encoding)?);
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
    }

    Ok(match encoding {
        OutputEncoding::Utf8Sig => {
            let mut with_bom = UTF8_BOM.to_vec();
            with_bom.extend_from_slice(&buffer);
            with_bom
        }
        _ => buffer,
    })
}

/// Encode one field. UTF-8 output can always represent a Rust string;
/// legacy encodings fail on unmappable characters instead of writing
/// substitution escapes.
fn encode_field(field: &str, column: &str, encoding: OutputEncoding) -> Result<Vec<u8>> {
    match encoding {
        OutputEncoding::Utf8Sig | OutputEncoding::Utf8 => Ok(field.as_bytes().to_vec()),
        OutputEncoding::Legacy(enc) => {
            let (bytes, _, had_errors) = enc.encode(field);
            if had_errors {
                return Err(ConvertError::EncodeFailed {
                    column: column.to_string(),
                    encoding: enc.name().to_string(),
                });
            }
            Ok(bytes.into_owned())
        }
    }
}

/// Load a CSV file into a table, inferring numbers where fields parse
/// cleanly. Used for the intermediate file the external tool writes.
pub fn load_csv_table(path: &Path) -> Result<Table> {
    let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    let columns: Vec<Column> = headers.iter().map(Column::new).collect();

    let mut table = Table::new(columns);
    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(parse_field).collect());
    }
    Ok(table)
}

fn parse_field(field: &str) -> Value {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Value::Missing;
    }
    if let Ok(number) = trimmed.parse::<f64>() {
        return Value::Number(number);
    }
    Value::Text(field.to_string())
}
