//! Decoding raw system-file structures into tables.
//!
//! A [`RawFile`] keeps every piece of text as bytes; this module applies
//! one concrete character encoding to all of them — variable names,
//! labels and string cells — under a strict or lossy error policy. The
//! encoding can be the one the file declares, a statistical guess, or a
//! fixed candidate supplied by the strategy chain.

use chardetng::EncodingDetector;
use encoding_rs::{
    BIG5, EUC_KR, Encoding, GBK, SHIFT_JIS, UTF_8, WINDOWS_874, WINDOWS_1252,
};
use std::collections::HashMap;

use crate::constants::{DETECTION_SAMPLE_BYTES, SYSMIS};
use crate::error::{ConvertError, Result};
use crate::models::{Column, Table, Value};
use crate::sav::raw::{RawDictionary, RawFile, RawValue};

/// Which encoding to apply to the file's text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingChoice {
    /// Whatever the file declares; UTF-8 when it declares nothing
    Declared,
    /// Statistical detection over the file's string bytes
    Detected,
    /// A fixed candidate from the fallback list
    Fixed(&'static Encoding),
}

/// What to do when bytes do not form valid text in the chosen encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePolicy {
    /// Malformed sequences fail the decode
    Strict,
    /// Malformed sequences become replacement characters
    Lossy,
}

/// One strategy's decoding parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub choice: EncodingChoice,
    pub policy: DecodePolicy,
}

impl DecodeOptions {
    pub fn strict(choice: EncodingChoice) -> Self {
        Self {
            choice,
            policy: DecodePolicy::Strict,
        }
    }

    pub fn lossy(choice: EncodingChoice) -> Self {
        Self {
            choice,
            policy: DecodePolicy::Lossy,
        }
    }
}

/// Decode a parsed file into a table. Returns the encoding that was
/// actually applied so callers can log it.
pub fn decode_file(raw: &RawFile, options: &DecodeOptions) -> Result<(Table, &'static Encoding)> {
    let encoding = resolve_encoding(raw, options.choice)?;
    let long_names = parse_long_names(&raw.dictionary, encoding, options.policy)?;

    let mut columns = Vec::with_capacity(raw.dictionary.variables.len());
    for variable in &raw.dictionary.variables {
        let short = decode_bytes(trim_padding(&variable.name), encoding, options.policy)?;
        let name = long_names
            .get(&short)
            .or_else(|| long_names.get(&short.to_uppercase()))
            .cloned()
            .unwrap_or(short);
        let mut column = Column::new(name);
        if let Some(label) = &variable.label {
            column.label = Some(decode_bytes(trim_padding(label), encoding, options.policy)?);
        }
        columns.push(column);
    }

    let mut table = Table::new(columns);
    for case in &raw.cases {
        let mut row = Vec::with_capacity(case.len());
        for value in case {
            row.push(match value {
                RawValue::Num(n) if *n == SYSMIS => Value::Missing,
                RawValue::Num(n) => Value::Number(*n),
                RawValue::Str(bytes) => Value::Text(decode_bytes(
                    trim_padding(bytes),
                    encoding,
                    options.policy,
                )?),
            });
        }
        table.push_row(row);
    }

    Ok((table, encoding))
}

/// Resolve the concrete encoding for a choice against a parsed file.
pub fn resolve_encoding(raw: &RawFile, choice: EncodingChoice) -> Result<&'static Encoding> {
    match choice {
        EncodingChoice::Fixed(encoding) => Ok(encoding),
        EncodingChoice::Declared => declared_encoding(&raw.dictionary),
        EncodingChoice::Detected => {
            let mut detector = EncodingDetector::new();
            detector.feed(&detection_sample(raw), true);
            Ok(detector.guess(None, true))
        }
    }
}

/// The encoding the dictionary declares, either as an encoding record or
/// as a codepage number. Files that declare nothing are treated as UTF-8
/// so this choice stays strict about foreign bytes.
fn declared_encoding(dictionary: &RawDictionary) -> Result<&'static Encoding> {
    if let Some(name) = &dictionary.encoding_name {
        let trimmed = String::from_utf8_lossy(trim_padding(name)).to_string();
        // WHATWG has no cp950 label; Big5 is its closest superset
        if trimmed.eq_ignore_ascii_case("cp950") {
            return Ok(BIG5);
        }
        return Encoding::for_label(trimmed.as_bytes()).ok_or(ConvertError::DecodeFailed {
            encoding: format!("declared encoding '{}'", trimmed),
        });
    }
    if let Some(code) = dictionary.codepage {
        return codepage_encoding(code).ok_or(ConvertError::DecodeFailed {
            encoding: format!("declared codepage {}", code),
        });
    }
    Ok(UTF_8)
}

/// Map the common Windows codepage numbers seen in integer-info records
fn codepage_encoding(code: i32) -> Option<&'static Encoding> {
    match code {
        65001 => Some(UTF_8),
        950 => Some(BIG5),
        936 => Some(GBK),
        932 => Some(SHIFT_JIS),
        949 => Some(EUC_KR),
        874 => Some(WINDOWS_874),
        1252 | 20127 | 28591 => Some(WINDOWS_1252),
        _ => None,
    }
}

/// Pool the file's text bytes for statistical detection: variable labels,
/// value-label text and string cells, up to the sample cap.
pub fn detection_sample(raw: &RawFile) -> Vec<u8> {
    let mut sample = Vec::new();

    for variable in &raw.dictionary.variables {
        if let Some(label) = &variable.label {
            sample.extend_from_slice(trim_padding(label));
        }
    }
    sample.extend_from_slice(&raw.dictionary.label_bytes);

    'cases: for case in &raw.cases {
        for value in case {
            if sample.len() >= DETECTION_SAMPLE_BYTES {
                break 'cases;
            }
            if let RawValue::Str(bytes) = value {
                sample.extend_from_slice(trim_padding(bytes));
            }
        }
    }

    sample.truncate(DETECTION_SAMPLE_BYTES);
    sample
}

/// Decode one byte string under the policy.
fn decode_bytes(bytes: &[u8], encoding: &'static Encoding, policy: DecodePolicy) -> Result<String> {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors && policy == DecodePolicy::Strict {
        return Err(ConvertError::DecodeFailed {
            encoding: encoding.name().to_string(),
        });
    }
    Ok(text.into_owned())
}

/// Parse the long-variable-names record into short → long mappings.
fn parse_long_names(
    dictionary: &RawDictionary,
    encoding: &'static Encoding,
    policy: DecodePolicy,
) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    if let Some(bytes) = &dictionary.long_names {
        let text = decode_bytes(trim_padding(bytes), encoding, policy)?;
        for pair in text.split('\t') {
            if let Some((short, long)) = pair.split_once('=') {
                map.insert(short.to_string(), long.to_string());
            }
        }
    }
    Ok(map)
}

/// Strip the space (and occasional NUL) padding SPSS writes after names
/// and string values.
fn trim_padding(bytes: &[u8]) -> &[u8] {
    let mut end = bytes.len();
    while end > 0 && (bytes[end - 1] == b' ' || bytes[end - 1] == 0) {
        end -= 1;
    }
    &bytes[..end]
}
