//! Byte-level reader for the SPSS system-file container.
//!
//! Parses the 176-byte header, the dictionary records and the data
//! section (uncompressed or bytecode-compressed, either byte order) into
//! raw structures that keep all text as undecoded bytes. Nothing here
//! interprets a character encoding; that is the decode module's job.
//!
//! `ParseMode::Lenient` backs the recovery read strategy: a truncated
//! data section yields the complete cases read so far instead of an
//! error.

use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_COMPRESSION_BIAS, HEADER_LEN, SAV_MAGIC, ZSAV_MAGIC, bytecode, compression,
    extension_subtype, record_type,
};
use crate::error::{ConvertError, Result};

/// Byte order of the file, detected from the header layout code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// How tolerant the data-section reader is of damage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Any inconsistency is an error
    Strict,
    /// Keep complete cases when the data section is truncated
    Lenient,
}

/// Decoded fixed-size header fields
#[derive(Debug, Clone)]
pub struct RawHeader {
    /// Product string written by the creating software, undecoded
    pub product: Vec<u8>,
    pub layout_code: i32,
    /// 8-byte elements per case as declared by the header
    pub nominal_case_size: i32,
    pub compression: i32,
    pub weight_index: i32,
    /// Declared case count, -1 when unknown
    pub ncases: i32,
    /// Bytecode compression bias, normally 100
    pub bias: f64,
    /// File label, undecoded
    pub file_label: Vec<u8>,
    pub endian: Endian,
}

/// One variable from the dictionary. Continuation records for wide
/// strings are folded into their parent's segment count.
#[derive(Debug, Clone)]
pub struct RawVariable {
    /// 0 for numeric, otherwise the string width in bytes (1..=255)
    pub width: i32,
    /// Short name, 8 bytes padded with spaces
    pub name: Vec<u8>,
    /// Variable label, undecoded
    pub label: Option<Vec<u8>>,
}

impl RawVariable {
    pub fn is_string(&self) -> bool {
        self.width > 0
    }

    /// 8-byte elements this variable occupies in a case
    pub fn element_count(&self) -> usize {
        if self.width <= 0 {
            1
        } else {
            (self.width as usize).div_ceil(8)
        }
    }
}

/// The parsed dictionary: header plus everything needed to decode text
#[derive(Debug, Clone)]
pub struct RawDictionary {
    pub header: RawHeader,
    pub variables: Vec<RawVariable>,
    /// Contents of the encoding extension record, if present
    pub encoding_name: Option<Vec<u8>>,
    /// Character code from the integer-info extension record, if present
    pub codepage: Option<i32>,
    /// Contents of the long-variable-names record, if present
    pub long_names: Option<Vec<u8>>,
    /// Value-label text pooled for encoding detection
    pub label_bytes: Vec<u8>,
}

impl RawDictionary {
    /// Total 8-byte elements per case
    pub fn elements_per_case(&self) -> usize {
        self.variables.iter().map(|v| v.element_count()).sum()
    }
}

/// One cell as stored in the file
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Numeric cell; the system-missing sentinel is preserved as-is
    Num(f64),
    /// String cell, undecoded, still space-padded to the variable width
    Str(Vec<u8>),
}

/// A fully parsed system file
#[derive(Debug, Clone)]
pub struct RawFile {
    pub dictionary: RawDictionary,
    /// One entry per variable per case
    pub cases: Vec<Vec<RawValue>>,
    /// Set when lenient parsing dropped a partial trailing case
    pub truncated: bool,
}

/// Parse a whole system file from memory.
pub fn read_file(path: &Path, bytes: &[u8], mode: ParseMode) -> Result<RawFile> {
    let header = read_header(path, bytes)?;
    let mut cursor = Cursor::new(path, bytes, header.endian);
    cursor.skip(HEADER_LEN)?;

    let dictionary = read_dictionary(header, &mut cursor)?;
    if dictionary.variables.is_empty() {
        return Err(ConvertError::invalid_container(
            path,
            "dictionary defines no variables",
        ));
    }

    let (cases, truncated) = match dictionary.header.compression {
        compression::NONE => read_cases_plain(&dictionary, &mut cursor, mode)?,
        compression::BYTECODE => read_cases_bytecode(&dictionary, &mut cursor, mode)?,
        compression::ZLIB => {
            return Err(ConvertError::unsupported_feature(
                path,
                "zlib-compressed data (zsav)",
            ));
        }
        other => {
            return Err(ConvertError::invalid_container(
                path,
                format!("unknown compression mode {}", other),
            ));
        }
    };

    Ok(RawFile {
        dictionary,
        cases,
        truncated,
    })
}

/// Parse the fixed header and detect the byte order.
pub fn read_header(path: &Path, bytes: &[u8]) -> Result<RawHeader> {
    if bytes.len() < HEADER_LEN {
        return Err(ConvertError::invalid_container(
            path,
            format!("file is only {} bytes, header needs {}", bytes.len(), HEADER_LEN),
        ));
    }

    if bytes.starts_with(ZSAV_MAGIC) {
        return Err(ConvertError::unsupported_feature(
            path,
            "zlib-compressed data (zsav)",
        ));
    }
    if !bytes.starts_with(SAV_MAGIC) {
        return Err(ConvertError::invalid_container(
            path,
            "missing $FL2 signature",
        ));
    }

    // The layout code is written in the producer's native byte order and
    // is always 2 or 3; whichever order reads it back sanely wins.
    let layout_le = i32::from_le_bytes(bytes[64..68].try_into().unwrap());
    let layout_be = i32::from_be_bytes(bytes[64..68].try_into().unwrap());
    let (endian, layout_code) = if layout_le == 2 || layout_le == 3 {
        (Endian::Little, layout_le)
    } else if layout_be == 2 || layout_be == 3 {
        (Endian::Big, layout_be)
    } else {
        return Err(ConvertError::invalid_container(
            path,
            format!("unrecognized layout code 0x{:08x}", layout_le),
        ));
    };

    let read_i32 = |offset: usize| -> i32 {
        let raw: [u8; 4] = bytes[offset..offset + 4].try_into().unwrap();
        match endian {
            Endian::Little => i32::from_le_bytes(raw),
            Endian::Big => i32::from_be_bytes(raw),
        }
    };
    let raw_bias: [u8; 8] = bytes[84..92].try_into().unwrap();
    let bias = match endian {
        Endian::Little => f64::from_le_bytes(raw_bias),
        Endian::Big => f64::from_be_bytes(raw_bias),
    };

    Ok(RawHeader {
        product: bytes[4..64].to_vec(),
        layout_code,
        nominal_case_size: read_i32(68),
        compression: read_i32(72),
        weight_index: read_i32(76),
        ncases: read_i32(80),
        bias: if bias == 0.0 { DEFAULT_COMPRESSION_BIAS } else { bias },
        file_label: bytes[109..173].to_vec(),
        endian,
    })
}

fn read_dictionary(header: RawHeader, cursor: &mut Cursor) -> Result<RawDictionary> {
    let mut variables: Vec<RawVariable> = Vec::new();
    let mut pending_continuations = 0usize;
    let mut encoding_name = None;
    let mut codepage = None;
    let mut long_names = None;
    let mut label_bytes = Vec::new();

    loop {
        let rec_type = cursor.read_i32()?;
        match rec_type {
            record_type::VARIABLE => {
                read_variable_record(cursor, &mut variables, &mut pending_continuations)?;
            }
            record_type::VALUE_LABELS => {
                read_value_labels_record(cursor, &mut label_bytes)?;
            }
            record_type::VALUE_LABEL_VARS => {
                let count = cursor.read_count("value label variable count")?;
                cursor.skip(count * 4)?;
            }
            record_type::DOCUMENT => {
                let lines = cursor.read_count("document line count")?;
                cursor.skip(lines * 80)?;
            }
            record_type::EXTENSION => {
                read_extension_record(
                    cursor,
                    &mut encoding_name,
                    &mut codepage,
                    &mut long_names,
                )?;
            }
            record_type::DICT_TERMINATION => {
                cursor.read_i32()?; // filler
                break;
            }
            other => {
                return Err(cursor.invalid(format!("unknown record type {}", other)));
            }
        }
    }

    if pending_continuations != 0 {
        return Err(cursor.invalid("string variable is missing continuation records"));
    }

    Ok(RawDictionary {
        header,
        variables,
        encoding_name,
        codepage,
        long_names,
        label_bytes,
    })
}

fn read_variable_record(
    cursor: &mut Cursor,
    variables: &mut Vec<RawVariable>,
    pending_continuations: &mut usize,
) -> Result<()> {
    let width = cursor.read_i32()?;
    let has_label = cursor.read_i32()?;
    let n_missing = cursor.read_i32()?;
    cursor.skip(8)?; // print and write formats
    let name = cursor.take(8)?.to_vec();

    let label = if has_label == 1 {
        let len = cursor.read_count("variable label length")?;
        let text = cursor.take(len)?.to_vec();
        // label storage is padded to a multiple of 4
        cursor.skip(len.next_multiple_of(4) - len)?;
        Some(text)
    } else if has_label == 0 {
        None
    } else {
        return Err(cursor.invalid(format!("bad has_var_label flag {}", has_label)));
    };

    let missing_count = n_missing.unsigned_abs() as usize;
    if missing_count > 3 {
        return Err(cursor.invalid(format!("bad missing value count {}", n_missing)));
    }
    cursor.skip(missing_count * 8)?;

    if width == -1 {
        // continuation slot of a wide string variable
        if *pending_continuations == 0 {
            return Err(cursor.invalid("unexpected string continuation record"));
        }
        *pending_continuations -= 1;
        return Ok(());
    }

    if !(0..=255).contains(&width) {
        return Err(cursor.invalid(format!("bad variable width {}", width)));
    }
    if *pending_continuations != 0 {
        return Err(cursor.invalid("string variable is missing continuation records"));
    }

    let variable = RawVariable { width, name, label };
    *pending_continuations = variable.element_count() - 1;
    variables.push(variable);
    Ok(())
}

fn read_value_labels_record(cursor: &mut Cursor, label_bytes: &mut Vec<u8>) -> Result<()> {
    let count = cursor.read_count("value label count")?;
    for _ in 0..count {
        cursor.skip(8)?; // the labelled value
        let len = cursor.read_u8()? as usize;
        let text = cursor.take(len)?;
        label_bytes.extend_from_slice(text);
        // length byte plus text is padded to a multiple of 8
        cursor.skip((len + 1).next_multiple_of(8) - len - 1)?;
    }
    Ok(())
}

fn read_extension_record(
    cursor: &mut Cursor,
    encoding_name: &mut Option<Vec<u8>>,
    codepage: &mut Option<i32>,
    long_names: &mut Option<Vec<u8>>,
) -> Result<()> {
    let subtype = cursor.read_i32()?;
    let size = cursor.read_count("extension element size")?;
    let count = cursor.read_count("extension element count")?;
    let total = size
        .checked_mul(count)
        .ok_or_else(|| cursor.invalid("extension record size overflow"))?;
    let data = cursor.take(total)?;

    match subtype {
        extension_subtype::ENCODING => *encoding_name = Some(data.to_vec()),
        extension_subtype::LONG_NAMES => *long_names = Some(data.to_vec()),
        extension_subtype::INTEGER_INFO => {
            // eight 4-byte integers; the last is the character code
            if size == 4 && count >= 8 {
                let raw: [u8; 4] = data[28..32].try_into().unwrap();
                *codepage = Some(match cursor.endian {
                    Endian::Little => i32::from_le_bytes(raw),
                    Endian::Big => i32::from_be_bytes(raw),
                });
            }
        }
        _ => {}
    }
    Ok(())
}

fn read_cases_plain(
    dictionary: &RawDictionary,
    cursor: &mut Cursor,
    mode: ParseMode,
) -> Result<(Vec<Vec<RawValue>>, bool)> {
    let case_bytes = dictionary.elements_per_case() * 8;
    let declared = case_count_limit(dictionary);
    let mut cases = Vec::new();

    while cases.len() < declared.unwrap_or(usize::MAX) {
        if cursor.remaining() < case_bytes {
            if cursor.remaining() == 0 && declared.is_none() {
                break;
            }
            return match mode {
                ParseMode::Strict => Err(cursor.invalid("data section is truncated")),
                ParseMode::Lenient => Ok((cases, true)),
            };
        }
        let mut case = Vec::with_capacity(dictionary.variables.len());
        for variable in &dictionary.variables {
            if variable.is_string() {
                let stored = variable.element_count() * 8;
                let bytes = cursor.take(stored)?;
                case.push(RawValue::Str(bytes[..variable.width as usize].to_vec()));
            } else {
                case.push(RawValue::Num(cursor.read_f64()?));
            }
        }
        cases.push(case);
    }

    Ok((cases, false))
}

fn read_cases_bytecode(
    dictionary: &RawDictionary,
    cursor: &mut Cursor,
    mode: ParseMode,
) -> Result<(Vec<Vec<RawValue>>, bool)> {
    let declared = case_count_limit(dictionary);
    let mut stream = BytecodeStream::new(dictionary.header.bias);
    let mut cases = Vec::new();

    'cases: while cases.len() < declared.unwrap_or(usize::MAX) {
        let mut case = Vec::with_capacity(dictionary.variables.len());
        for (index, variable) in dictionary.variables.iter().enumerate() {
            if variable.is_string() {
                let mut buffer = Vec::with_capacity(variable.element_count() * 8);
                for _ in 0..variable.element_count() {
                    match stream.next_string_element(cursor)? {
                        Some(chunk) => buffer.extend_from_slice(&chunk),
                        None => {
                            return end_of_stream(cursor, cases, index == 0 && buffer.is_empty(), mode, declared);
                        }
                    }
                }
                buffer.truncate(variable.width as usize);
                case.push(RawValue::Str(buffer));
            } else {
                match stream.next_numeric_element(cursor)? {
                    Some(value) => case.push(RawValue::Num(value)),
                    None => {
                        return end_of_stream(cursor, cases, index == 0, mode, declared);
                    }
                }
            }
        }
        cases.push(case);

        if declared.is_none() && stream.at_end(cursor) {
            break 'cases;
        }
    }

    Ok((cases, false))
}

/// Shared handling for the compressed stream ending: clean between cases
/// is fine, inside a case depends on the parse mode.
fn end_of_stream(
    cursor: &Cursor,
    cases: Vec<Vec<RawValue>>,
    at_case_boundary: bool,
    mode: ParseMode,
    declared: Option<usize>,
) -> Result<(Vec<Vec<RawValue>>, bool)> {
    if at_case_boundary {
        match declared {
            Some(expected) if cases.len() < expected => match mode {
                ParseMode::Strict => Err(cursor.invalid(format!(
                    "compressed data ends after {} of {} cases",
                    cases.len(),
                    expected
                ))),
                ParseMode::Lenient => Ok((cases, true)),
            },
            _ => Ok((cases, false)),
        }
    } else {
        match mode {
            ParseMode::Strict => Err(cursor.invalid("compressed data is truncated mid-case")),
            ParseMode::Lenient => Ok((cases, true)),
        }
    }
}

fn case_count_limit(dictionary: &RawDictionary) -> Option<usize> {
    if dictionary.header.ncases >= 0 {
        Some(dictionary.header.ncases as usize)
    } else {
        None
    }
}

/// Decoder for the bytecode compression scheme: 8-byte groups of command
/// codes, each followed by the raw data blocks its codes call for.
struct BytecodeStream {
    bias: f64,
    commands: Vec<u8>,
    next_command: usize,
    finished: bool,
}

impl BytecodeStream {
    fn new(bias: f64) -> Self {
        Self {
            bias,
            commands: Vec::new(),
            next_command: 0,
            finished: false,
        }
    }

    fn next_code(&mut self, cursor: &mut Cursor) -> Result<Option<u8>> {
        loop {
            if self.finished {
                return Ok(None);
            }
            if self.next_command >= self.commands.len() {
                if cursor.remaining() < 8 {
                    self.finished = true;
                    return Ok(None);
                }
                self.commands = cursor.take(8)?.to_vec();
                self.next_command = 0;
            }
            let code = self.commands[self.next_command];
            self.next_command += 1;
            match code {
                bytecode::IGNORE => continue,
                bytecode::END_OF_FILE => {
                    self.finished = true;
                    return Ok(None);
                }
                other => return Ok(Some(other)),
            }
        }
    }

    fn next_numeric_element(&mut self, cursor: &mut Cursor) -> Result<Option<f64>> {
        match self.next_code(cursor)? {
            None => Ok(None),
            Some(bytecode::RAW_DATUM) => Ok(Some(cursor.read_f64()?)),
            Some(bytecode::SYSMIS) | Some(bytecode::ALL_SPACES) => {
                Ok(Some(crate::constants::SYSMIS))
            }
            Some(code) => Ok(Some(code as f64 - self.bias)),
        }
    }

    fn next_string_element(&mut self, cursor: &mut Cursor) -> Result<Option<[u8; 8]>> {
        match self.next_code(cursor)? {
            None => Ok(None),
            Some(bytecode::RAW_DATUM) => {
                let bytes = cursor.take(8)?;
                Ok(Some(bytes.try_into().unwrap()))
            }
            Some(bytecode::ALL_SPACES) | Some(bytecode::SYSMIS) => Ok(Some(*b"        ")),
            Some(code) => Err(cursor.invalid(format!(
                "numeric bytecode {} inside a string value",
                code
            ))),
        }
    }

    /// True once every remaining command is padding or the end marker
    fn at_end(&self, cursor: &Cursor) -> bool {
        if self.finished {
            return true;
        }
        let pending = self.commands[self.next_command..]
            .iter()
            .any(|&c| c != bytecode::IGNORE && c != bytecode::END_OF_FILE);
        !pending && cursor.remaining() < 8
    }
}

/// Positioned reader over the file bytes with endian-aware accessors
struct Cursor<'a> {
    path: &'a Path,
    bytes: &'a [u8],
    pos: usize,
    endian: Endian,
}

impl<'a> Cursor<'a> {
    fn new(path: &'a Path, bytes: &'a [u8], endian: Endian) -> Self {
        Self {
            path,
            bytes,
            pos: 0,
            endian,
        }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(self.invalid(format!(
                "unexpected end of file at offset {} (needed {} bytes)",
                self.pos, n
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_i32(&mut self) -> Result<i32> {
        let raw: [u8; 4] = self.take(4)?.try_into().unwrap();
        Ok(match self.endian {
            Endian::Little => i32::from_le_bytes(raw),
            Endian::Big => i32::from_be_bytes(raw),
        })
    }

    /// Read an i32 that must be a sane non-negative count
    fn read_count(&mut self, what: &str) -> Result<usize> {
        let value = self.read_i32()?;
        if value < 0 || value as usize > self.bytes.len() {
            return Err(self.invalid(format!("bad {}: {}", what, value)));
        }
        Ok(value as usize)
    }

    fn read_f64(&mut self) -> Result<f64> {
        let raw: [u8; 8] = self.take(8)?.try_into().unwrap();
        Ok(match self.endian {
            Endian::Little => f64::from_le_bytes(raw),
            Endian::Big => f64::from_be_bytes(raw),
        })
    }

    fn invalid(&self, reason: impl Into<String>) -> ConvertError {
        ConvertError::InvalidContainer {
            path: PathBuf::from(self.path),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SYSMIS;
    use crate::sav::testkit::{SavBuilder, TestValue, TestVariable};
    use std::path::Path;

    fn parse(bytes: &[u8]) -> Result<RawFile> {
        read_file(Path::new("test.sav"), bytes, ParseMode::Strict)
    }

    #[test]
    fn parses_uncompressed_numeric_and_string() {
        let bytes = SavBuilder::new()
            .variable(TestVariable::numeric("AGE"))
            .variable(TestVariable::string("NAME", 12))
            .case(vec![TestValue::Num(34.0), TestValue::Str(b"alice".to_vec())])
            .case(vec![TestValue::Sysmis, TestValue::Str(b"bob".to_vec())])
            .build();

        let raw = parse(&bytes).unwrap();
        assert_eq!(raw.dictionary.variables.len(), 2);
        assert_eq!(raw.dictionary.variables[0].width, 0);
        assert_eq!(raw.dictionary.variables[1].width, 12);
        assert_eq!(raw.cases.len(), 2);
        assert_eq!(raw.cases[0][0], RawValue::Num(34.0));
        assert_eq!(raw.cases[0][1], RawValue::Str(b"alice       ".to_vec()));
        assert_eq!(raw.cases[1][0], RawValue::Num(SYSMIS));
        assert!(!raw.truncated);
    }

    #[test]
    fn parses_big_endian_files() {
        let bytes = SavBuilder::new()
            .big_endian()
            .variable(TestVariable::numeric("X"))
            .case(vec![TestValue::Num(1.5)])
            .case(vec![TestValue::Num(-2.0)])
            .build();

        let raw = parse(&bytes).unwrap();
        assert_eq!(raw.dictionary.header.endian, Endian::Big);
        assert_eq!(raw.cases.len(), 2);
        assert_eq!(raw.cases[0][0], RawValue::Num(1.5));
        assert_eq!(raw.cases[1][0], RawValue::Num(-2.0));
    }

    #[test]
    fn parses_bytecode_compressed_data() {
        let bytes = SavBuilder::new()
            .compressed()
            .variable(TestVariable::numeric("A"))
            .variable(TestVariable::string("S", 8))
            .case(vec![TestValue::Num(3.0), TestValue::Str(b"hi".to_vec())])
            .case(vec![TestValue::Num(250.5), TestValue::Str(b"".to_vec())])
            .case(vec![TestValue::Sysmis, TestValue::Str(b"padded".to_vec())])
            .build();

        let raw = parse(&bytes).unwrap();
        assert_eq!(raw.cases.len(), 3);
        assert_eq!(raw.cases[0][0], RawValue::Num(3.0));
        assert_eq!(raw.cases[0][1], RawValue::Str(b"hi      ".to_vec()));
        assert_eq!(raw.cases[1][0], RawValue::Num(250.5));
        assert_eq!(raw.cases[1][1], RawValue::Str(b"        ".to_vec()));
        assert_eq!(raw.cases[2][0], RawValue::Num(SYSMIS));
        assert_eq!(raw.cases[2][1], RawValue::Str(b"padded  ".to_vec()));
    }

    #[test]
    fn carries_encoding_and_codepage_records() {
        let bytes = SavBuilder::new()
            .encoding_record("WINDOWS-1252")
            .codepage(1252)
            .variable(TestVariable::numeric("X"))
            .case(vec![TestValue::Num(1.0)])
            .build();

        let raw = parse(&bytes).unwrap();
        assert_eq!(
            raw.dictionary.encoding_name.as_deref(),
            Some(b"WINDOWS-1252".as_slice())
        );
        assert_eq!(raw.dictionary.codepage, Some(1252));
    }

    #[test]
    fn rejects_non_sav_bytes() {
        let err = parse(b"PK\x03\x04 definitely not a sav file, padded until long enough ............................................................................................................................").unwrap_err();
        assert!(matches!(err, ConvertError::InvalidContainer { .. }));
    }

    #[test]
    fn rejects_zsav() {
        let mut bytes = SavBuilder::new()
            .variable(TestVariable::numeric("X"))
            .build();
        bytes[..4].copy_from_slice(b"$FL3");
        let err = parse(&bytes).unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedFeature { .. }));
    }

    #[test]
    fn strict_rejects_truncated_data() {
        let mut bytes = SavBuilder::new()
            .variable(TestVariable::numeric("X"))
            .case(vec![TestValue::Num(1.0)])
            .case(vec![TestValue::Num(2.0)])
            .build();
        bytes.truncate(bytes.len() - 4);

        let err = parse(&bytes).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidContainer { .. }));
    }

    #[test]
    fn lenient_keeps_complete_cases_from_truncated_data() {
        let mut bytes = SavBuilder::new()
            .variable(TestVariable::numeric("X"))
            .case(vec![TestValue::Num(1.0)])
            .case(vec![TestValue::Num(2.0)])
            .build();
        bytes.truncate(bytes.len() - 4);

        let raw = read_file(Path::new("test.sav"), &bytes, ParseMode::Lenient).unwrap();
        assert_eq!(raw.cases.len(), 1);
        assert!(raw.truncated);
        assert_eq!(raw.cases[0][0], RawValue::Num(1.0));
    }

    #[test]
    fn value_label_records_are_walked_and_pooled() {
        let bytes = SavBuilder::new()
            .variable(TestVariable::numeric("RATING"))
            .value_label(1.0, b"strongly agree")
            .value_label(2.0, b"agree")
            .case(vec![TestValue::Num(1.0)])
            .case(vec![TestValue::Num(2.0)])
            .build();

        let raw = parse(&bytes).unwrap();
        assert_eq!(raw.cases.len(), 2);
        let pooled = &raw.dictionary.label_bytes;
        assert!(pooled.windows(14).any(|w| w == b"strongly agree"));
        assert!(pooled.windows(5).any(|w| w == b"agree"));
    }

    #[test]
    fn variable_labels_survive_parsing() {
        let bytes = SavBuilder::new()
            .variable(TestVariable::numeric("Q1").with_label("First question"))
            .case(vec![TestValue::Num(5.0)])
            .build();

        let raw = parse(&bytes).unwrap();
        assert_eq!(
            raw.dictionary.variables[0].label.as_deref(),
            Some(b"First question".as_slice())
        );
    }

    #[test]
    fn wide_strings_consume_continuation_records() {
        let bytes = SavBuilder::new()
            .variable(TestVariable::string("COMMENT", 20))
            .case(vec![TestValue::Str(b"a rather long remark".to_vec())])
            .build();

        let raw = parse(&bytes).unwrap();
        assert_eq!(raw.dictionary.variables.len(), 1);
        assert_eq!(raw.dictionary.elements_per_case(), 3);
        assert_eq!(
            raw.cases[0][0],
            RawValue::Str(b"a rather long remark".to_vec())
        );
    }
}
