//! Synthetic system-file builder for unit tests.
//!
//! Produces byte-exact SAV files covering the subset the reader
//! understands: both byte orders, plain and bytecode-compressed data,
//! numeric and string variables, dictionary extension records.

use crate::constants::{DEFAULT_COMPRESSION_BIAS, SYSMIS, bytecode, compression, record_type};

#[derive(Debug, Clone)]
pub struct TestVariable {
    pub name: String,
    pub width: i32,
    pub label: Option<Vec<u8>>,
}

impl TestVariable {
    pub fn numeric(name: &str) -> Self {
        Self {
            name: name.to_string(),
            width: 0,
            label: None,
        }
    }

    pub fn string(name: &str, width: i32) -> Self {
        assert!((1..=255).contains(&width));
        Self {
            name: name.to_string(),
            width,
            label: None,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.as_bytes().to_vec());
        self
    }

    pub fn with_label_bytes(mut self, label: &[u8]) -> Self {
        self.label = Some(label.to_vec());
        self
    }

    fn element_count(&self) -> usize {
        if self.width <= 0 {
            1
        } else {
            (self.width as usize).div_ceil(8)
        }
    }
}

#[derive(Debug, Clone)]
pub enum TestValue {
    Num(f64),
    Sysmis,
    Str(Vec<u8>),
}

#[derive(Debug, Clone, Default)]
pub struct SavBuilder {
    big_endian: bool,
    compressed: bool,
    variables: Vec<TestVariable>,
    cases: Vec<Vec<TestValue>>,
    encoding_record: Option<Vec<u8>>,
    codepage: Option<i32>,
    long_names: Option<Vec<u8>>,
    /// value labels applied to the first variable
    value_labels: Vec<(f64, Vec<u8>)>,
}

impl SavBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    pub fn compressed(mut self) -> Self {
        self.compressed = true;
        self
    }

    pub fn variable(mut self, variable: TestVariable) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn case(mut self, values: Vec<TestValue>) -> Self {
        assert_eq!(values.len(), self.variables.len(), "case width mismatch");
        self.cases.push(values);
        self
    }

    pub fn encoding_record(mut self, name: &str) -> Self {
        self.encoding_record = Some(name.as_bytes().to_vec());
        self
    }

    pub fn codepage(mut self, code: i32) -> Self {
        self.codepage = Some(code);
        self
    }

    pub fn long_names(mut self, pairs: &str) -> Self {
        self.long_names = Some(pairs.as_bytes().to_vec());
        self
    }

    pub fn value_label(mut self, value: f64, label: &[u8]) -> Self {
        self.value_labels.push((value, label.to_vec()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_header(&mut out);
        for variable in &self.variables {
            self.write_variable(&mut out, variable);
        }
        if !self.value_labels.is_empty() {
            self.write_value_labels(&mut out);
        }
        if let Some(code) = self.codepage {
            self.write_integer_info(&mut out, code);
        }
        if let Some(name) = &self.encoding_record {
            self.write_extension(&mut out, 20, name);
        }
        if let Some(pairs) = &self.long_names {
            self.write_extension(&mut out, 13, pairs);
        }
        self.push_i32(&mut out, record_type::DICT_TERMINATION);
        self.push_i32(&mut out, 0);

        if self.compressed {
            self.write_cases_bytecode(&mut out);
        } else {
            self.write_cases_plain(&mut out);
        }
        out
    }

    fn write_header(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b"$FL2");
        out.extend_from_slice(&pad(b"@(#) SPSS DATA FILE - testkit", 60));
        self.push_i32(out, 2); // layout code
        let elements: usize = self.variables.iter().map(|v| v.element_count()).sum();
        self.push_i32(out, elements as i32);
        self.push_i32(
            out,
            if self.compressed {
                compression::BYTECODE
            } else {
                compression::NONE
            },
        );
        self.push_i32(out, 0); // weight index
        self.push_i32(out, self.cases.len() as i32);
        self.push_f64(out, DEFAULT_COMPRESSION_BIAS);
        out.extend_from_slice(b"01 Jan 26");
        out.extend_from_slice(b"12:00:00");
        out.extend_from_slice(&pad(b"", 64));
        out.extend_from_slice(&[0, 0, 0]);
        assert_eq!(out.len(), crate::constants::HEADER_LEN);
    }

    fn write_variable(&self, out: &mut Vec<u8>, variable: &TestVariable) {
        let fmt = if variable.width == 0 {
            (5 << 16) | (8 << 8) | 2 // F8.2
        } else {
            (1 << 16) | ((variable.width as u32) << 8) // A<width>
        };

        self.push_i32(out, record_type::VARIABLE);
        self.push_i32(out, variable.width);
        self.push_i32(out, if variable.label.is_some() { 1 } else { 0 });
        self.push_i32(out, 0); // no missing values
        self.push_i32(out, fmt as i32);
        self.push_i32(out, fmt as i32);
        out.extend_from_slice(&pad(variable.name.as_bytes(), 8));
        if let Some(label) = &variable.label {
            self.push_i32(out, label.len() as i32);
            out.extend_from_slice(label);
            out.extend_from_slice(&vec![b' '; label.len().next_multiple_of(4) - label.len()]);
        }

        for _ in 1..variable.element_count() {
            self.push_i32(out, record_type::VARIABLE);
            self.push_i32(out, -1);
            self.push_i32(out, 0);
            self.push_i32(out, 0);
            self.push_i32(out, 0);
            self.push_i32(out, 0);
            out.extend_from_slice(&pad(b"", 8));
        }
    }

    fn write_value_labels(&self, out: &mut Vec<u8>) {
        out.reserve(self.value_labels.len() * 16);
        self.push_i32(out, record_type::VALUE_LABELS);
        self.push_i32(out, self.value_labels.len() as i32);
        for (value, label) in &self.value_labels {
            self.push_f64(out, *value);
            out.push(label.len() as u8);
            out.extend_from_slice(label);
            // length byte plus text padded to a multiple of 8
            let pad_len = (label.len() + 1).next_multiple_of(8) - label.len() - 1;
            out.extend_from_slice(&vec![b' '; pad_len]);
        }
        self.push_i32(out, record_type::VALUE_LABEL_VARS);
        self.push_i32(out, 1);
        self.push_i32(out, 1); // 1-based index of the first variable
    }

    fn write_integer_info(&self, out: &mut Vec<u8>, code: i32) {
        self.push_i32(out, record_type::EXTENSION);
        self.push_i32(out, 3);
        self.push_i32(out, 4);
        self.push_i32(out, 8);
        for value in [1, 2, 3, -1, 1, 1, 2, code] {
            self.push_i32(out, value);
        }
    }

    fn write_extension(&self, out: &mut Vec<u8>, subtype: i32, data: &[u8]) {
        self.push_i32(out, record_type::EXTENSION);
        self.push_i32(out, subtype);
        self.push_i32(out, 1);
        self.push_i32(out, data.len() as i32);
        out.extend_from_slice(data);
    }

    fn write_cases_plain(&self, out: &mut Vec<u8>) {
        for case in &self.cases {
            for (variable, value) in self.variables.iter().zip(case) {
                match (variable.width, value) {
                    (0, TestValue::Num(v)) => self.push_f64(out, *v),
                    (0, TestValue::Sysmis) => self.push_f64(out, SYSMIS),
                    (w, TestValue::Str(s)) if w > 0 => {
                        assert!(s.len() <= w as usize, "string exceeds variable width");
                        out.extend_from_slice(&pad(s, variable.element_count() * 8));
                    }
                    _ => panic!("test value does not match variable type"),
                }
            }
        }
    }

    fn write_cases_bytecode(&self, out: &mut Vec<u8>) {
        // (command code, optional trailing 8-byte datum)
        let mut elements: Vec<(u8, Option<[u8; 8]>)> = Vec::new();

        for case in &self.cases {
            for (variable, value) in self.variables.iter().zip(case) {
                match (variable.width, value) {
                    (0, TestValue::Sysmis) => elements.push((bytecode::SYSMIS, None)),
                    (0, TestValue::Num(v)) => {
                        let coded = *v + DEFAULT_COMPRESSION_BIAS;
                        if coded.fract() == 0.0 && (1.0..=251.0).contains(&coded) {
                            elements.push((coded as u8, None));
                        } else {
                            elements.push((bytecode::RAW_DATUM, Some(self.f64_bytes(*v))));
                        }
                    }
                    (w, TestValue::Str(s)) if w > 0 => {
                        assert!(s.len() <= w as usize, "string exceeds variable width");
                        let padded = pad(s, variable.element_count() * 8);
                        for chunk in padded.chunks(8) {
                            if chunk == b"        " {
                                elements.push((bytecode::ALL_SPACES, None));
                            } else {
                                elements.push((bytecode::RAW_DATUM, Some(chunk.try_into().unwrap())));
                            }
                        }
                    }
                    _ => panic!("test value does not match variable type"),
                }
            }
        }
        elements.push((bytecode::END_OF_FILE, None));

        for group in elements.chunks(8) {
            let mut commands = [bytecode::IGNORE; 8];
            for (slot, (code, _)) in commands.iter_mut().zip(group) {
                *slot = *code;
            }
            out.extend_from_slice(&commands);
            for (_, datum) in group {
                if let Some(datum) = datum {
                    out.extend_from_slice(datum);
                }
            }
        }
    }

    fn push_i32(&self, out: &mut Vec<u8>, value: i32) {
        if self.big_endian {
            out.extend_from_slice(&value.to_be_bytes());
        } else {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }

    fn push_f64(&self, out: &mut Vec<u8>, value: f64) {
        out.extend_from_slice(&self.f64_bytes(value));
    }

    fn f64_bytes(&self, value: f64) -> [u8; 8] {
        if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        }
    }
}

/// Space-pad (or keep) a byte string to exactly `len` bytes
fn pad(bytes: &[u8], len: usize) -> Vec<u8> {
    assert!(bytes.len() <= len, "field too long for {} bytes", len);
    let mut padded = bytes.to_vec();
    padded.resize(len, b' ');
    padded
}
