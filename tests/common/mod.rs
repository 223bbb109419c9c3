//! Shared fixture builder for integration tests.
//!
//! Writes minimal little-endian, uncompressed SAV files: header,
//! variable records (with continuations for wide strings), an optional
//! codepage record, the dictionary terminator and the raw case data.

/// System-missing sentinel used by SPSS for absent numerics
pub const SYSMIS: f64 = f64::MIN;

#[derive(Clone)]
pub struct FixtureVariable {
    pub name: &'static str,
    /// 0 for numeric, otherwise the string width in bytes
    pub width: i32,
}

impl FixtureVariable {
    pub fn numeric(name: &'static str) -> Self {
        Self { name, width: 0 }
    }

    pub fn string(name: &'static str, width: i32) -> Self {
        Self { name, width }
    }

    fn element_count(&self) -> usize {
        if self.width <= 0 {
            1
        } else {
            (self.width as usize).div_ceil(8)
        }
    }
}

#[derive(Clone)]
pub enum FixtureValue {
    Num(f64),
    Missing,
    Str(Vec<u8>),
}

impl FixtureValue {
    pub fn text(s: &str) -> Self {
        FixtureValue::Str(s.as_bytes().to_vec())
    }
}

#[derive(Clone, Default)]
pub struct SavFixture {
    variables: Vec<FixtureVariable>,
    cases: Vec<Vec<FixtureValue>>,
    codepage: Option<i32>,
}

impl SavFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variable(mut self, variable: FixtureVariable) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn case(mut self, values: Vec<FixtureValue>) -> Self {
        assert_eq!(values.len(), self.variables.len());
        self.cases.push(values);
        self
    }

    pub fn codepage(mut self, code: i32) -> Self {
        self.codepage = Some(code);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();

        // header
        out.extend_from_slice(b"$FL2");
        out.extend_from_slice(&pad(b"@(#) SPSS DATA FILE - integration fixture", 60));
        push_i32(&mut out, 2); // layout code
        let elements: usize = self.variables.iter().map(|v| v.element_count()).sum();
        push_i32(&mut out, elements as i32);
        push_i32(&mut out, 0); // no compression
        push_i32(&mut out, 0); // no weight
        push_i32(&mut out, self.cases.len() as i32);
        out.extend_from_slice(&100.0f64.to_le_bytes()); // bias
        out.extend_from_slice(b"01 Jan 26");
        out.extend_from_slice(b"12:00:00");
        out.extend_from_slice(&pad(b"", 64));
        out.extend_from_slice(&[0, 0, 0]);
        assert_eq!(out.len(), 176);

        // variable records
        for variable in &self.variables {
            push_i32(&mut out, 2);
            push_i32(&mut out, variable.width);
            push_i32(&mut out, 0); // no label
            push_i32(&mut out, 0); // no missing values
            push_i32(&mut out, 0); // print format
            push_i32(&mut out, 0); // write format
            out.extend_from_slice(&pad(variable.name.as_bytes(), 8));

            for _ in 1..variable.element_count() {
                push_i32(&mut out, 2);
                push_i32(&mut out, -1);
                push_i32(&mut out, 0);
                push_i32(&mut out, 0);
                push_i32(&mut out, 0);
                push_i32(&mut out, 0);
                out.extend_from_slice(&pad(b"", 8));
            }
        }

        // integer-info record carrying the character code
        if let Some(code) = self.codepage {
            push_i32(&mut out, 7);
            push_i32(&mut out, 3);
            push_i32(&mut out, 4);
            push_i32(&mut out, 8);
            for value in [1, 2, 3, -1, 1, 1, 2, code] {
                push_i32(&mut out, value);
            }
        }

        // dictionary terminator
        push_i32(&mut out, 999);
        push_i32(&mut out, 0);

        // case data
        for case in &self.cases {
            for (variable, value) in self.variables.iter().zip(case) {
                match (variable.width, value) {
                    (0, FixtureValue::Num(v)) => out.extend_from_slice(&v.to_le_bytes()),
                    (0, FixtureValue::Missing) => out.extend_from_slice(&SYSMIS.to_le_bytes()),
                    (w, FixtureValue::Str(s)) if w > 0 => {
                        assert!(s.len() <= w as usize);
                        out.extend_from_slice(&pad(s, variable.element_count() * 8));
                    }
                    _ => panic!("fixture value does not match variable type"),
                }
            }
        }

        out
    }
}

fn push_i32(out: &mut Vec<u8>, value: i32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn pad(bytes: &[u8], len: usize) -> Vec<u8> {
    assert!(bytes.len() <= len);
    let mut padded = bytes.to_vec();
    padded.resize(len, b' ');
    padded
}
