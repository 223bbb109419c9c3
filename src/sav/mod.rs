//! Reading SPSS system files.
//!
//! The `raw` module parses the binary container into byte-level
//! structures without committing to a text encoding; the `decode` module
//! turns those into a [`Table`](crate::models::Table) under a chosen
//! encoding and error policy. Keeping the two apart is what lets the
//! strategy chain re-decode the same bytes under different encodings.

pub mod decode;
pub mod raw;

#[cfg(test)]
pub(crate) mod testkit;

pub use decode::{DecodeOptions, DecodePolicy, EncodingChoice};
pub use raw::{ParseMode, RawFile};
