//! Moderation codes: unguessable per-block tokens that authorize a verdict.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

pub const DEFAULT_MCODE_LENGTH: usize = 8;
pub const MAX_MCODE_LENGTH: usize = 128;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Supported code lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McodeSize {
    Short,
    Medium,
    Long,
    Max,
}

impl McodeSize {
    pub fn len(self) -> usize {
        match self {
            McodeSize::Short => 8,
            McodeSize::Medium => 32,
            McodeSize::Long => 64,
            McodeSize::Max => MAX_MCODE_LENGTH,
        }
    }

    /// Smallest preset that fits `length`, saturating at `Max`.
    pub fn fitting(length: usize) -> Self {
        [McodeSize::Short, McodeSize::Medium, McodeSize::Long]
            .into_iter()
            .find(|size| length <= size.len())
            .unwrap_or(McodeSize::Max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModerationCode(String);

impl ModerationCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModerationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModerationCode {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ModerationCode {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for ModerationCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Random code over `[A-Za-z0-9_-]`.
///
/// Lengths above [`MAX_MCODE_LENGTH`] fall back to [`DEFAULT_MCODE_LENGTH`]
/// instead of failing.
pub fn generate_mcode(length: usize) -> ModerationCode {
    let length = if length > MAX_MCODE_LENGTH {
        DEFAULT_MCODE_LENGTH
    } else {
        length
    };

    let mut rng = rand::thread_rng();
    let code = (0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    ModerationCode(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_length() {
        assert_eq!(generate_mcode(DEFAULT_MCODE_LENGTH).as_str().len(), 8);
    }

    #[test]
    fn test_out_of_range_falls_back_to_default() {
        for length in [129, 500, usize::MAX] {
            assert_eq!(generate_mcode(length).as_str().len(), DEFAULT_MCODE_LENGTH);
        }
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert_eq!(generate_mcode(0).as_str().len(), 0);
        assert_eq!(generate_mcode(128).as_str().len(), 128);
    }

    #[test]
    fn test_alphabet() {
        let code = generate_mcode(128);
        assert!(code
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_codes_differ() {
        assert_ne!(generate_mcode(32), generate_mcode(32));
    }

    #[test]
    fn test_size_presets() {
        assert_eq!(McodeSize::fitting(1).len(), 8);
        assert_eq!(McodeSize::fitting(8).len(), 8);
        assert_eq!(McodeSize::fitting(9).len(), 32);
        assert_eq!(McodeSize::fitting(64).len(), 64);
        assert_eq!(McodeSize::fitting(1000).len(), 128);
    }
}
