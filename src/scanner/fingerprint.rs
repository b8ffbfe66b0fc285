//! Fixed-width content fingerprints.
//!
//! A [`Fingerprint`] is the bit vector an external perceptual hasher produces
//! for one file. Bits are stored most significant first, so the hexadecimal
//! form printed by common pHash implementations parses directly:
//! `"8f373714acfcf4d0"` is a 64-bit fingerprint whose bit 0 is the top bit of
//! `0x8f`.
//!
//! # Example
//!
//! ```
//! use simdupe::scanner::Fingerprint;
//!
//! let fp: Fingerprint = "8f373714acfcf4d0".parse().unwrap();
//! assert_eq!(fp.width(), 64);
//! assert!(fp.bit(0));
//! assert_eq!(fp.to_string(), "8f373714acfcf4d0");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when building a fingerprint.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FingerprintError {
    /// The input contained no bits.
    #[error("Fingerprint is empty")]
    Empty,

    /// Hex input had an odd number of digits.
    #[error("Fingerprint hex has odd length {0}")]
    OddLength(usize),

    /// Hex input contained a non-hex character.
    #[error("Invalid hex digit {digit:?} at position {position}")]
    InvalidDigit {
        /// The offending character
        digit: char,
        /// Character offset in the input
        position: usize,
    },
}

/// Immutable fixed-width bit vector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint {
    bytes: Box<[u8]>,
}

impl Fingerprint {
    /// Create a fingerprint from raw bytes. The width is `8 * bytes.len()`.
    ///
    /// # Errors
    ///
    /// Returns [`FingerprintError::Empty`] for an empty slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FingerprintError> {
        if bytes.is_empty() {
            return Err(FingerprintError::Empty);
        }
        Ok(Self {
            bytes: bytes.into(),
        })
    }

    /// Create a 64-bit fingerprint from an integer (big-endian bit order).
    #[must_use]
    pub fn from_u64(value: u64) -> Self {
        Self {
            bytes: value.to_be_bytes().into(),
        }
    }

    /// Parse a fingerprint from its hexadecimal text form.
    ///
    /// Surrounding whitespace is ignored and digits are case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns an error for empty input, an odd digit count, or a non-hex
    /// character.
    pub fn from_hex(hex: &str) -> Result<Self, FingerprintError> {
        let hex = hex.trim();
        if hex.is_empty() {
            return Err(FingerprintError::Empty);
        }
        if hex.len() % 2 != 0 {
            return Err(FingerprintError::OddLength(hex.len()));
        }

        let mut bytes = Vec::with_capacity(hex.len() / 2);
        let mut high = 0u8;
        for (position, digit) in hex.chars().enumerate() {
            let nibble = digit
                .to_digit(16)
                .ok_or(FingerprintError::InvalidDigit { digit, position })?
                as u8;
            if position % 2 == 0 {
                high = nibble;
            } else {
                bytes.push((high << 4) | nibble);
            }
        }

        Self::from_bytes(&bytes)
    }

    /// Width in bits.
    #[must_use]
    pub fn width(&self) -> u32 {
        (self.bytes.len() * 8) as u32
    }

    /// Raw bytes, most significant bit first.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Value of bit `index` (0 = most significant bit of the first byte).
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    #[must_use]
    pub fn bit(&self, index: u32) -> bool {
        let byte = self.bytes[(index / 8) as usize];
        (byte >> (7 - index % 8)) & 1 == 1
    }

    /// Pack `len` bits starting at `start` into an integer, first bit highest.
    ///
    /// Used to derive bucket keys. `len` must be at most 64 and the range must
    /// lie inside the fingerprint.
    #[must_use]
    pub fn bits(&self, start: u32, len: u32) -> u64 {
        debug_assert!(len <= 64, "key of {} bits does not fit in u64", len);
        debug_assert!(start + len <= self.width());
        (start..start + len).fold(0u64, |key, i| (key << 1) | u64::from(self.bit(i)))
    }

    /// Lowercase hex representation.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Fingerprint {
    type Err = FingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}
