//! The `error` module defines the [`Hex2BinError`] enum that describes the errors that
//! can occur when decoding Intel HEX records or assembling a binary image.
//! It carries up to three pieces of information:
//! 1. When the error occurs, e.g., while parsing a line or while writing the image.
//! 2. What kind of error was encountered (via [`DecodeError`] or [`WriteError`]).
//! 3. What is the line number (if applicable), i.e., at which line of the hex input
//!    the decoding failed.

use crate::record::RecordType;
use std::error::Error;
use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum Hex2BinError {
    ParseRecordError(DecodeError, usize),
    WriteImageError(WriteError),
}

impl fmt::Display for Hex2BinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseRecordError(base_err, line) => {
                write!(
                    f,
                    "Error encountered during record parsing at line #{line} of the hex file:\n{base_err}",
                )
            }
            Self::WriteImageError(base_err) => {
                write!(
                    f,
                    "Error encountered during assembly of binary image:\n{base_err}",
                )
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Record does not begin with a ':'
    MissingStartMarker,
    /// Record contains non-hexadecimal characters
    InvalidCharacters,
    /// Record has fewer hex digits than its declared length requires
    Truncated,
    /// Record has more hex digits than its declared length allows
    TrailingCharacters,
    /// Record checksum mismatch (expected, found)
    ChecksumMismatch(u8, u8),
    /// Record type code is not one of the six defined types
    UnknownRecordType(u8),
    /// Address extension record without exactly 2 data bytes
    MalformedExtensionRecord(RecordType, usize),
    /// Payload does not fit into a single record
    PayloadTooLong(usize),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStartMarker => {
                write!(f, "Missing start code ':'")
            }
            Self::InvalidCharacters => {
                write!(f, "Record contains invalid character(s)")
            }
            Self::Truncated => {
                write!(f, "Record is shorter than its declared length")
            }
            Self::TrailingCharacters => {
                write!(f, "Record is longer than its declared length")
            }
            Self::ChecksumMismatch(expected, actual) => {
                write!(
                    f,
                    "Invalid record checksum - expected: 0x{expected:02X}, found: 0x{actual:02X}"
                )
            }
            Self::UnknownRecordType(code) => {
                write!(f, "Unknown record type 0x{code:02X}")
            }
            Self::MalformedExtensionRecord(rtype, actual) => {
                write!(
                    f,
                    "For record type {rtype:?} expected data length is 2 bytes, found {actual}"
                )
            }
            Self::PayloadTooLong(length) => {
                write!(f, "Payload of {length} bytes exceeds the 255 byte record limit")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteError {
    /// No data records were present to write
    EmptyInput,
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => {
                write!(f, "Hex input has no data records")
            }
        }
    }
}

impl Error for Hex2BinError {}
impl Error for DecodeError {}
impl Error for WriteError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_line_number() {
        // Arrange
        let err = Hex2BinError::ParseRecordError(DecodeError::ChecksumMismatch(0x40, 0x41), 7);

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains("line #7"));
        assert!(msg.contains("expected: 0x40, found: 0x41"));
    }

    #[test]
    fn test_display_malformed_extension_record() {
        let err = DecodeError::MalformedExtensionRecord(RecordType::ExtendedLinearAddress, 3);
        assert_eq!(
            err.to_string(),
            "For record type ExtendedLinearAddress expected data length is 2 bytes, found 3"
        );
    }
}
