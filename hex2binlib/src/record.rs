//! The `record` module defines the [`Record`] and [`RecordType`] which are used for decoding
//! (and encoding) single Intel HEX lines.

use crate::error::DecodeError;
use std::fmt;

mod sizes {
    pub const BYTE_CHAR_LEN: usize = 2;
    pub const HEADER_LEN: usize = (1 + 2 + 1) * BYTE_CHAR_LEN; // len + addr + rtype
    pub const CHECKSUM_LEN: usize = BYTE_CHAR_LEN;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordType {
    Data = 0x0,
    EndOfFile = 0x1,
    ExtendedSegmentAddress = 0x2,
    StartSegmentAddress = 0x3,
    ExtendedLinearAddress = 0x4,
    StartLinearAddress = 0x5,
}

impl TryFrom<u8> for RecordType {
    type Error = DecodeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x00 => Ok(Self::Data),
            0x01 => Ok(Self::EndOfFile),
            0x02 => Ok(Self::ExtendedSegmentAddress),
            0x03 => Ok(Self::StartSegmentAddress),
            0x04 => Ok(Self::ExtendedLinearAddress),
            0x05 => Ok(Self::StartLinearAddress),
            _ => Err(DecodeError::UnknownRecordType(code)),
        }
    }
}

/// Program entry point carried by a start address record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StartAddress {
    /// CS:IP pair of a `StartSegmentAddress` record
    Segment { cs: u16, ip: u16 },
    /// EIP of a `StartLinearAddress` record
    Linear(u32),
}

impl fmt::Display for StartAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Segment { cs, ip } => write!(f, "{cs:04X}:{ip:04X}"),
            Self::Linear(eip) => write!(f, "0x{eip:08X}"),
        }
    }
}

/// Decoded form of one Intel HEX line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub length: u8,
    pub offset: u16,
    pub rtype: RecordType,
    pub data: Vec<u8>,
    pub checksum: u8,
}

impl Record {
    /// Calculate checksum (two's complement of the byte sum) from u8 array.
    #[must_use]
    pub fn calculate_checksum(data: &[u8]) -> u8 {
        let sum = data.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
        (!sum).wrapping_add(1)
    }

    /// Calculate checksum from the fields of the Record instance.
    #[must_use]
    pub fn calculate_checksum_from_self(&self) -> u8 {
        let [offset_high, offset_low] = self.offset.to_be_bytes();
        let header = [self.length, offset_high, offset_low, self.rtype as u8];
        let sum = header
            .iter()
            .chain(&self.data)
            .fold(0u8, |acc, b| acc.wrapping_add(*b));
        (!sum).wrapping_add(1)
    }

    /// Create a record from offset, type and payload. The checksum is computed.
    ///
    /// # Errors
    /// - Returns an error if the payload does not fit into a single record
    /// - Returns an error if an address extension record does not carry exactly 2 bytes
    ///
    /// # Example
    /// ```
    /// use hex2binlib::{Record, RecordType};
    ///
    /// let record = Record::create(0x0000, RecordType::ExtendedLinearAddress, &[0x10, 0x00]).unwrap();
    /// assert_eq!(record.to_string(), ":020000041000EA");
    /// ```
    pub fn create(offset: u16, rtype: RecordType, data: &[u8]) -> Result<Self, DecodeError> {
        let length =
            u8::try_from(data.len()).map_err(|_| DecodeError::PayloadTooLong(data.len()))?;

        if matches!(
            rtype,
            RecordType::ExtendedSegmentAddress | RecordType::ExtendedLinearAddress
        ) && data.len() != 2
        {
            return Err(DecodeError::MalformedExtensionRecord(rtype, data.len()));
        }

        let mut record = Self {
            length,
            offset,
            rtype,
            data: data.to_vec(),
            checksum: 0,
        };
        record.checksum = record.calculate_checksum_from_self();
        Ok(record)
    }

    /// Parse the record string into Record.
    ///
    /// # Errors
    /// Returns the [`DecodeError`] describing the first problem found in the line.
    ///
    /// # Example
    /// ```
    /// use hex2binlib::{Record, RecordType};
    ///
    /// let record = Record::parse(":04002000DEADBEEFA4").unwrap();
    /// assert_eq!(record.rtype, RecordType::Data);
    /// assert_eq!(record.offset, 0x0020);
    /// assert_eq!(record.data, vec![0xDE, 0xAD, 0xBE, 0xEF]);
    /// ```
    pub fn parse(line: &str) -> Result<Self, DecodeError> {
        // Check for start code
        let digits = line
            .strip_prefix(':')
            .ok_or(DecodeError::MissingStartMarker)?
            .as_bytes();

        // Validate all characters are hexadecimal
        if !digits.iter().all(u8::is_ascii_hexdigit) {
            return Err(DecodeError::InvalidCharacters);
        }

        // A dangling nibble can never form a complete record
        if digits.len() < sizes::BYTE_CHAR_LEN || digits.len() % 2 != 0 {
            return Err(DecodeError::Truncated);
        }

        // Validate record's size against its declared length
        let length = byte_at(digits, 0);
        let record_end =
            sizes::HEADER_LEN + sizes::BYTE_CHAR_LEN * length as usize + sizes::CHECKSUM_LEN;
        if digits.len() < record_end {
            return Err(DecodeError::Truncated);
        } else if digits.len() > record_end {
            return Err(DecodeError::TrailingCharacters);
        }

        let raw: Vec<u8> = (0..record_end)
            .step_by(sizes::BYTE_CHAR_LEN)
            .map(|i| byte_at(digits, i))
            .collect();
        let (body, checksum) = raw.split_at(raw.len() - 1);
        let checksum = checksum[0];

        // Validate checksum
        let calc_checksum = Self::calculate_checksum(body);
        if calc_checksum != checksum {
            return Err(DecodeError::ChecksumMismatch(calc_checksum, checksum));
        }

        let rtype = RecordType::try_from(body[3])?;
        let data = body[4..].to_vec();

        if matches!(
            rtype,
            RecordType::ExtendedSegmentAddress | RecordType::ExtendedLinearAddress
        ) && data.len() != 2
        {
            return Err(DecodeError::MalformedExtensionRecord(rtype, data.len()));
        }

        Ok(Self {
            length,
            offset: u16::from_be_bytes([body[1], body[2]]),
            rtype,
            data,
            checksum,
        })
    }

    /// Big-endian value of the first two payload bytes (address extension records).
    #[must_use]
    pub fn extension_value(&self) -> Option<usize> {
        match self.data.as_slice() {
            [high, low] => Some(usize::from(u16::from_be_bytes([*high, *low]))),
            _ => None,
        }
    }

    /// Entry point carried by a start address record with a 4 byte payload.
    #[must_use]
    pub fn start_address(&self) -> Option<StartAddress> {
        let [b0, b1, b2, b3] = self.data.as_slice() else {
            return None;
        };
        match self.rtype {
            RecordType::StartSegmentAddress => Some(StartAddress::Segment {
                cs: u16::from_be_bytes([*b0, *b1]),
                ip: u16::from_be_bytes([*b2, *b3]),
            }),
            RecordType::StartLinearAddress => {
                Some(StartAddress::Linear(u32::from_be_bytes([*b0, *b1, *b2, *b3])))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            ":{:02X}{:04X}{:02X}{}{:02X}",
            self.length,
            self.offset,
            self.rtype as u8,
            encode_hex(&self.data),
            self.checksum
        )
    }
}

/// Render bytes as upper-case hex digits, two per byte.
#[must_use]
pub fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

/// Convert the pair of ASCII hex digits at `index` into a byte.
/// Digits must be validated beforehand.
const fn byte_at(digits: &[u8], index: usize) -> u8 {
    const fn nibble(ch: u8) -> u8 {
        match ch {
            b'0'..=b'9' => ch - b'0',
            b'a'..=b'f' => ch - b'a' + 10,
            b'A'..=b'F' => ch - b'A' + 10,
            _ => 0,
        }
    }
    (nibble(digits[index]) << 4) | nibble(digits[index + 1])
}
