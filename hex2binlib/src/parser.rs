//! The `parser` module turns Intel HEX text into an [`AddressDataMap`].
//!
//! Lines are decoded one by one with [`Record::parse`]. Extended segment and
//! extended linear address records update an [`AddressExtension`] accumulator
//! that is local to a single parse call; data records are stored at
//! `base + offset`. Parsing stops at the first End Of File record.

use crate::error::Hex2BinError;
use crate::map::AddressDataMap;
use crate::record::{Record, RecordType};
use log::{debug, trace};
use std::error::Error;
use std::path::Path;

/// Base address established by address extension records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressExtension {
    base: usize,
}

impl AddressExtension {
    #[must_use]
    pub const fn base(&self) -> usize {
        self.base
    }

    /// Absolute address of a data record offset.
    #[must_use]
    pub const fn absolute(&self, offset: u16) -> usize {
        self.base + offset as usize
    }

    /// Apply an extended segment (`value << 4`) or extended linear (`value << 16`)
    /// address record. Other record types leave the base unchanged.
    pub fn update(&mut self, record: &Record) {
        let Some(value) = record.extension_value() else {
            return;
        };
        match record.rtype {
            RecordType::ExtendedSegmentAddress => self.base = value << 4,
            RecordType::ExtendedLinearAddress => self.base = value << 16,
            _ => {}
        }
    }
}

/// Parse a sequence of Intel HEX lines.
///
/// Blank lines are skipped and a missing End Of File record is not an error.
///
/// # Errors
/// Returns [`Hex2BinError::ParseRecordError`] with the 1-based line number of the
/// first malformed record.
///
/// # Example
/// ```
/// use hex2binlib::parse;
///
/// let map = parse([":020000041000EA", ":04002000DEADBEEFA4", ":00000001FF"]).unwrap();
///
/// assert_eq!(map.len(), 1);
/// assert_eq!(map.payload_hex(0x1000_0020).as_deref(), Some("DEADBEEF"));
/// ```
pub fn parse<I, S>(lines: I) -> Result<AddressDataMap, Hex2BinError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut map = AddressDataMap::new();
    let mut extension = AddressExtension::default();

    for (index, line) in lines.into_iter().enumerate() {
        let line_number = index + 1;
        let line = line.as_ref().trim();

        if line.is_empty() {
            continue;
        }

        let record = Record::parse(line)
            .map_err(|err| Hex2BinError::ParseRecordError(err, line_number))?;

        match record.rtype {
            RecordType::Data => {
                let address = extension.absolute(record.offset);
                trace!("Data record at 0x{address:08X}, {} bytes", record.data.len());
                if map.insert(address, record.data).is_some() {
                    debug!("Line #{line_number} overwrites data at 0x{address:08X}");
                }
            }
            RecordType::EndOfFile => {
                debug!("End Of File record at line #{line_number}");
                break;
            }
            RecordType::ExtendedSegmentAddress | RecordType::ExtendedLinearAddress => {
                extension.update(&record);
                trace!("Base address set to 0x{:08X}", extension.base());
            }
            RecordType::StartSegmentAddress | RecordType::StartLinearAddress => {
                match record.start_address() {
                    Some(start) => map.start_address = Some(start),
                    None => debug!(
                        "Ignoring {:?} record with {} data bytes at line #{line_number}",
                        record.rtype,
                        record.data.len()
                    ),
                }
            }
        }
    }

    debug!("Parsed {} data entries", map.len());
    Ok(map)
}

/// Parse the raw contents of a hex file. Lines end with `\n`, `\r\n` or a
/// bare `\r`.
///
/// # Errors
/// Returns an error if any record before the End Of File record is malformed.
pub fn parse_bytes(raw_bytes: &[u8]) -> Result<AddressDataMap, Hex2BinError> {
    let lines = raw_bytes.split(|&b| b == b'\n').flat_map(|line| {
        line.strip_suffix(b"\r")
            .unwrap_or(line)
            .split(|&b| b == b'\r')
    });
    parse(lines.map(String::from_utf8_lossy))
}

/// Read and parse the hex file at the provided path.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```
/// use hex2binlib::parse_file;
///
/// let map = parse_file("tests/fixtures/ih_valid_1.hex").unwrap();
/// assert_eq!(map.len(), 4);
/// ```
pub fn parse_file<P: AsRef<Path>>(filepath: P) -> Result<AddressDataMap, Box<dyn Error>> {
    debug!("Loading Intel HEX file {}", filepath.as_ref().display());
    let raw_bytes = std::fs::read(&filepath)?;
    Ok(parse_bytes(&raw_bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::record::StartAddress;

    #[test]
    fn test_extended_linear_address() {
        // Arrange
        let lines = [":020000041000EA", ":04002000DEADBEEFA4"];

        // Act
        let map = parse(lines);

        // Assert
        let map = map.unwrap_or_default();
        assert_eq!(map.len(), 1);
        assert_eq!(map.addresses(), vec![0x1000_0020]);
        assert_eq!(map.payload_hex(0x1000_0020).as_deref(), Some("DEADBEEF"));
    }

    #[test]
    fn test_extended_segment_address() {
        // Arrange - base = 0x1200 << 4
        let lines = [":020000021200EA", ":04002000DEADBEEFA4"];

        // Act
        let map = parse(lines).unwrap_or_default();

        // Assert
        assert_eq!(map.addresses(), vec![0x0001_2020]);
    }

    #[test]
    fn test_extension_state_is_per_call() {
        // Arrange
        let extended = [":020000041000EA", ":04002000DEADBEEFA4"];
        let plain = [":04002000DEADBEEFA4"];

        // Act
        let _ = parse(extended);
        let map = parse(plain).unwrap_or_default();

        // Assert
        assert_eq!(map.addresses(), vec![0x0020]);
    }

    #[test]
    fn test_end_of_file_stops_parsing() {
        // Arrange - garbage after EOF must be ignored
        let lines = [":04002000DEADBEEFA4", ":00000001FF", "not a record"];

        // Act
        let map = parse(lines);

        // Assert
        assert_eq!(map.map(|m| m.len()), Ok(1));
    }

    #[test]
    fn test_missing_end_of_file_and_blank_lines() {
        let lines = ["", ":04002000DEADBEEFA4", "   ", ""];
        assert_eq!(parse(lines).map(|m| m.len()), Ok(1));
    }

    #[test]
    fn test_only_end_of_file() {
        let map = parse([":00000001FF"]);
        assert_eq!(map.map(|m| m.is_empty()), Ok(true));
    }

    #[test]
    fn test_error_reports_line_number() {
        // Arrange
        let lines = [":04002000DEADBEEFA4", "", ":04002000DEADBEEFA5"];

        // Act
        let res = parse(lines);

        // Assert
        assert_eq!(
            res,
            Err(Hex2BinError::ParseRecordError(
                DecodeError::ChecksumMismatch(0xA4, 0xA5),
                3
            ))
        );
    }

    #[test]
    fn test_start_address_records() {
        // Act
        let segment = parse([":0400000300001234B3", ":04002000DEADBEEFA4"]).unwrap_or_default();
        let linear = parse([":04000005000123458E"]).unwrap_or_default();

        // Assert
        assert_eq!(
            segment.start_address,
            Some(StartAddress::Segment {
                cs: 0x0000,
                ip: 0x1234
            })
        );
        assert_eq!(segment.len(), 1);
        assert_eq!(linear.start_address, Some(StartAddress::Linear(0x0001_2345)));
        assert!(linear.is_empty());
    }

    #[test]
    fn test_duplicate_address_last_write_wins() {
        // Arrange
        let lines = [
            ":020000000102FB", // 0x0000: 01 02
            ":020002000304F5", // 0x0002: 03 04
            ":02000000AABB99", // 0x0000: AA BB
        ];

        // Act
        let map = parse(lines).unwrap_or_default();

        // Assert
        assert_eq!(map.addresses(), vec![0x0000, 0x0002]);
        assert_eq!(map.payload_hex(0x0000).as_deref(), Some("AABB"));
    }

    #[test]
    fn test_parse_bytes_handles_crlf() {
        // Arrange
        let raw = b":020000041000EA\r\n:04002000DEADBEEFA4\r\n:00000001FF\r\n";

        // Act
        let map = parse_bytes(raw).unwrap_or_default();

        // Assert
        assert_eq!(map.addresses(), vec![0x1000_0020]);
    }

    #[test]
    fn test_parse_bytes_handles_bare_cr() {
        // Arrange
        let raw = b":04002000DEADBEEFA4\r:04003000CAFEBABE8C\r:00000001FF\r";

        // Act
        let map = parse_bytes(raw);

        // Assert
        let map = map.unwrap_or_else(|e| panic!("Expected a map, got: {e}"));
        assert_eq!(map.addresses(), vec![0x0020, 0x0030]);
    }

    #[test]
    fn test_parse_bytes_line_numbers_with_crlf() {
        let raw = b":04002000DEADBEEFA4\r\n:04003000CAFEBABE00\r\n";
        assert_eq!(
            parse_bytes(raw),
            Err(Hex2BinError::ParseRecordError(
                DecodeError::ChecksumMismatch(0x8C, 0x00),
                2
            ))
        );
    }

    #[test]
    fn test_parse_bytes_invalid_utf8() {
        let raw = b":04002000DEADBEEFA4\n:\xFF\xFE\n";
        assert_eq!(
            parse_bytes(raw),
            Err(Hex2BinError::ParseRecordError(
                DecodeError::InvalidCharacters,
                2
            ))
        );
    }
}
