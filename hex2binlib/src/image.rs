//! The `image` module provides the [`ImageWriter`], which linearizes an
//! [`AddressDataMap`] into a [`BinaryImage`], optionally clipped to an
//! [`ImageWindow`].
//!
//! With the default settings entries are visited in map order and their payloads
//! are concatenated. When a window with a non-zero end is given, the first entry
//! that does not fit inside it ends the image ([`WindowPolicy::Truncate`]).

use crate::error::{Hex2BinError, WriteError};
use crate::map::AddressDataMap;
use crate::record::StartAddress;
use log::{debug, trace};
use std::error::Error;
use std::io::Write;
use std::path::Path;

/// Byte used for address ranges that hold no data.
pub const PAD_BYTE: u8 = 0xFF;

/// `[start, end)` address range. `end == 0` means there is no upper bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageWindow {
    pub start: usize,
    pub end: usize,
}

impl ImageWindow {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Window that includes every entry.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { start: 0, end: 0 }
    }

    #[must_use]
    pub const fn is_bounded(&self) -> bool {
        self.end != 0
    }

    /// Whether `len` bytes starting at `address` lie completely inside the window.
    #[must_use]
    pub const fn contains(&self, address: usize, len: usize) -> bool {
        address >= self.start && address.saturating_add(len) <= self.end
    }
}

/// What happens to entries that do not fit inside a bounded window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WindowPolicy {
    /// Stop at the first entry outside the window
    #[default]
    Truncate,
    /// Skip entries outside the window and keep going
    Filter,
}

/// How included entries are placed in the output buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Layout {
    /// Payloads are appended one after another in map order
    #[default]
    Sequential,
    /// Payloads are placed at their address relative to the image start,
    /// address gaps hold the pad byte
    Absolute,
}

/// Assembled output of an [`ImageWriter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryImage {
    /// Image contents
    pub bytes: Vec<u8>,
    /// Window start, or address of the first map entry when unbounded
    pub start_address: usize,
    /// Window end, or address of the last map entry when unbounded
    pub end_address: usize,
    /// Declared size: distance between the first and last map entries plus the
    /// length of the last payload. May differ from `bytes.len()`.
    pub byte_count: usize,
    /// Entry point of the program, if the hex input declared one
    pub entry_point: Option<StartAddress>,
}

impl BinaryImage {
    /// Writes the image bytes to the specified path, creating missing parent
    /// directories.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    ///
    /// # Example
    /// ```
    /// use hex2binlib::{parse_file, write, ImageWindow};
    ///
    /// let map = parse_file("tests/fixtures/ih_valid_1.hex").unwrap();
    /// let image = write(&map, ImageWindow::unbounded()).unwrap();
    /// image.save("build/ex1/ih.bin").unwrap();
    ///
    /// assert_eq!(std::fs::metadata("build/ex1/ih.bin").unwrap().len(), 64);
    /// ```
    pub fn save<P: AsRef<Path>>(&self, filepath: P) -> Result<(), Box<dyn Error>> {
        // Ensure the parent directory exists
        if let Some(parent) = filepath.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&filepath)?;

        let mut writer = std::io::BufWriter::new(file);
        writer.write_all(&self.bytes)?;
        writer.flush()?;

        debug!(
            "Wrote {} bytes to {}",
            self.bytes.len(),
            filepath.as_ref().display()
        );
        Ok(())
    }
}

/// Image assembly settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageWriter {
    pad_byte: u8,
    policy: WindowPolicy,
    layout: Layout,
}

impl Default for ImageWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter {
    /// Writer with pad byte `0xFF`, [`WindowPolicy::Truncate`] and [`Layout::Sequential`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pad_byte: PAD_BYTE,
            policy: WindowPolicy::Truncate,
            layout: Layout::Sequential,
        }
    }

    #[must_use]
    pub const fn with_pad_byte(mut self, pad_byte: u8) -> Self {
        self.pad_byte = pad_byte;
        self
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: WindowPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub const fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub const fn pad_byte(&self) -> u8 {
        self.pad_byte
    }

    /// Linearize the map into a binary image.
    ///
    /// # Errors
    /// Returns [`WriteError::EmptyInput`] if the map holds no entries.
    ///
    /// # Example
    /// ```
    /// use hex2binlib::{AddressDataMap, ImageWindow, ImageWriter, Layout};
    ///
    /// let mut map = AddressDataMap::new();
    /// map.insert(0x00, vec![0x01, 0x02]);
    /// map.insert(0x04, vec![0x03, 0x04]);
    ///
    /// let writer = ImageWriter::new().with_layout(Layout::Absolute);
    /// let image = writer.write(&map, ImageWindow::unbounded()).unwrap();
    ///
    /// assert_eq!(image.bytes, vec![0x01, 0x02, 0xFF, 0xFF, 0x03, 0x04]);
    /// ```
    pub fn write(
        &self,
        map: &AddressDataMap,
        window: ImageWindow,
    ) -> Result<BinaryImage, Hex2BinError> {
        let (Some((first_addr, _)), Some((last_addr, last_data))) = (map.first(), map.last())
        else {
            return Err(Hex2BinError::WriteImageError(WriteError::EmptyInput));
        };

        let mut included: Vec<(usize, &[u8])> = Vec::with_capacity(map.len());
        for (address, data) in map {
            if window.is_bounded() && !window.contains(*address, data.len()) {
                match self.policy {
                    WindowPolicy::Truncate => {
                        debug!(
                            "Entry at 0x{address:08X} ({} bytes) is outside the window, stopping",
                            data.len()
                        );
                        break;
                    }
                    WindowPolicy::Filter => {
                        trace!("Skipping entry at 0x{address:08X}");
                        continue;
                    }
                }
            }
            included.push((*address, data.as_slice()));
        }

        let bytes = match self.layout {
            Layout::Sequential => included.iter().flat_map(|(_, data)| *data).copied().collect(),
            Layout::Absolute => self.place(&included, window),
        };

        let (start_address, end_address) = if window.is_bounded() {
            (window.start, window.end)
        } else {
            (first_addr, last_addr)
        };
        let byte_count = last_addr.saturating_sub(first_addr) + last_data.len();

        debug!(
            "Image holds {} of {} entries, {} bytes",
            included.len(),
            map.len(),
            bytes.len()
        );

        Ok(BinaryImage {
            bytes,
            start_address,
            end_address,
            byte_count,
            entry_point: map.start_address,
        })
    }

    /// Copy entries into a pad-filled buffer at their offset from the image origin.
    /// The origin is the window start for a bounded window, otherwise the lowest
    /// included address. The buffer ends at the highest included byte, so a
    /// bounded window never grows the buffer past its data.
    fn place(&self, included: &[(usize, &[u8])], window: ImageWindow) -> Vec<u8> {
        let origin = if window.is_bounded() {
            window.start
        } else {
            included.iter().map(|(addr, _)| *addr).min().unwrap_or(0)
        };
        let end = included
            .iter()
            .map(|(addr, data)| addr + data.len())
            .max()
            .unwrap_or(origin);

        let mut bytes = vec![self.pad_byte; end.saturating_sub(origin)];
        // Entries overlapping an earlier one overwrite it
        for (address, data) in included {
            let offset = address - origin;
            bytes[offset..offset + data.len()].copy_from_slice(data);
        }
        bytes
    }
}

/// Linearize the map with the default [`ImageWriter`].
///
/// # Errors
/// Returns [`WriteError::EmptyInput`] if the map holds no entries.
///
/// # Example
/// ```
/// use hex2binlib::{AddressDataMap, ImageWindow, write};
///
/// let mut map = AddressDataMap::new();
/// map.insert(0x0000, vec![0x01, 0x02]);
/// map.insert(0x0002, vec![0x03, 0x04]);
///
/// let image = write(&map, ImageWindow::new(0, 4)).unwrap();
///
/// assert_eq!(image.bytes, vec![0x01, 0x02, 0x03, 0x04]);
/// assert_eq!((image.start_address, image.end_address, image.byte_count), (0, 4, 4));
/// ```
pub fn write(map: &AddressDataMap, window: ImageWindow) -> Result<BinaryImage, Hex2BinError> {
    ImageWriter::new().write(map, window)
}
