//! The `convert` module ties the parser and the image writer together into a
//! single hex-file to bin-file conversion.

use crate::image::{BinaryImage, ImageWindow, ImageWriter};
use crate::map::MapOrder;
use crate::parser::parse_file;
use log::info;
use std::error::Error;
use std::path::Path;

/// Settings of a hex to bin conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Converter {
    /// Order of the map entries handed to the writer
    pub order: MapOrder,
    /// Address window of the image
    pub window: ImageWindow,
    /// Image assembly settings
    pub writer: ImageWriter,
}

impl Converter {
    /// Converter with default order, an unbounded window and the default writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the hex file, assemble the image and write it to the output path.
    /// Nothing is written if parsing or assembly fails.
    ///
    /// # Errors
    /// Returns an error if either file cannot be accessed, if the hex file is
    /// malformed or if it holds no data records.
    ///
    /// # Example
    /// ```
    /// use hex2binlib::{Converter, ImageWindow};
    ///
    /// let converter = Converter {
    ///     window: ImageWindow::new(0x0000, 0x0020),
    ///     ..Converter::new()
    /// };
    /// let image = converter
    ///     .convert_file("tests/fixtures/ih_valid_1.hex", "build/ex2/ih.bin")
    ///     .unwrap();
    ///
    /// assert_eq!(image.bytes.len(), 32);
    /// assert_eq!(std::fs::metadata("build/ex2/ih.bin").unwrap().len(), 32);
    /// ```
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        hex_path: P,
        bin_path: Q,
    ) -> Result<BinaryImage, Box<dyn Error>> {
        let mut map = parse_file(&hex_path)?;
        map.reorder(self.order);

        let image = self.writer.write(&map, self.window)?;
        image.save(&bin_path)?;

        info!(
            "Converted {} -> {} ({} bytes)",
            hex_path.as_ref().display(),
            bin_path.as_ref().display(),
            image.bytes.len()
        );
        Ok(image)
    }
}
