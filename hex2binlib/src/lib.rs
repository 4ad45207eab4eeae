//! # `hex2binlib`
//!
//! `hex2binlib` is a Rust library for converting Intel HEX files into raw binary images.
//!
//! The library provides:
//! - Record decoding and encoding (via [`Record`] struct).
//! - Parser that builds an ordered address -> payload map (via [`parse`] and [`AddressDataMap`]).
//! - Image writer with address windowing (via [`ImageWriter`] and [`ImageWindow`]).
//! - Error handling with [`Hex2BinError`].
//!
//! ## Example
//!
//! ```
//! use hex2binlib::{parse_file, write, ImageWindow};
//!
//! let map = parse_file("tests/fixtures/ih_valid_1.hex").unwrap();
//! let image = write(&map, ImageWindow::unbounded()).unwrap();
//! image.save("build/ex0/ih.bin").unwrap();
//! ```

mod convert;
mod error;
mod image;
mod map;
mod parser;
mod record;

// Public APIs
pub use convert::Converter;
pub use error::{DecodeError, Hex2BinError, WriteError};
pub use image::{BinaryImage, ImageWindow, ImageWriter, Layout, PAD_BYTE, WindowPolicy, write};
pub use map::{AddressDataMap, MapOrder};
pub use parser::{AddressExtension, parse, parse_bytes, parse_file};
pub use record::{Record, RecordType, StartAddress};
