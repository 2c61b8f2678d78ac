/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Compressors for blocks of pixel data
//!
//! An EXR image is stored in chunks of a few scan lines or a tile. Every chunk
//! is compressed on its own by a [`Compressor`], created for a given compression
//! method by [`new_compressor`] (scan lines) or [`new_tile_compressor`] (tiles).
//!
//! Uncompressed data is laid out line by line, and within a line
//! channel by channel in the order of the [`PixelLayout`], each channel holding
//! the samples of that line. Multi-byte samples are little endian unless the
//! compressor reports [`Format::Native`].
//!
//! # Example
//! ```
//! use zune_exr::{
//!     new_compressor, Channel, Compression, CompressorOptions, PixelLayout, PixelType, Region
//! };
//!
//! let layout = PixelLayout::new(Region::new(0, 0, 63, 63))
//!     .with_channel(Channel::new("Y", PixelType::Half))
//!     .unwrap();
//! let line_size = layout.max_scan_line_size();
//!
//! let mut compressor =
//!     new_compressor(Compression::Zip, line_size, &layout, CompressorOptions::default()).unwrap();
//!
//! let pixels = vec![0_u8; line_size * compressor.num_scan_lines()];
//! let compressed = compressor.compress(&pixels, 0).unwrap().to_vec();
//! let restored = compressor.uncompress(&compressed, 0).unwrap();
//! assert_eq!(restored, &pixels[..]);
//! ```
use alloc::boxed::Box;

use log::debug;

use crate::channel::{PixelLayout, Region};
use crate::compressor::b44::B44Compressor;
use crate::compressor::none::NoCompressor;
use crate::compressor::rle::RleCompressor;
#[cfg(feature = "zip")]
use crate::compressor::zip::ZipCompressor;
use crate::errors::ExrCompressionErrors;
use crate::options::CompressorOptions;

mod b44;
mod none;
mod predictor;
mod rle;
#[cfg(feature = "zip")]
mod zip;

/// Byte order of uncompressed data exchanged with a compressor
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Format {
    /// The byte order of the machine running the code
    Native,
    /// Little endian, the byte order of files
    Xdr
}

/// Compression methods defined by the format
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Compression {
    /// Raw pixel data
    None,
    /// Run length encoding, one scan line per chunk
    Rle,
    /// Zlib, one scan line per chunk
    Zips,
    /// Zlib, 16 scan lines per chunk
    Zip,
    /// Wavelet and Huffman, 32 scan lines per chunk
    Piz,
    /// Lossy 24 bit float, 16 scan lines per chunk
    Pxr24,
    /// Lossy 4x4 block coding, 32 scan lines per chunk
    B44,
    /// Like `B44` with flat blocks stored in 3 bytes
    B44A,
    /// Lossy DCT, 32 scan lines per chunk
    Dwaa,
    /// Lossy DCT, 256 scan lines per chunk
    Dwab
}

impl Compression {
    /// The id stored in files
    pub const fn to_u8(self) -> u8 {
        match self {
            Compression::None => 0,
            Compression::Rle => 1,
            Compression::Zips => 2,
            Compression::Zip => 3,
            Compression::Piz => 4,
            Compression::Pxr24 => 5,
            Compression::B44 => 6,
            Compression::B44A => 7,
            Compression::Dwaa => 8,
            Compression::Dwab => 9
        }
    }

    /// Whether decompressed data may differ from the data compressed
    pub const fn is_lossy(self) -> bool {
        matches!(
            self,
            Compression::B44 | Compression::B44A | Compression::Dwaa | Compression::Dwab
        )
    }

    /// Number of scan lines in a chunk compressed with this method
    pub const fn num_scan_lines(self) -> usize {
        match self {
            Compression::None | Compression::Rle | Compression::Zips => 1,
            Compression::Zip | Compression::Pxr24 => 16,
            Compression::Piz | Compression::B44 | Compression::B44A | Compression::Dwaa => 32,
            Compression::Dwab => 256
        }
    }
}

impl TryFrom<u8> for Compression {
    type Error = ExrCompressionErrors;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let compression = match value {
            0 => Compression::None,
            1 => Compression::Rle,
            2 => Compression::Zips,
            3 => Compression::Zip,
            4 => Compression::Piz,
            5 => Compression::Pxr24,
            6 => Compression::B44,
            7 => Compression::B44A,
            8 => Compression::Dwaa,
            9 => Compression::Dwab,
            _ => return Err(ExrCompressionErrors::UnknownCompression(value))
        };
        Ok(compression)
    }
}

/// A compressor for one chunk of pixels at a time
///
/// The slice returned by every method borrows an internal buffer of
/// the compressor and is only valid until the next call.
///
/// Empty input always gives empty output.
pub trait Compressor: Send {
    /// Number of scan lines a call to `compress` or `uncompress` handles
    fn num_scan_lines(&self) -> usize;

    /// Byte order of uncompressed data
    fn format(&self) -> Format {
        Format::Xdr
    }

    /// Compress the scan lines `min_y..min_y + num_scan_lines()`
    ///
    /// Lines past the bottom of the data window are not part of the input.
    fn compress(&mut self, input: &[u8], min_y: i32) -> Result<&[u8], ExrCompressionErrors>;

    /// Compress the pixels of a tile
    ///
    /// `range` is clipped to the data window
    fn compress_tile(&mut self, input: &[u8], range: Region) -> Result<&[u8], ExrCompressionErrors> {
        self.compress(input, range.min_y)
    }

    /// Uncompress the scan lines `min_y..min_y + num_scan_lines()`
    fn uncompress(&mut self, input: &[u8], min_y: i32) -> Result<&[u8], ExrCompressionErrors>;

    /// Uncompress the pixels of a tile
    fn uncompress_tile(
        &mut self, input: &[u8], range: Region
    ) -> Result<&[u8], ExrCompressionErrors> {
        self.uncompress(input, range.min_y)
    }
}

/// Number of scan lines per chunk for a compression method
pub const fn num_lines_in_buffer(compression: Compression) -> usize {
    compression.num_scan_lines()
}

/// Create a compressor for scan line chunks
///
/// # Arguments
/// - compression: The compression method
/// - max_scan_line_size: Size in bytes of the largest uncompressed scan line,
///   see [`PixelLayout::max_scan_line_size`]
/// - layout: Channels and data window of the image
/// - options: Compressor options
///
/// # Errors
/// `Unsupported` for methods without an implementation
pub fn new_compressor(
    compression: Compression, max_scan_line_size: usize, layout: &PixelLayout,
    options: CompressorOptions
) -> Result<Box<dyn Compressor>, ExrCompressionErrors> {
    debug!("Creating {compression:?} compressor, max scan line size {max_scan_line_size}");

    let num_lines = compression.num_scan_lines();

    let compressor: Box<dyn Compressor> = match compression {
        Compression::None => Box::new(NoCompressor::new(max_scan_line_size, num_lines)),
        Compression::Rle => Box::new(RleCompressor::new(max_scan_line_size)),
        #[cfg(feature = "zip")]
        Compression::Zips | Compression::Zip => Box::new(ZipCompressor::new(
            max_scan_line_size,
            num_lines,
            options
        )),
        Compression::B44 => Box::new(B44Compressor::new(
            layout,
            max_scan_line_size,
            num_lines,
            options
        )?),
        _ => return Err(ExrCompressionErrors::Unsupported(compression))
    };
    Ok(compressor)
}

/// Create a compressor for tiles
///
/// # Arguments
/// - compression: The compression method
/// - tile_line_size: Size in bytes of one uncompressed line of a tile
/// - num_tile_lines: Number of lines in a tile
/// - layout: Channels and data window of the image
/// - options: Compressor options
///
/// # Errors
/// `Unsupported` for methods without an implementation
pub fn new_tile_compressor(
    compression: Compression, tile_line_size: usize, num_tile_lines: usize, layout: &PixelLayout,
    options: CompressorOptions
) -> Result<Box<dyn Compressor>, ExrCompressionErrors> {
    debug!(
        "Creating {compression:?} tile compressor, {num_tile_lines} lines of {tile_line_size} bytes"
    );

    let tile_size = tile_line_size.saturating_mul(num_tile_lines);

    let compressor: Box<dyn Compressor> = match compression {
        Compression::None => Box::new(NoCompressor::new(tile_line_size, num_tile_lines)),
        Compression::Rle => Box::new(RleCompressor::new(tile_size)),
        #[cfg(feature = "zip")]
        Compression::Zips | Compression::Zip => Box::new(ZipCompressor::new(
            tile_line_size,
            num_tile_lines,
            options
        )),
        Compression::B44 => Box::new(B44Compressor::new(
            layout,
            tile_line_size,
            num_tile_lines,
            options
        )?),
        _ => return Err(ExrCompressionErrors::Unsupported(compression))
    };
    Ok(compressor)
}
