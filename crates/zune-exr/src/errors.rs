/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Errors possible during compression and decompression
use core::fmt::{Debug, Display, Formatter};

use crate::channel::Region;
use crate::compressor::Compression;

/// Errors raised by the Huffman coder
///
/// Every one of them indicates the compressed stream cannot
/// be trusted, none is recovered from internally.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum HuffmanErrors {
    /// The minimum or maximum code table index stored in the
    /// header lies outside the symbol alphabet, or the packed
    /// table describes more entries than that range holds
    InvalidTableSize,
    /// The bitstream contains a bit pattern that maps to no code,
    /// or the code table does not describe a valid prefix code
    InvalidCode,
    /// The stream ended before the declared number of symbols
    /// could be produced
    NotEnoughData,
    /// Decoded symbols would overflow the declared output size
    TooMuchData,
    /// The input is too large for the bit count field of the header
    ///
    /// The argument is the number of symbols handed to the encoder
    TooLargeInput(usize)
}

impl Debug for HuffmanErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            HuffmanErrors::InvalidTableSize => {
                writeln!(f, "Error in Huffman-encoded data (invalid code table size)")
            }
            HuffmanErrors::InvalidCode => {
                writeln!(f, "Error in Huffman-encoded data (invalid code)")
            }
            HuffmanErrors::NotEnoughData => {
                writeln!(
                    f,
                    "Error in Huffman-encoded data (decoded data are shorter than expected)"
                )
            }
            HuffmanErrors::TooMuchData => {
                writeln!(
                    f,
                    "Error in Huffman-encoded data (decoded data are longer than expected)"
                )
            }
            HuffmanErrors::TooLargeInput(found) => {
                writeln!(
                    f,
                    "Too many symbols ({found}) to be described by a 32 bit bit-count"
                )
            }
        }
    }
}

impl Display for HuffmanErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

impl std::error::Error for HuffmanErrors {}

/// Errors possible when running a compressor over a block of pixels
pub enum ExrCompressionErrors {
    /// An error from the Huffman coder
    Huffman(HuffmanErrors),
    /// The compressed data ended before all pixels could be recovered
    ///
    /// # Arguments
    /// - 1st argument is the number of bytes we expected
    /// - 2nd argument is number of bytes actually left
    NotEnoughData(usize, usize),
    /// Bytes were left over after all pixels were recovered
    ///
    /// The argument is the number of unused bytes
    TooMuchData(usize),
    /// The compressed stream is malformed
    CorruptData(&'static str),
    /// The compression method exists but has no implementation here
    Unsupported(Compression),
    /// The compression id is not one the format defines
    UnknownCompression(u8),
    /// A pixel region that is empty or starts outside the data window
    InvalidRegion(Region),
    /// The uncompressed input does not have the size the layout describes
    ///
    /// # Arguments
    /// - 1st argument is the expected size
    /// - 2nd argument is the size found
    WrongInputSize(usize, usize),
    /// Errors from the zlib backend
    #[cfg(feature = "zip")]
    Zlib(std::io::Error),
    /// Generic message
    Generic(&'static str)
}

impl Debug for ExrCompressionErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            ExrCompressionErrors::Huffman(err) => {
                writeln!(f, "{:?}", err)
            }
            ExrCompressionErrors::NotEnoughData(expected, found) => {
                writeln!(
                    f,
                    "Error decompressing data (input data are shorter than expected), needed {expected} bytes but only {found} remain"
                )
            }
            ExrCompressionErrors::TooMuchData(extra) => {
                writeln!(
                    f,
                    "Error decompressing data (input data are longer than expected), {extra} bytes left over"
                )
            }
            ExrCompressionErrors::CorruptData(reason) => {
                writeln!(f, "Corrupt compressed data: {reason}")
            }
            ExrCompressionErrors::Unsupported(compression) => {
                writeln!(f, "Compression {compression:?} is not supported")
            }
            ExrCompressionErrors::UnknownCompression(id) => {
                writeln!(f, "Unknown compression id {id}")
            }
            ExrCompressionErrors::InvalidRegion(region) => {
                writeln!(f, "Invalid pixel region {region:?}")
            }
            ExrCompressionErrors::WrongInputSize(expected, found) => {
                writeln!(f, "Input array length {found} doesn't match {expected}")
            }
            #[cfg(feature = "zip")]
            ExrCompressionErrors::Zlib(err) => {
                writeln!(f, "Zlib error {:?}", err)
            }
            ExrCompressionErrors::Generic(reason) => {
                writeln!(f, "{reason}")
            }
        }
    }
}

impl Display for ExrCompressionErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

impl std::error::Error for ExrCompressionErrors {}

impl From<HuffmanErrors> for ExrCompressionErrors {
    fn from(value: HuffmanErrors) -> Self {
        ExrCompressionErrors::Huffman(value)
    }
}

impl From<&'static str> for ExrCompressionErrors {
    fn from(value: &'static str) -> Self {
        ExrCompressionErrors::Generic(value)
    }
}

#[cfg(feature = "zip")]
impl From<std::io::Error> for ExrCompressionErrors {
    fn from(value: std::io::Error) -> Self {
        ExrCompressionErrors::Zlib(value)
    }
}
