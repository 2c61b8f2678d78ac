/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! OpenEXR pixel data compression
//!
//! The codecs an EXR reader or writer runs over chunks of pixel data
//!
//! # Features
//! - Canonical Huffman coding of 16 bit symbols, see [`huffman`]
//! - Lossy B44 4x4 block coding of half floats, see [`b44`]
//! - Chunk compressors for NONE, RLE, ZIPS, ZIP and B44 behind a common [`Compressor`] trait
//! - No unsafe
//! - Fuzz tested decoders
//!
//! # Usage notes
//! The crate does not read or write EXR headers, it is handed the
//! channel list and data window of an image via [`PixelLayout`] and compresses the
//! chunks the caller gives it. Deciding whether to store a chunk raw when
//! compression does not help is up to the caller.
//!
//! Half floats are carried as their `u16` bit patterns, [`half`] converts them.

// CAE: No std doesn't work because the B44 log tables need exp and ln
// for floats and LazyLock, which do not exist in no std land
#![forbid(unsafe_code)]
#![macro_use]
extern crate alloc;
extern crate core;

pub use channel::{divp, modp, num_samples, Channel, PixelLayout, PixelType, Region};
pub use compressor::{
    new_compressor, new_tile_compressor, num_lines_in_buffer, Compression, Compressor, Format
};
pub use errors::{ExrCompressionErrors, HuffmanErrors};
pub use options::CompressorOptions;

pub mod b44;
mod bitstream;
mod channel;
mod compressor;
mod errors;
pub mod half;
pub mod huffman;
mod options;
