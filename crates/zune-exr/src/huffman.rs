/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Canonical Huffman coding of 16 bit symbols
//!
//! This is the entropy coder used by wavelet based EXR compression, it works on
//! any sequence of `u16`s and is self-contained: the code table travels with the data.
//!
//! # Stream layout
//! All header fields are little endian `u32`s
//!
//! | offset | field |
//! |--------|-------|
//! | 0      | smallest symbol in the table |
//! | 4      | largest symbol in the table (the run length symbol) |
//! | 8      | length of the packed table in bytes |
//! | 12     | length of the bitstream in bits |
//! | 16     | reserved, zero |
//! | 20     | packed table, then bitstream |
//!
//! Runs of more than 32 repeats of a symbol are written as the symbol, the
//! run length symbol and an 8 bit repeat count.
//!
//! # Example
//! ```
//! use zune_exr::huffman::{HuffmanDecoder, HuffmanEncoder};
//!
//! let symbols = [5_u16; 8];
//! let compressed = HuffmanEncoder::new(&symbols).encode().unwrap();
//! let decoded = HuffmanDecoder::new(&compressed, symbols.len()).decode().unwrap();
//! assert_eq!(decoded, symbols);
//! ```
use alloc::vec;
use alloc::vec::Vec;

use log::{trace, warn};

pub use crate::huffman::table::{
    build_encoding_table, canonical_code_table, code_length, code_value, count_frequencies,
    pack_encoding_table, unpack_encoding_table, EncodingTable, ENCODE_SIZE, MAX_CODE_LENGTH
};
use crate::bitstream::BitWriter;
use crate::errors::HuffmanErrors;
use crate::huffman::decoder::{build_decoding_table, decode_symbols};
use crate::huffman::encoder::encode_symbols;
use crate::huffman::table::pack_encoding_table_into;

mod decoder;
mod encoder;
mod table;

/// Size of the stream header in bytes
pub const HEADER_SIZE: usize = 20;

#[inline]
fn read_u32(data: &[u8], offset: usize) -> u32 {
    let mut bytes = [0; 4];
    bytes.copy_from_slice(&data[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

#[inline]
fn write_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// A Huffman encoder for 16 bit symbols
pub struct HuffmanEncoder<'a> {
    data: &'a [u16]
}

impl<'a> HuffmanEncoder<'a> {
    /// Create a new encoder that will compress `data`
    pub const fn new(data: &'a [u16]) -> HuffmanEncoder<'a> {
        HuffmanEncoder { data }
    }

    /// An upper bound of the size of the compressed stream
    ///
    /// The table of a full alphabet is below 50 KB and no code is longer
    /// than 58 bits, though in practice codes are much shorter than that.
    pub fn max_size(&self) -> usize {
        if self.data.is_empty() {
            return 0;
        }
        HEADER_SIZE + (ENCODE_SIZE * 6 + 7) / 8 + (self.data.len() * MAX_CODE_LENGTH + 7) / 8
    }

    /// Compress the symbols
    ///
    /// An empty input gives an empty output
    ///
    /// # Errors
    /// `TooLargeInput` when the bitstream would have more bits
    /// than the header can describe
    pub fn encode(&self) -> Result<Vec<u8>, HuffmanErrors> {
        if self.data.is_empty() {
            return Ok(Vec::new());
        }
        let table = build_encoding_table(count_frequencies(self.data))?;

        let mut writer = BitWriter::new(vec![0; HEADER_SIZE]);
        pack_encoding_table_into(&table, &mut writer);

        let table_end = writer.bytes_written();
        encode_symbols(&table, self.data, &mut writer);

        let n_bits = writer.bits_written() - (table_end as u64) * 8;
        let n_bits =
            u32::try_from(n_bits).map_err(|_| HuffmanErrors::TooLargeInput(self.data.len()))?;

        let mut output = writer.finish();

        write_u32(&mut output, 0, table.min_index() as u32);
        write_u32(&mut output, 4, table.max_index() as u32);
        write_u32(&mut output, 8, (table_end - HEADER_SIZE) as u32);
        write_u32(&mut output, 12, n_bits);
        write_u32(&mut output, 16, 0);

        trace!(
            "Huffman: {} symbols to {} bytes, table {} bytes",
            self.data.len(),
            output.len(),
            table_end - HEADER_SIZE
        );

        Ok(output)
    }
}

/// A Huffman decoder for streams written by [`HuffmanEncoder`]
///
/// The number of symbols is not stored in the stream, it has
/// to be known beforehand.
pub struct HuffmanDecoder<'a> {
    data:        &'a [u8],
    num_symbols: usize
}

impl<'a> HuffmanDecoder<'a> {
    /// Create a new decoder
    ///
    /// # Arguments
    /// - data: The compressed stream
    /// - num_symbols: Number of symbols the stream decodes to
    pub const fn new(data: &'a [u8], num_symbols: usize) -> HuffmanDecoder<'a> {
        HuffmanDecoder { data, num_symbols }
    }

    /// Number of `u16`s needed to hold the output
    pub const fn output_buffer_size(&self) -> usize {
        self.num_symbols
    }

    /// Decode the stream into a newly allocated vector
    ///
    /// # Errors
    /// See [`decode_into`](Self::decode_into)
    pub fn decode(&self) -> Result<Vec<u16>, HuffmanErrors> {
        let mut output = vec![0; self.num_symbols];
        self.decode_into(&mut output)?;
        Ok(output)
    }

    /// Decode the stream into `output`
    ///
    /// Exactly `output_buffer_size()` symbols are written
    /// to the start of `output`
    ///
    /// # Errors
    /// - `InvalidTableSize`: The header describes a table outside the symbol range
    /// - `InvalidCode`: The table or bitstream is corrupt
    /// - `NotEnoughData`: The stream is truncated or decodes to fewer symbols
    /// - `TooMuchData`: The stream decodes to more symbols than expected, or
    ///   `output` is too small
    pub fn decode_into(&self, output: &mut [u16]) -> Result<(), HuffmanErrors> {
        let data = self.data;

        if output.len() < self.num_symbols {
            return Err(HuffmanErrors::TooMuchData);
        }
        let output = &mut output[..self.num_symbols];

        if data.is_empty() {
            if !output.is_empty() {
                return Err(HuffmanErrors::NotEnoughData);
            }
            return Ok(());
        }
        if data.len() < HEADER_SIZE {
            return Err(HuffmanErrors::NotEnoughData);
        }

        let min_index = read_u32(data, 0) as usize;
        let max_index = read_u32(data, 4) as usize;
        let table_length = read_u32(data, 8) as usize;
        let n_bits = u64::from(read_u32(data, 12));

        if min_index > max_index || max_index >= ENCODE_SIZE {
            return Err(HuffmanErrors::InvalidTableSize);
        }

        let (table, consumed) = unpack_encoding_table(&data[HEADER_SIZE..], min_index, max_index)?;

        if consumed != table_length {
            warn!("Huffman table length is {table_length} bytes in the header but {consumed} bytes were read");
        }

        let stream = &data[HEADER_SIZE + consumed..];
        let stream_length = ((n_bits + 7) / 8) as usize;

        if stream_length > stream.len() {
            return Err(HuffmanErrors::NotEnoughData);
        }

        let lookup = build_decoding_table(&table)?;

        decode_symbols(&table, &lookup, &stream[..stream_length], n_bits, output)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;

    fn round_trip(data: &[u16]) {
        let compressed = HuffmanEncoder::new(data).encode().unwrap();
        assert!(compressed.len() <= HuffmanEncoder::new(data).max_size());
        let decoded = HuffmanDecoder::new(&compressed, data.len()).decode().unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_empty() {
        assert!(HuffmanEncoder::new(&[]).encode().unwrap().is_empty());
        assert_eq!(HuffmanDecoder::new(&[], 0).decode(), Ok(vec![]));
        assert_eq!(
            HuffmanDecoder::new(&[], 3).decode(),
            Err(HuffmanErrors::NotEnoughData)
        );
    }

    #[test]
    fn test_header_fields() {
        let data = [5_u16; 8];
        let compressed = HuffmanEncoder::new(&data).encode().unwrap();

        assert_eq!(read_u32(&compressed, 0), 5);
        assert_eq!(read_u32(&compressed, 4), 6);
        let table_length = read_u32(&compressed, 8) as usize;
        let n_bits = read_u32(&compressed, 12) as usize;
        assert_eq!(read_u32(&compressed, 16), 0);
        // two one bit codes, literal encoding since 7 repeats is below the threshold
        assert_eq!(n_bits, 8);
        assert!(n_bits < 8 * 16);
        assert_eq!(compressed.len(), HEADER_SIZE + table_length + (n_bits + 7) / 8);
    }

    #[test]
    fn test_round_trips() {
        round_trip(&[0]);
        round_trip(&[65535]);
        round_trip(&[5; 8]);
        round_trip(&[1, 2]);
        round_trip(&[7; 34]);
        round_trip(&[7; 1000]);

        let ramp: Vec<u16> = (0..5000_u32).map(|x| (x % 300) as u16).collect();
        round_trip(&ramp);

        let mut runs = vec![];
        for i in 0..50_u16 {
            runs.extend(core::iter::repeat(i % 3).take(usize::from(i) * 7 + 1));
        }
        round_trip(&runs);
    }

    #[test]
    fn test_corrupt_table_indices() {
        let mut compressed = HuffmanEncoder::new(&[1, 2, 3]).encode().unwrap();
        write_u32(&mut compressed, 0, 10);
        write_u32(&mut compressed, 4, 4);
        assert_eq!(
            HuffmanDecoder::new(&compressed, 3).decode(),
            Err(HuffmanErrors::InvalidTableSize)
        );
        write_u32(&mut compressed, 0, 0);
        write_u32(&mut compressed, 4, ENCODE_SIZE as u32);
        assert_eq!(
            HuffmanDecoder::new(&compressed, 3).decode(),
            Err(HuffmanErrors::InvalidTableSize)
        );
        // the header alone
        assert_eq!(
            HuffmanDecoder::new(&compressed[..10], 3).decode(),
            Err(HuffmanErrors::NotEnoughData)
        );
    }

    #[test]
    fn test_truncated_stream() {
        let data: Vec<u16> = (0..400_u16).map(|x| x.wrapping_mul(31)).collect();
        let compressed = HuffmanEncoder::new(&data).encode().unwrap();
        let truncated = &compressed[..compressed.len() - 10];

        assert_eq!(
            HuffmanDecoder::new(truncated, data.len()).decode(),
            Err(HuffmanErrors::NotEnoughData)
        );
    }

    #[test]
    fn test_wrong_symbol_count() {
        let data = [3_u16, 4, 5, 3, 4, 5];
        let compressed = HuffmanEncoder::new(&data).encode().unwrap();

        assert_eq!(
            HuffmanDecoder::new(&compressed, 5).decode(),
            Err(HuffmanErrors::TooMuchData)
        );
        assert_eq!(
            HuffmanDecoder::new(&compressed, 7).decode(),
            Err(HuffmanErrors::NotEnoughData)
        );
        let mut small = [0; 3];
        assert_eq!(
            HuffmanDecoder::new(&compressed, 6).decode_into(&mut small),
            Err(HuffmanErrors::TooMuchData)
        );
    }
}
