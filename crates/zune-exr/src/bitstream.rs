/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Bit I/O functionalities
//!
//! Both the writer and the reader work MSB-first, the first bit
//! of the stream is the most significant bit of the first byte.
//!
//! This is the bit order used by the Huffman code tables and the
//! Huffman bitstream.
use alloc::vec::Vec;

use crate::errors::HuffmanErrors;

/// A bit writer that appends to an owned output vector
#[derive(Clone, Debug, Default)]
pub(crate) struct BitWriter {
    /// Pending bits, only the low `bits_in_buffer` bits are valid
    buffer:         u64,
    bits_in_buffer: u8,
    dest:           Vec<u8>
}

impl BitWriter {
    /// Construct a new bit writer that will append to the end of
    /// `dest`
    pub fn new(dest: Vec<u8>) -> BitWriter {
        BitWriter {
            buffer: 0,
            bits_in_buffer: 0,
            dest
        }
    }

    /// Put some bits to the buffer
    ///
    /// Whole bytes are moved to the output as soon as they are complete,
    /// so at most 7 bits are ever pending between calls.
    ///
    /// # Arguments
    /// - nbits: Number of bits to store, at most 58
    /// - bits: The bits, only the low `nbits` are used
    #[inline]
    pub fn put_bits(&mut self, nbits: u8, bits: u64) {
        debug_assert!(nbits <= 58);

        if nbits > 32 {
            // up to 7 pending bits plus a long code would overflow the buffer
            self.put_bits(nbits - 32, bits >> 32);
            self.put_bits(32, bits);
            return;
        }
        let mask = (1_u64 << nbits) - 1;
        // high bits that drop off the top have already been written out
        self.buffer = (self.buffer << nbits) | (bits & mask);
        self.bits_in_buffer += nbits;

        while self.bits_in_buffer >= 8 {
            self.bits_in_buffer -= 8;
            self.dest.push((self.buffer >> self.bits_in_buffer) as u8);
        }
    }

    /// Number of bytes fully written to the output
    pub fn bytes_written(&self) -> usize {
        self.dest.len()
    }

    /// Number of bits written so far, including pending ones
    pub fn bits_written(&self) -> u64 {
        (self.dest.len() as u64) * 8 + u64::from(self.bits_in_buffer)
    }

    /// Pad the pending bits with zeroes to a byte boundary
    /// and write them out
    pub fn zero_pad(&mut self) {
        if self.bits_in_buffer > 0 {
            let byte = self.buffer << (8 - self.bits_in_buffer);
            self.dest.push(byte as u8);
            self.bits_in_buffer = 0;
        }
        self.buffer = 0;
    }

    /// Pad to a byte boundary and return the output
    pub fn finish(mut self) -> Vec<u8> {
        self.zero_pad();
        self.dest
    }
}

/// A bit reader over a borrowed byte slice
///
/// Bytes are pulled into the accumulator one at a time, the
/// caller decides when to refill which matters for the decoder since
/// it must never read past the end of the declared bitstream.
pub(crate) struct BitReader<'src> {
    // buffer from which we are pulling in bits from
    src:           &'src [u8],
    // position in our buffer,
    position:      usize,
    /// Valid bits in `buffer`, counted from the least significant bit
    pub bits_left: u32,
    // wide enough for a 58 bit code plus a partially consumed byte
    pub buffer:    u128
}

impl<'src> BitReader<'src> {
    /// Create a new `BitReader` instance
    pub fn new(src: &'src [u8]) -> BitReader<'src> {
        BitReader {
            src,
            position: 0,
            bits_left: 0,
            buffer: 0
        }
    }

    /// Pull one more byte into the accumulator
    ///
    /// Returns false if the source has been exhausted
    #[inline(always)]
    pub fn refill_byte(&mut self) -> bool {
        match self.src.get(self.position) {
            Some(byte) => {
                self.buffer = (self.buffer << 8) | u128::from(*byte);
                self.bits_left += 8;
                self.position += 1;
                true
            }
            None => false
        }
    }

    /// Read `num_bits` from the stream, refilling as necessary
    ///
    /// # Errors
    /// `NotEnoughData` if the source cannot satisfy the read
    #[inline]
    pub fn get_bits(&mut self, num_bits: u32) -> Result<u64, HuffmanErrors> {
        while self.bits_left < num_bits {
            if !self.refill_byte() {
                return Err(HuffmanErrors::NotEnoughData);
            }
        }
        let value = self.peek_bits(num_bits);
        self.bits_left -= num_bits;
        Ok(value)
    }

    /// Return the next `num_bits` without consuming them
    ///
    /// The caller must ensure `bits_left >= num_bits`
    #[inline(always)]
    pub const fn peek_bits(&self, num_bits: u32) -> u64 {
        ((self.buffer >> (self.bits_left - num_bits)) as u64) & ((1_u64 << num_bits) - 1)
    }

    #[inline(always)]
    pub fn drop_bits(&mut self, num_bits: u32) {
        debug_assert!(self.bits_left >= num_bits);
        self.bits_left -= num_bits;
    }

    /// Discard the `num_bits` least significant bits of the accumulator
    ///
    /// Used to remove zero padding at the end of a stream.
    pub fn drop_trailing_bits(&mut self, num_bits: u32) -> bool {
        if self.bits_left < num_bits {
            return false;
        }
        self.buffer >>= num_bits;
        self.bits_left -= num_bits;
        true
    }

    /// Number of bytes pulled from the source so far
    pub const fn position(&self) -> usize {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::{BitReader, BitWriter};

    #[test]
    fn test_msb_first_layout() {
        let mut writer = BitWriter::new(vec![]);
        writer.put_bits(3, 0b101);
        writer.put_bits(6, 0b110011);
        assert_eq!(writer.bits_written(), 9);
        let out = writer.finish();
        // 101 11001 | 1 0000000
        assert_eq!(out, [0b1011_1001, 0b1000_0000]);
    }

    #[test]
    fn test_long_fields() {
        let mut writer = BitWriter::new(vec![0xAA]);
        writer.put_bits(5, 0b10011);
        writer.put_bits(58, (1 << 57) | 0x1234_5678);
        writer.put_bits(1, 1);
        let out = writer.finish();
        // existing bytes are kept
        assert_eq!(out[0], 0xAA);

        let mut reader = BitReader::new(&out[1..]);
        assert_eq!(reader.get_bits(5), Ok(0b10011));
        assert_eq!(reader.get_bits(58), Ok((1 << 57) | 0x1234_5678));
        assert_eq!(reader.get_bits(1), Ok(1));
    }

    #[test]
    fn test_long_field_after_pending_bits() {
        let mut writer = BitWriter::new(vec![]);
        writer.put_bits(7, 0b101_0101);
        writer.put_bits(58, (1 << 57) | 1);
        assert_eq!(writer.bits_written(), 65);
        let out = writer.finish();

        let mut reader = BitReader::new(&out);
        assert_eq!(reader.get_bits(7), Ok(0b101_0101));
        assert_eq!(reader.get_bits(58), Ok((1 << 57) | 1));
    }

    #[test]
    fn test_reader_exhaustion() {
        let data = [0xFF];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.get_bits(6), Ok(0x3F));
        assert!(reader.get_bits(6).is_err());
        assert_eq!(reader.position(), 1);
    }
}
