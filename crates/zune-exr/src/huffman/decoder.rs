/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Huffman bitstream reader
//!
//! Decoding looks at the next 14 bits of the stream. Codes not longer
//! than that are resolved in a single lookup, longer ones by scanning
//! the few candidates sharing those 14 bit prefix.
use alloc::vec;
use alloc::vec::Vec;

use crate::bitstream::BitReader;
use crate::errors::HuffmanErrors;
use crate::huffman::table::{code_length, code_value, EncodingTable};

/// Bits looked at per table access
pub(crate) const DECODE_BITS: u32 = 14;
pub(crate) const DECODE_SIZE: usize = 1 << DECODE_BITS;
const DECODE_MASK: u64 = (DECODE_SIZE - 1) as u64;

/// An entry in the decoding lookup table
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) enum DecodeEntry {
    /// No code starts with these bits
    #[default]
    Empty,
    /// A code of `len` bits, `len <= DECODE_BITS`
    Short { len: u8, symbol: u32 },
    /// Symbols whose codes are longer than `DECODE_BITS` and start with
    /// these bits
    Long(Vec<u32>)
}

/// Build the lookup table for the codes in `table`
///
/// # Errors
/// `InvalidCode` if the codes do not form a prefix code
pub(crate) fn build_decoding_table(table: &EncodingTable) -> Result<Vec<DecodeEntry>, HuffmanErrors> {
    let mut lookup = vec![DecodeEntry::Empty; DECODE_SIZE];
    let codes = table.codes();

    for symbol in table.min_index()..=table.max_index() {
        let entry = codes[symbol];
        let code = code_value(entry);
        let length = code_length(entry);

        if code >> length != 0 {
            // more codes of this length than there is room for
            return Err(HuffmanErrors::InvalidCode);
        }

        if length > DECODE_BITS {
            let slot = &mut lookup[(code >> (length - DECODE_BITS)) as usize];

            match slot {
                DecodeEntry::Empty => *slot = DecodeEntry::Long(vec![symbol as u32]),
                DecodeEntry::Long(candidates) => candidates.push(symbol as u32),
                DecodeEntry::Short { .. } => return Err(HuffmanErrors::InvalidCode)
            }
        } else if length > 0 {
            let start = (code << (DECODE_BITS - length)) as usize;
            let end = start + (1 << (DECODE_BITS - length));

            for slot in &mut lookup[start..end] {
                if *slot != DecodeEntry::Empty {
                    return Err(HuffmanErrors::InvalidCode);
                }
                *slot = DecodeEntry::Short {
                    len:    length as u8,
                    symbol: symbol as u32
                };
            }
        }
    }
    Ok(lookup)
}

/// Output sink bounded by the declared symbol count
struct Output<'a> {
    buf:     &'a mut [u16],
    written: usize
}

impl<'a> Output<'a> {
    /// Store a decoded symbol, expanding run length codes
    #[inline(always)]
    fn write_symbol(
        &mut self, symbol: usize, run_length_symbol: usize, stream: &mut BitReader
    ) -> Result<(), HuffmanErrors> {
        if symbol == run_length_symbol {
            if stream.bits_left < 8 && !stream.refill_byte() {
                return Err(HuffmanErrors::NotEnoughData);
            }
            let count = stream.peek_bits(8) as usize;
            stream.drop_bits(8);

            if self.written + count > self.buf.len() {
                return Err(HuffmanErrors::TooMuchData);
            }
            if self.written == 0 {
                // nothing to repeat
                return Err(HuffmanErrors::InvalidCode);
            }
            let previous = self.buf[self.written - 1];

            self.buf[self.written..self.written + count].fill(previous);
            self.written += count;
        } else if let Some(out) = self.buf.get_mut(self.written) {
            // only the run length symbol can exceed 16 bits
            *out = symbol as u16;
            self.written += 1;
        } else {
            return Err(HuffmanErrors::TooMuchData);
        }
        Ok(())
    }
}

/// Decode a bitstream of `n_bits` bits into `out`
///
/// `stream` must hold exactly the bytes of the bitstream, and `out`
/// exactly the number of symbols expected.
pub(crate) fn decode_symbols(
    table: &EncodingTable, lookup: &[DecodeEntry], stream: &[u8], n_bits: u64, out: &mut [u16]
) -> Result<(), HuffmanErrors> {
    let codes = table.codes();
    let run_length_symbol = table.run_length_symbol();

    let mut reader = BitReader::new(stream);
    let mut output = Output { buf: out, written: 0 };

    while reader.refill_byte() {
        while reader.bits_left >= DECODE_BITS {
            let index = reader.peek_bits(DECODE_BITS) as usize;

            match &lookup[index] {
                DecodeEntry::Short { len, symbol } => {
                    reader.drop_bits(u32::from(*len));
                    output.write_symbol(*symbol as usize, run_length_symbol, &mut reader)?;
                }
                DecodeEntry::Long(candidates) => {
                    let mut found = None;

                    for candidate in candidates {
                        let entry = codes[*candidate as usize];
                        let length = code_length(entry);

                        while reader.bits_left < length && reader.refill_byte() {}

                        if reader.bits_left >= length && code_value(entry) == reader.peek_bits(length)
                        {
                            reader.drop_bits(length);
                            found = Some(*candidate as usize);
                            break;
                        }
                    }
                    let symbol = found.ok_or(HuffmanErrors::InvalidCode)?;
                    output.write_symbol(symbol, run_length_symbol, &mut reader)?;
                }
                DecodeEntry::Empty => return Err(HuffmanErrors::InvalidCode)
            }
        }
    }

    // Remaining codes are all short. Drop the padding of the
    // last byte then look the bits up left aligned.
    let padding = ((8 - (n_bits % 8)) % 8) as u32;

    if !reader.drop_trailing_bits(padding) {
        return Err(HuffmanErrors::InvalidCode);
    }

    while reader.bits_left > 0 {
        let index = (((reader.buffer << (DECODE_BITS - reader.bits_left)) as u64) & DECODE_MASK) as usize;

        match &lookup[index] {
            DecodeEntry::Short { len, symbol } if u32::from(*len) <= reader.bits_left => {
                reader.drop_bits(u32::from(*len));
                output.write_symbol(*symbol as usize, run_length_symbol, &mut reader)?;
            }
            _ => return Err(HuffmanErrors::InvalidCode)
        }
    }

    if output.written != output.buf.len() {
        return Err(HuffmanErrors::NotEnoughData);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::huffman::table::{canonical_code_table, unpack_encoding_table, ENCODE_SIZE};

    #[test]
    fn test_short_codes_fill_prefix() {
        let table = crate::huffman::table::build_encoding_table(
            crate::huffman::table::count_frequencies(&[4, 4, 4, 9])
        )
        .unwrap();
        let lookup = build_decoding_table(&table).unwrap();

        // symbol 4 gets the one bit code 1, covering the upper half
        assert_eq!(table.code(4), Some(1));
        assert!(lookup[DECODE_SIZE / 2..]
            .iter()
            .all(|e| *e == DecodeEntry::Short { len: 1, symbol: 4 }));
        assert!(lookup.iter().all(|e| *e != DecodeEntry::Empty));
    }

    #[test]
    fn test_over_subscribed_lengths_rejected() {
        // three one bit codes can't exist, the third overflows its length
        let mut lengths = vec![0; 3];
        lengths.resize(ENCODE_SIZE, 0);
        lengths[0] = 1;
        lengths[1] = 1;
        lengths[2] = 1;
        let codes = canonical_code_table(lengths);
        assert!(code_value(codes[2]) >> 1 != 0);

        // the same table, read from its packed form
        let packed = [0b0000_0100, 0b0001_0000, 0b0100_0000];
        let (table, _) = unpack_encoding_table(&packed, 0, 2).unwrap();
        assert_eq!(table.codes()[..3], codes[..3]);
        assert_eq!(build_decoding_table(&table), Err(HuffmanErrors::InvalidCode));
    }

    #[test]
    fn test_long_codes_share_buckets() {
        // Fibonacci-like frequencies give a very skewed tree with codes past 14 bits
        let mut data = vec![];
        let (mut a, mut b) = (1_usize, 1_usize);

        for symbol in 0..20_u16 {
            data.extend(core::iter::repeat(symbol * 7).take(a));
            let next = a + b;
            a = b;
            b = next;
        }
        let table = crate::huffman::table::build_encoding_table(
            crate::huffman::table::count_frequencies(&data)
        )
        .unwrap();
        assert!(table.length(0) > DECODE_BITS);

        let lookup = build_decoding_table(&table).unwrap();
        assert!(lookup
            .iter()
            .any(|e| matches!(e, DecodeEntry::Long(c) if c.len() > 1)));
    }
}
