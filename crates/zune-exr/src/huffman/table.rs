/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Canonical Huffman code tables
//!
//! A table stores one 64 bit entry per symbol, the low 6 bits
//! hold the code length and the remaining bits the code itself.
//!
//! Canonical codes are derived from the code lengths alone, hence only
//! the lengths are ever written to a stream. The rules are
//! - codes of equal length increase with the symbol value
//! - shorter codes, padded with zeroes on the right, compare greater
//!   than longer codes
use alloc::collections::BinaryHeap;
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Reverse;

use log::trace;

use crate::bitstream::{BitReader, BitWriter};
use crate::errors::HuffmanErrors;

/// Number of bits in an uncompressed symbol
pub const ENCODE_BITS: usize = 16;
/// Number of entries in an encoding table, every 16 bit value
/// plus the run length symbol
pub const ENCODE_SIZE: usize = (1 << ENCODE_BITS) + 1;
/// Longest code the table may hold
pub const MAX_CODE_LENGTH: usize = 58;

/// Single zero length entry
const ZERO_LENGTH: u64 = 0;
/// 2 to 5 zero lengths are written as `SHORT_ZEROCODE_RUN + n - 2`
const SHORT_ZEROCODE_RUN: u64 = 59;
/// Longer runs are written as this code followed by an 8 bit count
const LONG_ZEROCODE_RUN: u64 = 63;
const SHORTEST_LONG_RUN: usize = 2 + (LONG_ZEROCODE_RUN - SHORT_ZEROCODE_RUN) as usize;
const LONGEST_LONG_RUN: usize = 255 + SHORTEST_LONG_RUN;

/// Length of the code stored in a table entry
#[inline(always)]
pub const fn code_length(entry: u64) -> u32 {
    (entry & 63) as u32
}

/// The code stored in a table entry
#[inline(always)]
pub const fn code_value(entry: u64) -> u64 {
    entry >> 6
}

/// A canonical Huffman encoding table
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncodingTable {
    codes:     Vec<u64>,
    min_index: usize,
    max_index: usize
}

impl EncodingTable {
    /// All entries, `ENCODE_SIZE` of them
    ///
    /// Entries outside `min_index..=max_index` are zero
    pub fn codes(&self) -> &[u64] {
        &self.codes
    }

    /// Smallest symbol with a code
    pub const fn min_index(&self) -> usize {
        self.min_index
    }

    /// Largest symbol with a code
    ///
    /// For tables built by [`build_encoding_table`] this is the
    /// run length symbol
    pub const fn max_index(&self) -> usize {
        self.max_index
    }

    /// The run length symbol of this table
    pub const fn run_length_symbol(&self) -> usize {
        self.max_index
    }

    /// Code length for a symbol, zero if the symbol has no code
    pub fn length(&self, symbol: usize) -> u32 {
        self.codes.get(symbol).map_or(0, |entry| code_length(*entry))
    }

    /// Code for a symbol, `None` if the symbol has no code
    pub fn code(&self, symbol: usize) -> Option<u64> {
        match self.codes.get(symbol) {
            Some(entry) if code_length(*entry) > 0 => Some(code_value(*entry)),
            _ => None
        }
    }

    /// Give back the raw entries
    pub fn into_codes(self) -> Vec<u64> {
        self.codes
    }
}

/// Count how many times each symbol appears
///
/// The returned vector has `ENCODE_SIZE` entries, the last one is
/// always zero since it's reserved for the run length symbol
pub fn count_frequencies(data: &[u16]) -> Vec<u64> {
    let mut frequencies = vec![0_u64; ENCODE_SIZE];

    for symbol in data {
        frequencies[usize::from(*symbol)] += 1;
    }
    frequencies
}

/// Replace code lengths with canonical codes
///
/// Takes a table holding only code lengths (each at most `MAX_CODE_LENGTH`)
/// and returns it with `length | code << 6` in every non-zero entry.
pub fn canonical_code_table(mut codes: Vec<u64>) -> Vec<u64> {
    let mut counts = [0_u64; MAX_CODE_LENGTH + 1];

    for length in &codes {
        counts[*length as usize] += 1;
    }

    // For each length, compute the first code, walking from the longest
    // so that short codes end up numerically larger
    let mut code = 0;

    for i in (1..=MAX_CODE_LENGTH).rev() {
        let next = (code + counts[i]) >> 1;
        counts[i] = code;
        code = next;
    }

    for entry in codes.iter_mut() {
        let length = *entry as usize;

        if length > 0 {
            *entry = (length as u64) | (counts[length] << 6);
            counts[length] += 1;
        }
    }
    codes
}

/// Build a canonical Huffman table from symbol frequencies
///
/// The frequency of the slot right after the largest used symbol is set to
/// one and used for the run length symbol. Ties between equal frequencies
/// are broken in favour of the lower symbol.
///
/// # Errors
/// - `InvalidTableSize`: All frequencies are zero, or the last slot (reserved
///   for the run length symbol) is in use, or there are more than `ENCODE_SIZE`
///   frequencies
/// - `InvalidCode`: Some code would exceed `MAX_CODE_LENGTH` bits
pub fn build_encoding_table(mut frequencies: Vec<u64>) -> Result<EncodingTable, HuffmanErrors> {
    if frequencies.iter().skip(ENCODE_SIZE - 1).any(|f| *f != 0) {
        return Err(HuffmanErrors::InvalidTableSize);
    }
    frequencies.resize(ENCODE_SIZE, 0);

    let min_index = frequencies
        .iter()
        .position(|f| *f != 0)
        .ok_or(HuffmanErrors::InvalidTableSize)?;

    // next symbol in the same subtree, the tail of a list points at itself
    let mut links = vec![0_usize; ENCODE_SIZE];
    let mut heap = BinaryHeap::new();
    let mut max_index = min_index;

    for (i, (link, frequency)) in links
        .iter_mut()
        .zip(frequencies.iter())
        .enumerate()
        .skip(min_index)
    {
        *link = i;

        if *frequency != 0 {
            heap.push(Reverse((*frequency, i)));
            max_index = i;
        }
    }
    // run length symbol
    max_index += 1;
    frequencies[max_index] = 1;
    heap.push(Reverse((1, max_index)));

    let mut lengths = vec![0_u64; ENCODE_SIZE];

    // Merge the two least frequent subtrees until one remains.
    // Every symbol is in a linked list with the rest of its subtree,
    // merging two subtrees adds one bit to all their members and joins the lists.
    while heap.len() > 1 {
        let (Some(Reverse((_, mm))), Some(Reverse((_, m)))) = (heap.pop(), heap.pop()) else {
            break;
        };

        frequencies[m] += frequencies[mm];
        heap.push(Reverse((frequencies[m], m)));


        let mut j = m;
        loop {
            lengths[j] += 1;

            if links[j] == j {
                // tail of the list, append the other subtree
                links[j] = mm;
                break;
            }
            j = links[j];
        }

        let mut j = mm;
        loop {
            lengths[j] += 1;

            if links[j] == j {
                break;
            }
            j = links[j];
        }
    }

    if lengths.iter().any(|l| *l > MAX_CODE_LENGTH as u64) {
        return Err(HuffmanErrors::InvalidCode);
    }

    trace!(
        "Built Huffman table for symbols {min_index}..={max_index}, longest code {} bits",
        lengths.iter().max().copied().unwrap_or(0)
    );

    Ok(EncodingTable {
        codes: canonical_code_table(lengths),
        min_index,
        max_index
    })
}

/// Serialize the code lengths of a table
///
/// Lengths for `min_index..=max_index` are written as 6 bit fields, MSB first,
/// with runs of zero lengths collapsed. The last byte is zero padded.
pub fn pack_encoding_table(table: &EncodingTable) -> Vec<u8> {
    let mut writer = BitWriter::new(Vec::new());
    pack_encoding_table_into(table, &mut writer);
    writer.finish()
}

pub(crate) fn pack_encoding_table_into(table: &EncodingTable, writer: &mut BitWriter) {
    let codes = &table.codes;
    let max_index = table.max_index;
    let mut i = table.min_index;

    while i <= max_index {
        let length = code_length(codes[i]);

        if length == 0 {
            let mut zero_run = 1;

            while i < max_index && zero_run < LONGEST_LONG_RUN {
                if code_length(codes[i + 1]) > 0 {
                    break;
                }
                i += 1;
                zero_run += 1;
            }
            if zero_run >= SHORTEST_LONG_RUN {
                writer.put_bits(6, LONG_ZEROCODE_RUN);
                writer.put_bits(8, (zero_run - SHORTEST_LONG_RUN) as u64);
            } else if zero_run >= 2 {
                writer.put_bits(6, SHORT_ZEROCODE_RUN + zero_run as u64 - 2);
            } else {
                writer.put_bits(6, ZERO_LENGTH);
            }
        } else {
            writer.put_bits(6, u64::from(length));
        }
        i += 1;
    }
    writer.zero_pad();
}

/// Read back a table written by [`pack_encoding_table`]
///
/// Returns the table with canonical codes re-derived, and the number of
/// bytes of `data` the packed lengths occupied.
///
/// # Errors
/// - `InvalidTableSize`: The indices lie outside the alphabet, are inverted
///    or a zero run extends past `max_index`
/// - `NotEnoughData`: `data` ends before all lengths were read
pub fn unpack_encoding_table(
    data: &[u8], min_index: usize, max_index: usize
) -> Result<(EncodingTable, usize), HuffmanErrors> {
    if min_index > max_index || max_index >= ENCODE_SIZE {
        return Err(HuffmanErrors::InvalidTableSize);
    }
    let mut lengths = vec![0_u64; ENCODE_SIZE];
    let mut reader = BitReader::new(data);
    let mut i = min_index;

    while i <= max_index {
        let length = reader.get_bits(6)?;

        let zero_run = if length == LONG_ZEROCODE_RUN {
            reader.get_bits(8)? as usize + SHORTEST_LONG_RUN
        } else if length >= SHORT_ZEROCODE_RUN {
            (length - SHORT_ZEROCODE_RUN) as usize + 2
        } else {
            lengths[i] = length;
            i += 1;
            continue;
        };

        if i + zero_run > max_index + 1 {
            return Err(HuffmanErrors::InvalidTableSize);
        }
        // lengths are already zero
        i += zero_run;
    }

    let table = EncodingTable {
        codes: canonical_code_table(lengths),
        min_index,
        max_index
    };
    Ok((table, reader.position()))
}
