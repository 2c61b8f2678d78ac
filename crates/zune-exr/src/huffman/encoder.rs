/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Huffman bitstream writer
use crate::bitstream::BitWriter;
use crate::huffman::table::{code_length, code_value, EncodingTable};

/// Repeats of a symbol needed before a run is sent with the run length code
pub(crate) const RLMIN: usize = 32;
/// Largest repeat count that fits the 8 bit count field
const MAX_RUN: usize = 255;

#[inline(always)]
fn write_code(writer: &mut BitWriter, entry: u64) {
    writer.put_bits(code_length(entry) as u8, code_value(entry));
}

/// Send `symbol_code` once, followed by `run_count` repeats of it
#[inline]
fn send_code(writer: &mut BitWriter, symbol_code: u64, run_count: usize, run_code: u64) {
    if run_count > RLMIN {
        write_code(writer, symbol_code);
        write_code(writer, run_code);
        writer.put_bits(8, run_count as u64);
    } else {
        for _ in 0..=run_count {
            write_code(writer, symbol_code);
        }
    }
}

/// Write `data` using the codes in `table`
///
/// Every symbol in `data` must have a code, which holds when the table
/// was built from the frequencies of `data`.
///
/// The stream is left unpadded, the caller pads it.
pub(crate) fn encode_symbols(table: &EncodingTable, data: &[u16], writer: &mut BitWriter) {
    let codes = table.codes();
    let run_code = codes[table.run_length_symbol()];

    let Some((first, rest)) = data.split_first() else {
        return;
    };
    let mut symbol = *first;
    let mut run_count = 0;

    for current in rest {
        if symbol == *current && run_count < MAX_RUN {
            run_count += 1;
        } else {
            send_code(writer, codes[usize::from(symbol)], run_count, run_code);
            run_count = 0;
        }
        symbol = *current;
    }
    send_code(writer, codes[usize::from(symbol)], run_count, run_code);
}
