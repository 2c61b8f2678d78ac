/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Run length compression
//!
//! The stream is a sequence of
//! - `n, byte` with `0 <= n < 128`: `byte` repeated `n + 1` times
//! - `-n, n bytes` with `0 < n <= 127`: `n` bytes copied as is
use alloc::vec::Vec;

use log::trace;

use crate::compressor::predictor::{reconstruct_and_interleave, split_and_predict};
use crate::compressor::Compressor;
use crate::errors::ExrCompressionErrors;

const MIN_RUN_LENGTH: usize = 3;
const MAX_RUN_LENGTH: usize = 127;

/// Compress `data` into `out`, appending to it
pub(crate) fn rle_encode(data: &[u8], out: &mut Vec<u8>) {
    let end = data.len();
    let mut run_start = 0;
    let mut run_end = 1;

    while run_start < end {
        while run_end < end
            && data[run_start] == data[run_end]
            && (run_end - run_start - 1) < MAX_RUN_LENGTH
        {
            run_end += 1;
        }

        if run_end - run_start >= MIN_RUN_LENGTH {
            // compressible run
            out.push((run_end - run_start - 1) as u8);
            out.push(data[run_start]);
            run_start = run_end;
        } else {
            // literal span, ends where a run of three begins
            while run_end < end
                && (run_end + 2 >= end
                    || data[run_end] != data[run_end + 1]
                    || data[run_end + 1] != data[run_end + 2])
                && (run_end - run_start) < MAX_RUN_LENGTH
            {
                run_end += 1;
            }
            out.push(((run_end - run_start) as u8).wrapping_neg());
            out.extend_from_slice(&data[run_start..run_end]);
            run_start = run_end;
        }
        run_end += 1;
    }
}

/// Expand `data` into `out`, which is cleared first
///
/// # Errors
/// `CorruptData` if a span runs past the end of the input or
/// the output would grow beyond `max_size`
pub(crate) fn rle_decode(
    data: &[u8], out: &mut Vec<u8>, max_size: usize
) -> Result<(), ExrCompressionErrors> {
    out.clear();

    let mut position = 0;

    while let Some(count) = data.get(position) {
        let count = *count as i8;
        position += 1;

        if count < 0 {
            let length = usize::from(count.unsigned_abs());

            let literal = data
                .get(position..position + length)
                .ok_or(ExrCompressionErrors::CorruptData("RLE literal past end of input"))?;

            if out.len() + length > max_size {
                return Err(ExrCompressionErrors::CorruptData(
                    "RLE literal past end of output"
                ));
            }
            out.extend_from_slice(literal);
            position += length;
        } else {
            let length = count as usize + 1;

            let value = *data
                .get(position)
                .ok_or(ExrCompressionErrors::CorruptData("RLE run past end of input"))?;

            if out.len() + length > max_size {
                return Err(ExrCompressionErrors::CorruptData("RLE run past end of output"));
            }
            out.resize(out.len() + length, value);
            position += 1;
        }
    }
    Ok(())
}

/// Run length compressor, one scan line at a time
pub(crate) struct RleCompressor {
    max_size: usize,
    scratch:  Vec<u8>,
    output:   Vec<u8>
}

impl RleCompressor {
    pub fn new(max_size: usize) -> RleCompressor {
        RleCompressor {
            max_size,
            scratch: Vec::new(),
            output: Vec::new()
        }
    }
}

impl Compressor for RleCompressor {
    fn num_scan_lines(&self) -> usize {
        1
    }

    fn compress(&mut self, input: &[u8], _: i32) -> Result<&[u8], ExrCompressionErrors> {
        self.output.clear();

        if input.is_empty() {
            return Ok(&self.output);
        }
        if input.len() > self.max_size {
            return Err(ExrCompressionErrors::WrongInputSize(self.max_size, input.len()));
        }
        split_and_predict(input, &mut self.scratch);
        rle_encode(&self.scratch, &mut self.output);

        trace!("RLE: {} bytes to {} bytes", input.len(), self.output.len());

        Ok(&self.output)
    }

    fn uncompress(&mut self, input: &[u8], _: i32) -> Result<&[u8], ExrCompressionErrors> {
        self.output.clear();

        if input.is_empty() {
            return Ok(&self.output);
        }
        rle_decode(input, &mut self.scratch, self.max_size)?;
        reconstruct_and_interleave(&mut self.scratch, &mut self.output);

        Ok(&self.output)
    }
}
