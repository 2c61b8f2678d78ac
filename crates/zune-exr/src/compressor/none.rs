/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use alloc::vec::Vec;

use crate::compressor::Compressor;
use crate::errors::ExrCompressionErrors;

/// Pass through compressor for uncompressed chunks
pub(crate) struct NoCompressor {
    num_scan_lines: usize,
    max_size:       usize,
    output:         Vec<u8>
}

impl NoCompressor {
    pub fn new(max_scan_line_size: usize, num_scan_lines: usize) -> NoCompressor {
        NoCompressor {
            num_scan_lines,
            max_size: max_scan_line_size.saturating_mul(num_scan_lines),
            output: Vec::new()
        }
    }

    fn copy(&mut self, input: &[u8]) -> Result<&[u8], ExrCompressionErrors> {
        if input.len() > self.max_size {
            return Err(ExrCompressionErrors::WrongInputSize(self.max_size, input.len()));
        }
        self.output.clear();
        self.output.extend_from_slice(input);
        Ok(&self.output)
    }
}

impl Compressor for NoCompressor {
    fn num_scan_lines(&self) -> usize {
        self.num_scan_lines
    }

    fn compress(&mut self, input: &[u8], _: i32) -> Result<&[u8], ExrCompressionErrors> {
        self.copy(input)
    }

    fn uncompress(&mut self, input: &[u8], _: i32) -> Result<&[u8], ExrCompressionErrors> {
        self.copy(input)
    }
}
