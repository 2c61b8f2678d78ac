/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Zlib compression, used by ZIP (16 lines) and ZIPS (1 line)
use alloc::vec::Vec;
use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use log::trace;

use crate::compressor::predictor::{reconstruct_and_interleave, split_and_predict};
use crate::compressor::Compressor;
use crate::errors::ExrCompressionErrors;
use crate::options::CompressorOptions;

pub(crate) struct ZipCompressor {
    num_scan_lines: usize,
    max_size:       usize,
    level:          u8,
    scratch:        Vec<u8>,
    output:         Vec<u8>
}

impl ZipCompressor {
    pub fn new(
        max_scan_line_size: usize, num_scan_lines: usize, options: CompressorOptions
    ) -> ZipCompressor {
        ZipCompressor {
            num_scan_lines,
            max_size: max_scan_line_size.saturating_mul(num_scan_lines),
            level: options.get_zip_level(),
            scratch: Vec::new(),
            output: Vec::new()
        }
    }
}

impl Compressor for ZipCompressor {
    fn num_scan_lines(&self) -> usize {
        self.num_scan_lines
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

        let output = core::mem::take(&mut self.output);
        let mut encoder =
            ZlibEncoder::new(output, flate2::Compression::new(u32::from(self.level)));
        encoder.write_all(&self.scratch)?;
        self.output = encoder.finish()?;

        trace!(
            "ZIP level {}: {} bytes to {} bytes",
            self.level,
            input.len(),
            self.output.len()
        );

        Ok(&self.output)
    }

    fn uncompress(&mut self, input: &[u8], _: i32) -> Result<&[u8], ExrCompressionErrors> {
        self.output.clear();

        if input.is_empty() {
            return Ok(&self.output);
        }
        self.scratch.clear();

        // one byte more than allowed, to find out if the stream is too long
        let limit = self.max_size as u64 + 1;
        ZlibDecoder::new(input)
            .take(limit)
            .read_to_end(&mut self.scratch)?;

        if self.scratch.len() > self.max_size {
            return Err(ExrCompressionErrors::TooMuchData(
                self.scratch.len() - self.max_size
            ));
        }
        reconstruct_and_interleave(&mut self.scratch, &mut self.output);

        Ok(&self.output)
    }
}
