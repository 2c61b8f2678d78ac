/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! B44 compressor, splits a chunk into per channel planes and
//! packs half float planes in 4x4 blocks
//!
//! Channels of other types are stored uncompressed after the
//! reordering into planes.
use alloc::vec::Vec;

use log::{debug, warn};

use crate::b44::{pack_plane, unpack_plane};
use crate::channel::{modp, num_samples, PixelLayout, PixelType, Region};
use crate::compressor::{Compressor, Format};
use crate::errors::ExrCompressionErrors;
use crate::options::CompressorOptions;

/// A channel's plane inside the scratch buffer
struct ChannelPlane {
    pixel_type: PixelType,
    x_sampling: i32,
    y_sampling: i32,
    p_linear:   bool,
    start:      usize,
    cursor:     usize,
    nx:         usize,
    ny:         usize
}

impl ChannelPlane {
    /// 16 bit words per sample
    const fn words_per_sample(&self) -> usize {
        self.pixel_type.size() / 2
    }

    const fn len(&self) -> usize {
        self.nx * self.ny * self.words_per_sample()
    }
}

pub(crate) struct B44Compressor {
    num_scan_lines: usize,
    data_window:    Region,
    format:         Format,
    strict_mode:    bool,
    planes:         Vec<ChannelPlane>,
    scratch:        Vec<u16>,
    output:         Vec<u8>
}

impl B44Compressor {
    /// Create a compressor for the channels of `layout`
    ///
    /// # Errors
    /// If `num_scan_lines` is zero
    pub fn new(
        layout: &PixelLayout, max_scan_line_size: usize, num_scan_lines: usize,
        options: CompressorOptions
    ) -> Result<B44Compressor, ExrCompressionErrors> {
        if num_scan_lines == 0 {
            return Err(ExrCompressionErrors::Generic(
                "B44 compressor needs at least one scan line per chunk"
            ));
        }
        let format = if options.get_allow_native_format() && layout.only_half_channels() {
            Format::Native
        } else {
            Format::Xdr
        };

        let planes: Vec<ChannelPlane> = layout
            .channels()
            .iter()
            .map(|c| ChannelPlane {
                pixel_type: c.pixel_type(),
                x_sampling: c.x_sampling(),
                y_sampling: c.y_sampling(),
                p_linear:   c.p_linear(),
                start:      0,
                cursor:     0,
                nx:         0,
                ny:         0
            })
            .collect();

        debug!(
            "B44 compressor: {} channels, {} lines per chunk, {:?} format",
            planes.len(),
            num_scan_lines,
            format
        );

        Ok(B44Compressor {
            num_scan_lines,
            data_window: layout.data_window(),
            format,
            strict_mode: options.get_strict_mode(),
            planes,
            scratch: Vec::with_capacity(max_scan_line_size.saturating_mul(num_scan_lines) / 2),
            output: Vec::new()
        })
    }

    fn scan_line_range(&self, min_y: i32) -> Region {
        let lines = i32::try_from(self.num_scan_lines).unwrap_or(i32::MAX);

        Region::new(
            self.data_window.min_x,
            min_y,
            self.data_window.max_x,
            min_y.saturating_add(lines - 1)
        )
    }

    fn clip(&self, range: Region) -> Result<Region, ExrCompressionErrors> {
        let window = self.data_window;
        let clipped = Region::new(
            range.min_x,
            range.min_y,
            range.max_x.min(window.max_x),
            range.max_y.min(window.max_y)
        );
        if range.min_x < window.min_x || range.min_y < window.min_y || clipped.is_empty() {
            return Err(ExrCompressionErrors::InvalidRegion(range));
        }
        Ok(clipped)
    }

    /// Size the planes for `range` and the scratch buffer to hold them all
    ///
    /// Returns the number of 16 bit words in all planes
    fn prepare_planes(&mut self, range: Region) -> usize {
        let mut start = 0;

        for plane in &mut self.planes {
            plane.nx = num_samples(plane.x_sampling, range.min_x, range.max_x);
            plane.ny = num_samples(plane.y_sampling, range.min_y, range.max_y);
            plane.start = start;
            plane.cursor = start;
            start += plane.len();
        }
        self.scratch.clear();
        self.scratch.resize(start, 0);

        start
    }

    fn compress_region(
        &mut self, input: &[u8], range: Region
    ) -> Result<&[u8], ExrCompressionErrors> {
        self.output.clear();

        if input.is_empty() {
            return Ok(&self.output);
        }
        let range = self.clip(range)?;
        let num_words = self.prepare_planes(range);

        if input.len() != num_words * 2 {
            return Err(ExrCompressionErrors::WrongInputSize(
                num_words * 2,
                input.len()
            ));
        }

        // interleaved lines to planes
        let mut position = 0;

        for y in range.min_y..=range.max_y {
            for plane in &mut self.planes {
                if modp(y, plane.y_sampling) != 0 {
                    continue;
                }
                let n = plane.nx * plane.words_per_sample();
                let row = &mut self.scratch[plane.cursor..plane.cursor + n];
                let bytes = &input[position..position + 2 * n];

                if plane.pixel_type == PixelType::Half && self.format == Format::Xdr {
                    for (word, b) in row.iter_mut().zip(bytes.chunks_exact(2)) {
                        *word = u16::from_le_bytes([b[0], b[1]]);
                    }
                } else {
                    for (word, b) in row.iter_mut().zip(bytes.chunks_exact(2)) {
                        *word = u16::from_ne_bytes([b[0], b[1]]);
                    }
                }
                plane.cursor += n;
                position += 2 * n;
            }
        }

        for plane in &self.planes {
            let words = &self.scratch[plane.start..plane.start + plane.len()];

            if plane.pixel_type == PixelType::Half {
                pack_plane(words, plane.nx, plane.ny, plane.p_linear, &mut self.output)?;
            } else {
                self.output.extend_from_slice(bytemuck::cast_slice(words));
            }
        }
        Ok(&self.output)
    }

    fn uncompress_region(
        &mut self, input: &[u8], range: Region
    ) -> Result<&[u8], ExrCompressionErrors> {
        self.output.clear();

        if input.is_empty() {
            return Ok(&self.output);
        }
        let range = self.clip(range)?;
        let num_words = self.prepare_planes(range);

        let mut position = 0;

        for plane in &self.planes {
            let words = &mut self.scratch[plane.start..plane.start + plane.len()];
            let remaining = &input[position..];

            if plane.pixel_type == PixelType::Half {
                position += unpack_plane(remaining, words, plane.nx, plane.ny, plane.p_linear)?;
            } else {
                let size = 2 * words.len();
                let bytes = remaining
                    .get(..size)
                    .ok_or(ExrCompressionErrors::NotEnoughData(size, remaining.len()))?;

                for (word, b) in words.iter_mut().zip(bytes.chunks_exact(2)) {
                    *word = u16::from_ne_bytes([b[0], b[1]]);
                }
                position += size;
            }
        }

        if position < input.len() {
            let extra = input.len() - position;

            if self.strict_mode {
                return Err(ExrCompressionErrors::TooMuchData(extra));
            }
            warn!("B44: {extra} bytes after the last block, ignoring them");
        }

        // planes back to interleaved lines
        self.output.reserve(num_words * 2);

        for y in range.min_y..=range.max_y {
            for plane in &mut self.planes {
                if modp(y, plane.y_sampling) != 0 {
                    continue;
                }
                let n = plane.nx * plane.words_per_sample();
                let row = &self.scratch[plane.cursor..plane.cursor + n];

                if plane.pixel_type == PixelType::Half && self.format == Format::Xdr {
                    for word in row {
                        self.output.extend_from_slice(&word.to_le_bytes());
                    }
                } else {
                    self.output.extend_from_slice(bytemuck::cast_slice(row));
                }
                plane.cursor += n;
            }
        }
        Ok(&self.output)
    }
}

impl Compressor for B44Compressor {
    fn num_scan_lines(&self) -> usize {
        self.num_scan_lines
    }

    fn format(&self) -> Format {
        self.format
    }

    fn compress(&mut self, input: &[u8], min_y: i32) -> Result<&[u8], ExrCompressionErrors> {
        let range = self.scan_line_range(min_y);
        self.compress_region(input, range)
    }

    fn compress_tile(&mut self, input: &[u8], range: Region) -> Result<&[u8], ExrCompressionErrors> {
        self.compress_region(input, range)
    }

    fn uncompress(&mut self, input: &[u8], min_y: i32) -> Result<&[u8], ExrCompressionErrors> {
        let range = self.scan_line_range(min_y);
        self.uncompress_region(input, range)
    }

    fn uncompress_tile(
        &mut self, input: &[u8], range: Region
    ) -> Result<&[u8], ExrCompressionErrors> {
        self.uncompress_region(input, range)
    }
}
