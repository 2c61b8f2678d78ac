/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Compressor options

/// Options shared by all compressors
///
/// Constructed with defaults and modified via the `set_*` builder methods
///
/// # Example
/// ```
/// use zune_exr::CompressorOptions;
/// let options = CompressorOptions::default()
///     .set_zip_level(9)
///     .set_strict_mode(false);
/// assert_eq!(options.get_zip_level(), 9);
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CompressorOptions {
    zip_level:           u8,
    strict_mode:         bool,
    allow_native_format: bool
}

impl Default for CompressorOptions {
    fn default() -> Self {
        Self {
            zip_level:           6,
            strict_mode:         true,
            allow_native_format: true
        }
    }
}

impl CompressorOptions {
    /// Get the zlib compression level used by ZIP and ZIPS
    pub const fn get_zip_level(&self) -> u8 {
        self.zip_level
    }

    /// Set the zlib compression level
    ///
    /// Levels range from 0 (store only) to 9 (slowest, smallest),
    /// larger values are clamped to 9
    ///
    /// - Respected by: `ZIP` and `ZIPS`
    pub fn set_zip_level(mut self, level: u8) -> Self {
        self.zip_level = level.min(9);
        self
    }

    /// Get whether trailing data after a block is an error
    pub const fn get_strict_mode(&self) -> bool {
        self.strict_mode
    }

    /// Set whether compressors should be in strict mode
    ///
    /// In strict mode bytes left over after all pixels of a block
    /// have been decoded are reported as an error, otherwise
    /// they are logged and ignored
    ///
    /// - Respected by: `B44`
    pub fn set_strict_mode(mut self, yes: bool) -> Self {
        self.strict_mode = yes;
        self
    }

    /// Get whether compressors may use the machine byte order
    pub const fn get_allow_native_format(&self) -> bool {
        self.allow_native_format
    }

    /// Set whether compressors may exchange uncompressed data in
    /// the machine's byte order instead of little endian
    ///
    /// Even when allowed, a compressor only uses the native order when
    /// it can handle all channels in it, check
    /// [`Compressor::format`](crate::Compressor::format)
    ///
    /// - Respected by: `B44`
    pub fn set_allow_native_format(mut self, yes: bool) -> Self {
        self.allow_native_format = yes;
        self
    }
}
