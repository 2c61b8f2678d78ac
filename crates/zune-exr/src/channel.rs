/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Channel descriptions and pixel regions
//!
//! This is the small slice of an image header a compressor needs to
//! know how the bytes it is handed are laid out.
use alloc::string::String;
use alloc::vec::Vec;

use crate::errors::ExrCompressionErrors;

/// The type of samples stored in a channel
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PixelType {
    /// 32 bit unsigned integer
    Uint,
    /// 16 bit IEEE 754 half float
    Half,
    /// 32 bit IEEE 754 float
    Float
}

impl PixelType {
    /// Size of one sample in bytes
    pub const fn size(self) -> usize {
        match self {
            PixelType::Uint | PixelType::Float => 4,
            PixelType::Half => 2
        }
    }

    /// Create a pixel type from the id stored in files
    pub const fn from_u32(id: u32) -> Option<PixelType> {
        match id {
            0 => Some(PixelType::Uint),
            1 => Some(PixelType::Half),
            2 => Some(PixelType::Float),
            _ => None
        }
    }

    /// The id stored in files, the inverse of [`PixelType::from_u32`]
    pub const fn to_u32(self) -> u32 {
        match self {
            PixelType::Uint => 0,
            PixelType::Half => 1,
            PixelType::Float => 2
        }
    }
}

/// A single image channel
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Channel {
    name:       String,
    pixel_type: PixelType,
    x_sampling: i32,
    y_sampling: i32,
    p_linear:   bool
}

impl Channel {
    /// Create a channel sampled at every pixel
    pub fn new(name: &str, pixel_type: PixelType) -> Channel {
        Channel {
            name: String::from(name),
            pixel_type,
            x_sampling: 1,
            y_sampling: 1,
            p_linear: false
        }
    }

    /// Set the horizontal and vertical subsampling factors
    ///
    /// A channel with sampling `(2, 2)` stores one sample for every
    /// 2x2 pixel square, at pixels whose coordinates are multiples of two
    #[must_use]
    pub const fn set_sampling(mut self, x_sampling: i32, y_sampling: i32) -> Channel {
        self.x_sampling = x_sampling;
        self.y_sampling = y_sampling;
        self
    }

    /// Mark the channel as perceptually linear
    ///
    /// Lossy compressors may store such channels in a log encoding
    #[must_use]
    pub const fn set_p_linear(mut self, yes: bool) -> Channel {
        self.p_linear = yes;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    pub const fn x_sampling(&self) -> i32 {
        self.x_sampling
    }

    pub const fn y_sampling(&self) -> i32 {
        self.y_sampling
    }

    pub const fn p_linear(&self) -> bool {
        self.p_linear
    }
}

/// An axis aligned box of pixels, both corners inclusive
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Region {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32
}

impl Region {
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Region {
        Region {
            min_x,
            min_y,
            max_x,
            max_y
        }
    }

    /// Whether the region contains no pixels
    pub const fn is_empty(&self) -> bool {
        self.max_x < self.min_x || self.max_y < self.min_y
    }

    pub const fn width(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        (self.max_x as i64 - self.min_x as i64 + 1) as usize
    }

    pub const fn height(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        (self.max_y as i64 - self.min_y as i64 + 1) as usize
    }
}

/// Channel list and data window of an image
#[derive(Clone, Debug, Default)]
pub struct PixelLayout {
    channels:    Vec<Channel>,
    data_window: Region
}

impl PixelLayout {
    /// Create a layout with no channels
    pub fn new(data_window: Region) -> PixelLayout {
        PixelLayout {
            channels: Vec::new(),
            data_window
        }
    }

    /// Add a channel to the layout
    ///
    /// Channels are kept sorted by name, the order they are
    /// interleaved in uncompressed scan lines.
    ///
    /// # Errors
    /// If the sampling factors are not positive or a channel with the same
    /// name already exists
    pub fn add_channel(&mut self, channel: Channel) -> Result<(), ExrCompressionErrors> {
        if channel.x_sampling < 1 || channel.y_sampling < 1 {
            return Err(ExrCompressionErrors::Generic(
                "Channel sampling factors must be at least 1"
            ));
        }
        match self
            .channels
            .binary_search_by(|c| c.name.as_str().cmp(channel.name.as_str()))
        {
            Ok(_) => Err(ExrCompressionErrors::Generic("Duplicate channel name")),
            Err(pos) => {
                self.channels.insert(pos, channel);
                Ok(())
            }
        }
    }

    /// Builder form of [`add_channel`](Self::add_channel)
    ///
    /// # Errors
    /// Same as `add_channel`
    pub fn with_channel(mut self, channel: Channel) -> Result<PixelLayout, ExrCompressionErrors> {
        self.add_channel(channel)?;
        Ok(self)
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub const fn data_window(&self) -> Region {
        self.data_window
    }

    /// Whether every channel stores half floats
    pub fn only_half_channels(&self) -> bool {
        self.channels
            .iter()
            .all(|c| c.pixel_type == PixelType::Half)
    }

    /// Number of bytes the pixels of `range` occupy uncompressed
    ///
    /// A channel contributes a scan line only if the line is a multiple of
    /// its vertical sampling, and a sample only at multiples of its
    /// horizontal sampling.
    pub fn region_byte_size(&self, range: Region) -> usize {
        if range.is_empty() {
            return 0;
        }
        let mut size = 0;

        for channel in &self.channels {
            let nx = num_samples(channel.x_sampling, range.min_x, range.max_x);
            let ny = num_samples(channel.y_sampling, range.min_y, range.max_y);
            size += nx * ny * channel.pixel_type.size();
        }
        size
    }

    /// Size in bytes of the largest uncompressed scan line of the data window
    pub fn max_scan_line_size(&self) -> usize {
        let window = self.data_window;

        if window.is_empty() {
            return 0;
        }
        let mut max_size = 0;

        for y in window.min_y..=window.max_y {
            let line = Region::new(window.min_x, y, window.max_x, y);
            max_size = max_size.max(self.region_byte_size(line));
        }
        max_size
    }
}

/// Integer division rounding towards negative infinity
#[inline]
pub const fn divp(x: i32, y: i32) -> i32 {
    x.div_euclid(y)
}

/// Remainder of [`divp`], always in `0..y` for positive `y`
#[inline]
pub const fn modp(x: i32, y: i32) -> i32 {
    x.rem_euclid(y)
}

/// Number of multiples of `s` in the inclusive range `a..=b`
#[inline]
pub const fn num_samples(s: i32, a: i32, b: i32) -> usize {
    if b < a {
        return 0;
    }
    let a1 = divp(a, s);
    let b1 = divp(b, s);
    let extra = if a1 * s < a { 0 } else { 1 };

    (b1 - a1 + extra) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_type_ids() {
        assert_eq!(PixelType::from_u32(0), Some(PixelType::Uint));
        assert_eq!(PixelType::from_u32(1), Some(PixelType::Half));
        assert_eq!(PixelType::from_u32(2), Some(PixelType::Float));
        assert_eq!(PixelType::from_u32(3), None);

        for pixel_type in [PixelType::Uint, PixelType::Half, PixelType::Float] {
            assert_eq!(PixelType::from_u32(pixel_type.to_u32()), Some(pixel_type));
        }
    }

    #[test]
    fn test_floor_division() {
        assert_eq!(divp(7, 2), 3);
        assert_eq!(divp(-7, 2), -4);
        assert_eq!(modp(-7, 2), 1);
        assert_eq!(modp(-4, 2), 0);
    }

    #[test]
    fn test_num_samples() {
        assert_eq!(num_samples(1, 0, 9), 10);
        assert_eq!(num_samples(2, 0, 9), 5);
        assert_eq!(num_samples(2, 1, 9), 4);
        assert_eq!(num_samples(2, -3, 3), 3);
        assert_eq!(num_samples(3, 1, 2), 0);
        assert_eq!(num_samples(4, 5, 4), 0);
    }

    #[test]
    fn test_channels_sorted() {
        let layout = PixelLayout::new(Region::new(0, 0, 9, 9))
            .with_channel(Channel::new("R", PixelType::Half))
            .and_then(|l| l.with_channel(Channel::new("B", PixelType::Float)))
            .and_then(|l| l.with_channel(Channel::new("G", PixelType::Uint)))
            .unwrap();

        let names: Vec<&str> = layout.channels().iter().map(|c| c.name()).collect();
        assert_eq!(names, ["B", "G", "R"]);
        assert!(!layout.only_half_channels());
        assert_eq!(layout.max_scan_line_size(), 10 * (4 + 4 + 2));
    }

    #[test]
    fn test_bad_channels_rejected() {
        let mut layout = PixelLayout::new(Region::new(0, 0, 3, 3));
        assert!(layout
            .add_channel(Channel::new("Y", PixelType::Half).set_sampling(0, 1))
            .is_err());
        assert!(layout.add_channel(Channel::new("Y", PixelType::Half)).is_ok());
        assert!(layout.add_channel(Channel::new("Y", PixelType::Half)).is_err());
    }

    #[test]
    fn test_subsampled_sizes() {
        let layout = PixelLayout::new(Region::new(0, 0, 7, 3))
            .with_channel(Channel::new("Y", PixelType::Half))
            .and_then(|l| l.with_channel(Channel::new("RY", PixelType::Half).set_sampling(2, 2)))
            .unwrap();
        // line 0 holds both channels, line 1 only luma
        assert_eq!(layout.region_byte_size(Region::new(0, 0, 7, 0)), 16 + 8);
        assert_eq!(layout.region_byte_size(Region::new(0, 1, 7, 1)), 16);
        assert_eq!(layout.max_scan_line_size(), 24);
        assert_eq!(layout.region_byte_size(layout.data_window()), 4 * 16 + 2 * 8);
    }
}
