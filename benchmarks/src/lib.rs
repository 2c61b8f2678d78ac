/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use zune_exr::half::f32_to_half;
use zune_exr::{Channel, PixelLayout, PixelType, Region};

/// A smooth gradient with some ripples, `width * height` half floats
pub fn sample_plane(width: usize, height: usize) -> Vec<u16> {
    let mut plane = Vec::with_capacity(width * height);

    for y in 0..height {
        for x in 0..width {
            let fx = x as f32 / width as f32;
            let fy = y as f32 / height as f32;
            let value = 0.5 + fx * fy * 4.0 + 0.05 * (fx * 40.0).sin() * (fy * 25.0).cos();
            plane.push(f32_to_half(value));
        }
    }
    plane
}

/// Symbols resembling wavelet coefficients, mostly small with long zero runs
pub fn sample_symbols(count: usize) -> Vec<u16> {
    let mut state = 0x2545_f491_u32;

    (0..count)
        .map(|i| {
            // xorshift
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;

            if (i / 256) % 3 == 0 {
                0
            } else {
                (state % 64) as u16
            }
        })
        .collect()
}

/// An RGB half float layout of `width x height` pixels
pub fn rgb_layout(width: i32, height: i32) -> PixelLayout {
    PixelLayout::new(Region::new(0, 0, width - 1, height - 1))
        .with_channel(Channel::new("R", PixelType::Half))
        .and_then(|l| l.with_channel(Channel::new("G", PixelType::Half)))
        .and_then(|l| l.with_channel(Channel::new("B", PixelType::Half)))
        .unwrap()
}

/// Uncompressed little endian bytes of `lines` scan lines of an [`rgb_layout`]
pub fn rgb_scan_lines(width: usize, lines: usize) -> Vec<u8> {
    let plane = sample_plane(width, lines);
    let mut out = Vec::with_capacity(width * lines * 6);

    for row in plane.chunks_exact(width) {
        // B, G, R with slightly different values
        for shift in [0_u16, 1, 2] {
            for sample in row {
                out.extend_from_slice(&(sample + shift).to_le_bytes());
            }
        }
    }
    out
}
