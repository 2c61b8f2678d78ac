/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! B44 lossy block coding of half floats
//!
//! Every 4x4 block of half floats is stored in 12 bytes, the largest
//! value of the block at 12 bit precision, a shift, and sixteen 5 bit
//! differences from the largest value scaled down by that shift.
//!
//! Blocks of a nearly uniform value are reproduced exactly, blocks with a wide
//! range of values lose precision in their smaller values.
//!
//! Channels holding perceptually linear data can be stored in a log
//! encoding via [`convert_from_linear`] / [`convert_to_linear`], which
//! spreads the error more evenly across brightness levels.
use alloc::vec::Vec;

pub use crate::b44::tables::{exp_table, initialize_tables, log_table};
use crate::errors::ExrCompressionErrors;

mod tables;

/// Size in bytes of a packed 4x4 block
pub const PACKED_BLOCK_SIZE: usize = 12;

/// Largest value of the block after rounding, the bit pattern of `HALF_MAX`
/// rounded down to 12 bits in the ordered representation
const MAX_ROUNDED_VALUE: u16 = 0xfbf0;

/// `-HALF_MAX` in the ordered representation, anything below is a NaN or infinity
const MIN_ORDERED_VALUE: u16 = 0x0400;

/// `HALF_MAX` in the ordered representation
const MAX_ORDERED_VALUE: u16 = 0xfbff;

/// Map a half float bit pattern to one whose unsigned order
/// matches the order of the float values
///
/// NaNs and infinities become the pattern for zero
#[inline(always)]
const fn to_ordered(s: u16) -> u16 {
    if (s & 0x7c00) == 0x7c00 {
        0x8000
    } else if (s & 0x8000) != 0 {
        !s
    } else {
        s | 0x8000
    }
}

/// Inverse of [`to_ordered`]
#[inline(always)]
const fn from_ordered(t: u16) -> u16 {
    if (t & 0x8000) != 0 {
        t & 0x7fff
    } else {
        !t
    }
}

/// Pack 16 half floats into 12 bytes
///
/// # Arguments
/// - block: Bit patterns of a 4x4 block of half floats, row major
pub fn pack_block(block: &[u16; 16]) -> [u8; PACKED_BLOCK_SIZE] {
    let t = block.map(to_ordered);

    let largest = t.iter().copied().max().unwrap_or(0);
    // 12 bit precision, without going into the NaN/infinity range
    let t_max = (((u32::from(largest) + 0x0008) & 0xfff0) as u16).min(MAX_ROUNDED_VALUE);

    // rounding t_max down can push a few values above it
    let differences = t.map(|v| t_max.saturating_sub(v));
    let max_difference = differences.iter().copied().max().unwrap_or(0);

    let mut shift: u8 = 1;

    while (max_difference >> shift) > 0x1f {
        shift += 1;
    }

    let d = differences.map(|v| {
        let rounded = (u32::from(v) + (1 << (shift - 1))) >> shift;
        rounded.min(0x1f) as u8
    });

    let mut b = [0_u8; PACKED_BLOCK_SIZE];

    b[0] = (t_max >> 8) as u8;
    b[1] = ((t_max & 0xf0) as u8) | shift;
    //                                                  d         b
    b[2] = (d[0] << 3) | (d[1] >> 2); //                00000111  2
    b[3] = (d[1] << 6) | (d[2] << 1) | (d[3] >> 4); //  11222223  3
    b[4] = (d[3] << 4) | (d[4] >> 1); //                33334444  4
    b[5] = (d[4] << 7) | (d[5] << 2) | (d[6] >> 3); //  45555566  5
    b[6] = (d[6] << 5) | d[7]; //                       66677777  6
    b[7] = (d[8] << 3) | (d[9] >> 2); //                88888999  7
    b[8] = (d[9] << 6) | (d[10] << 1) | (d[11] >> 4); //99aaaaab  8
    b[9] = (d[11] << 4) | (d[12] >> 1); //              bbbbcccc  9
    b[10] = (d[12] << 7) | (d[13] << 2) | (d[14] >> 3); // cdddddee 10
    b[11] = (d[14] << 5) | d[15]; //                    eeefffff 11

    b
}

/// Unpack 12 bytes into 16 half floats
///
/// The reverse of [`pack_block`], the result is only an approximation of
/// the packed block unless the block was flat at 12 bit precision.
pub fn unpack_block(b: &[u8; PACKED_BLOCK_SIZE]) -> [u16; 16] {
    let t_max = (u16::from(b[0]) << 8) | u16::from(b[1] & 0xf0);
    let shift = u32::from(b[1] & 0x0f);

    let d: [u8; 16] = [
        b[2] >> 3,
        (b[2] << 2) | (b[3] >> 6),
        b[3] >> 1,
        (b[3] << 4) | (b[4] >> 4),
        (b[4] << 1) | (b[5] >> 7),
        b[5] >> 2,
        (b[5] << 3) | (b[6] >> 5),
        b[6],
        b[7] >> 3,
        (b[7] << 2) | (b[8] >> 6),
        b[8] >> 1,
        (b[8] << 4) | (b[9] >> 4),
        (b[9] << 1) | (b[10] >> 7),
        b[10] >> 2,
        (b[10] << 3) | (b[11] >> 5),
        b[11]
    ];

    // rounded differences and corrupt blocks can step outside the
    // finite range, clamp to +-HALF_MAX before mapping back
    d.map(|d| {
        let difference = (u32::from(d & 0x1f) << shift).min(u32::from(u16::MAX)) as u16;
        let t = t_max
            .saturating_sub(difference)
            .clamp(MIN_ORDERED_VALUE, MAX_ORDERED_VALUE);
        from_ordered(t)
    })
}

/// Replace linear values with `exp(x / 8)` before packing
pub fn convert_from_linear(block: &mut [u16; 16]) {
    let table = exp_table();

    for s in block.iter_mut() {
        *s = table[usize::from(*s)];
    }
}

/// Replace values with `8 * ln(x)` after unpacking
pub fn convert_to_linear(block: &mut [u16; 16]) {
    let table = log_table();

    for s in block.iter_mut() {
        *s = table[usize::from(*s)];
    }
}

/// Number of bytes [`pack_plane`] produces for a `width` x `height` plane
pub const fn packed_plane_size(width: usize, height: usize) -> usize {
    width.div_ceil(4) * height.div_ceil(4) * PACKED_BLOCK_SIZE
}

fn check_plane_size(
    length: usize, width: usize, height: usize
) -> Result<(), ExrCompressionErrors> {
    let expected = width
        .checked_mul(height)
        .ok_or(ExrCompressionErrors::WrongInputSize(usize::MAX, length))?;

    if length < expected {
        return Err(ExrCompressionErrors::WrongInputSize(expected, length));
    }
    Ok(())
}

/// Pack a plane of half floats into 12 byte blocks, appending them to `output`
///
/// Blocks are written in raster order. When the plane dimensions are not multiples
/// of 4 the last blocks are padded by repeating the rightmost column and
/// the bottom row.
///
/// # Arguments
/// - plane: `width * height` half floats, row major
/// - p_linear: Whether to store the values in a log encoding
///
/// # Errors
/// `WrongInputSize` if `plane` holds fewer than `width * height` values
pub fn pack_plane(
    plane: &[u16], width: usize, height: usize, p_linear: bool, output: &mut Vec<u8>
) -> Result<(), ExrCompressionErrors> {
    check_plane_size(plane.len(), width, height)?;

    if width == 0 || height == 0 {
        return Ok(());
    }
    output.reserve(packed_plane_size(width, height));

    for y in (0..height).step_by(4) {
        let rows: [usize; 4] = core::array::from_fn(|r| (y + r).min(height - 1) * width);

        for x in (0..width).step_by(4) {
            let mut block = [0_u16; 16];

            for (r, row) in rows.iter().enumerate() {
                for i in 0..4 {
                    block[r * 4 + i] = plane[row + (x + i).min(width - 1)];
                }
            }
            if p_linear {
                convert_from_linear(&mut block);
            }
            output.extend_from_slice(&pack_block(&block));
        }
    }
    Ok(())
}

/// Unpack a plane written by [`pack_plane`]
///
/// Returns the number of bytes of `data` used.
///
/// # Errors
/// - `WrongInputSize` if `plane` has room for fewer than `width * height` values
/// - `NotEnoughData` if `data` ends before all blocks were read
pub fn unpack_plane(
    data: &[u8], plane: &mut [u16], width: usize, height: usize, p_linear: bool
) -> Result<usize, ExrCompressionErrors> {
    check_plane_size(plane.len(), width, height)?;

    let mut position = 0;

    for y in (0..height).step_by(4) {
        for x in (0..width).step_by(4) {
            let packed: &[u8; PACKED_BLOCK_SIZE] = data
                .get(position..position + PACKED_BLOCK_SIZE)
                .and_then(|bytes| bytes.try_into().ok())
                .ok_or(ExrCompressionErrors::NotEnoughData(
                    PACKED_BLOCK_SIZE,
                    data.len() - position
                ))?;
            position += PACKED_BLOCK_SIZE;

            let mut block = unpack_block(packed);

            if p_linear {
                convert_to_linear(&mut block);
            }

            let columns = (width - x).min(4);

            for r in 0..(height - y).min(4) {
                let start = (y + r) * width + x;
                plane[start..start + columns].copy_from_slice(&block[r * 4..r * 4 + columns]);
            }
        }
    }
    Ok(position)
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::half::{f32_to_half, half_to_f32, is_nan_or_inf, HALF_MAX, HALF_POS_INF};

    #[test]
    fn test_ordered_mapping() {
        assert_eq!(to_ordered(0x7bff), 0xfbff);
        assert_eq!(to_ordered(0x0000), 0x8000);
        assert_eq!(to_ordered(0x8000), 0x7fff);
        assert_eq!(to_ordered(0xfbff), 0x0400);
        assert_eq!(to_ordered(HALF_POS_INF), 0x8000);

        for s in [0x0000, 0x8000, 0x3c00, 0xbc00, 0x7bff, 0xfbff, 0x0001] {
            assert_eq!(from_ordered(to_ordered(s)), s);
        }
    }

    #[test]
    fn test_flat_blocks_exact() {
        // values already at 12 bit precision in the ordered representation
        for bits in [0x0000, 0x3800, 0x3c00, 0x4000, 0x5a30, 0xbc0f, 0xc7ff] {
            let block = [bits; 16];
            assert_eq!(unpack_block(&pack_block(&block)), block, "{bits:#06x}");
        }
    }

    #[test]
    fn test_flat_blocks_close() {
        for value in [0.1_f32, 3.3, -7.25, 1000.0] {
            let block = [f32_to_half(value); 16];
            let unpacked = unpack_block(&pack_block(&block));
            for s in unpacked {
                let back = half_to_f32(s);
                assert!((back - value).abs() <= value.abs() * 0.01, "{value} became {back}");
            }
        }
    }

    #[test]
    fn test_byte_layout() {
        let block = [f32_to_half(1.0); 16];
        let packed = pack_block(&block);
        // 1.0 is 0x3c00, ordered 0xbc00
        assert_eq!(packed[0], 0xbc);
        assert_eq!(packed[1], 0x01);
        assert!(packed[2..].iter().all(|b| *b == 0));

        let mut block = [f32_to_half(1.0); 16];
        block[15] = f32_to_half(0.0);
        let packed = pack_block(&block);
        // 0xbc00 - 0x8000 needs a shift of 9 to fit 5 bits
        assert_eq!(packed[1] & 0x0f, 9);
        assert_eq!(packed[11] & 0x1f, 0x1e);
        assert_eq!(unpack_block(&packed)[15], 0x0000);
    }

    #[test]
    fn test_nan_and_infinity_dropped() {
        let mut block = [f32_to_half(1.5); 16];
        block[3] = HALF_POS_INF;
        block[7] = 0x7e00;
        block[9] = 0xfc00;

        for s in unpack_block(&pack_block(&block)) {
            assert!(!is_nan_or_inf(s));
        }
    }

    #[test]
    fn test_wide_block_stays_finite() {
        // the smallest value rounds below -HALF_MAX
        let mut block = [0_u16; 16];
        block[0] = HALF_MAX;
        block[1] = 0xfbff;
        block[2] = 0x7e00;

        let unpacked = unpack_block(&pack_block(&block));
        for s in unpacked {
            assert!(!is_nan_or_inf(s), "{s:#06x}");
        }
        assert_eq!(unpacked[1], 0xfbff);
    }

    #[test]
    fn test_corrupt_block_stays_finite() {
        // t_max in the infinity range, with a shift past 16 bits
        let mut packed = [0xff_u8; PACKED_BLOCK_SIZE];
        for s in unpack_block(&packed) {
            assert!(!is_nan_or_inf(s), "{s:#06x}");
        }
        packed[2..].fill(0);
        assert_eq!(unpack_block(&packed), [HALF_MAX; 16]);
    }

    #[test]
    fn test_undersized_plane() {
        let plane = [0_u16; 15];
        let mut packed = vec![];
        assert!(matches!(
            pack_plane(&plane, 4, 4, false, &mut packed),
            Err(ExrCompressionErrors::WrongInputSize(16, 15))
        ));
        assert!(packed.is_empty());
        assert!(matches!(
            pack_plane(&plane, usize::MAX, 2, false, &mut packed),
            Err(ExrCompressionErrors::WrongInputSize(usize::MAX, 15))
        ));

        let packed = [0_u8; 12];
        let mut unpacked = [0_u16; 15];
        assert!(matches!(
            unpack_plane(&packed, &mut unpacked, 4, 4, false),
            Err(ExrCompressionErrors::WrongInputSize(16, 15))
        ));
    }

    #[test]
    fn test_max_value_clamped() {
        let block = [HALF_MAX; 16];
        let unpacked = unpack_block(&pack_block(&block));
        for s in unpacked {
            assert!(!is_nan_or_inf(s));
            assert!(half_to_f32(s) > 65000.0);
        }
    }

    #[test]
    fn test_edge_padding() {
        // 3x3 plane, the rightmost column and bottom row are repeated
        let one = f32_to_half(1.0);
        let two = f32_to_half(2.0);
        let plane = [one, one, two, one, one, two, one, one, two];

        let mut packed = vec![];
        pack_plane(&plane, 3, 3, false, &mut packed).unwrap();
        assert_eq!(packed.len(), packed_plane_size(3, 3));

        let block = unpack_block(packed[..12].try_into().unwrap());
        assert_eq!(block[3], block[2]);
        assert_eq!(block[12..16], block[8..12]);

        // flat planes survive the padding exactly
        let plane = [two; 9];
        let mut packed = vec![];
        pack_plane(&plane, 3, 3, false, &mut packed).unwrap();
        let mut unpacked = [0; 9];
        assert_eq!(unpack_plane(&packed, &mut unpacked, 3, 3, false).unwrap(), 12);
        assert_eq!(unpacked, plane);
    }

    #[test]
    fn test_plane_blocks_raster_order() {
        // 8x4 plane, left block zeros, right block ones
        let one = f32_to_half(1.0);
        let plane: Vec<u16> = (0..32).map(|i| if i % 8 < 4 { 0 } else { one }).collect();

        let mut packed = vec![];
        pack_plane(&plane, 8, 4, false, &mut packed).unwrap();
        assert_eq!(packed.len(), 24);
        assert_eq!(unpack_block(packed[..12].try_into().unwrap()), [0; 16]);
        assert_eq!(unpack_block(packed[12..].try_into().unwrap()), [one; 16]);

        let mut unpacked = vec![0; 32];
        unpack_plane(&packed, &mut unpacked, 8, 4, false).unwrap();
        assert_eq!(unpacked, plane);
    }

    #[test]
    fn test_truncated_plane() {
        let plane = [0_u16; 64];
        let mut packed = vec![];
        pack_plane(&plane, 8, 8, false, &mut packed).unwrap();
        let mut unpacked = [0; 64];

        assert!(matches!(
            unpack_plane(&packed[..40], &mut unpacked, 8, 8, false),
            Err(ExrCompressionErrors::NotEnoughData(12, 4))
        ));
    }

    #[test]
    fn test_log_encoding() {
        let values = [0.25_f32, 0.5, 1.0, 2.0];
        let mut block = [0; 16];
        for (i, s) in block.iter_mut().enumerate() {
            *s = f32_to_half(values[i % 4]);
        }
        let mut plane_out = vec![];
        pack_plane(&block, 4, 4, true, &mut plane_out).unwrap();

        let mut unpacked = [0; 16];
        unpack_plane(&plane_out, &mut unpacked, 4, 4, true).unwrap();

        for (s, v) in unpacked.iter().zip(values.iter().cycle()) {
            let back = half_to_f32(*s);
            assert!((back - v).abs() <= 0.1, "{v} became {back}");
        }
    }
}
