/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use nanorand::{Rng, WyRand};
use zune_exr::b44::{
    exp_table, initialize_tables, log_table, pack_block, unpack_block, PACKED_BLOCK_SIZE
};
use zune_exr::half::{f32_to_half, half_to_f32, is_nan_or_inf, HALF_MAX};

fn random_block(rand: &mut WyRand, low: f32, high: f32) -> [u16; 16] {
    core::array::from_fn(|_| {
        let t = rand.generate::<u32>() as f32 / u32::MAX as f32;
        f32_to_half(low + t * (high - low))
    })
}

#[test]
fn test_flat_blocks() {
    // exact at 12 bit precision, close otherwise
    for value in [0.0_f32, 0.5, 1.0, 2.0, 4.0, 0.25] {
        let block = [f32_to_half(value); 16];
        assert_eq!(unpack_block(&pack_block(&block)), block, "{value}");
    }
    for value in [-1.0_f32, 0.3, 17.7, -0.001, 6000.0] {
        let block = [f32_to_half(value); 16];
        for s in unpack_block(&pack_block(&block)) {
            let back = half_to_f32(s);
            assert!(
                (back - value).abs() <= value.abs() / 100.0,
                "{value} became {back}"
            );
        }
    }
}

#[test]
fn test_small_range_error_bound() {
    let mut rand = WyRand::new_seed(3);

    for _ in 0..2000 {
        let base = (rand.generate::<u32>() % 1000) as f32 / 10.0 + 1.0;
        let block = random_block(&mut rand, base, base * 1.5);
        let unpacked = unpack_block(&pack_block(&block));

        for (a, b) in block.iter().zip(unpacked.iter()) {
            let a = half_to_f32(*a);
            let b = half_to_f32(*b);
            assert!((a - b).abs() <= a.abs() * 0.05, "{a} became {b}");
        }
    }
}

#[test]
fn test_never_produces_nan_from_finite_blocks() {
    let mut rand = WyRand::new_seed(11);

    for _ in 0..5000 {
        let block = random_block(&mut rand, -30000.0, 30000.0);
        for s in unpack_block(&pack_block(&block)) {
            assert!(!is_nan_or_inf(s));
        }
    }
    for s in unpack_block(&pack_block(&[HALF_MAX; 16])) {
        assert!(!is_nan_or_inf(s));
    }
}

#[test]
fn test_arbitrary_bytes_unpack() {
    let mut rand = WyRand::new_seed(5);
    let mut packed = [0_u8; PACKED_BLOCK_SIZE];

    for _ in 0..10_000 {
        rand.fill(&mut packed);
        // any 12 bytes are a block of finite values
        for s in unpack_block(&packed) {
            assert!(!is_nan_or_inf(s), "{packed:?}");
        }
    }
}

#[test]
fn test_tables() {
    initialize_tables();

    let exp = exp_table();
    let log = log_table();
    assert_eq!(exp.len(), 1 << 16);
    assert_eq!(log.len(), 1 << 16);

    // ln(1) = 0, exp(0) = 1
    assert_eq!(log[usize::from(f32_to_half(1.0))], 0);
    assert_eq!(exp[0], f32_to_half(1.0));

    // negative values, NaNs and infinities map to zero
    assert_eq!(log[usize::from(f32_to_half(-2.0))], 0);
    assert_eq!(exp[0x7c00], 0);
    assert_eq!(log[0x7e00], 0);
}
