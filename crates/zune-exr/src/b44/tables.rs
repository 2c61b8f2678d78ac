/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Companding lookup tables
//!
//! Both tables map every half float bit pattern to another one.
//! They are computed on first use and shared by all threads afterwards.
use alloc::vec::Vec;
use std::sync::LazyLock;

use log::trace;

use crate::half::{f32_to_half, half_to_f32, is_nan_or_inf, is_negative, is_zero, HALF_MAX, HALF_NEG_INF};

static EXP_TABLE: LazyLock<Vec<u16>> = LazyLock::new(|| {
    trace!("Computing B44 exp table");
    (0..=u16::MAX).map(exp_entry).collect()
});

static LOG_TABLE: LazyLock<Vec<u16>> = LazyLock::new(|| {
    trace!("Computing B44 log table");
    (0..=u16::MAX).map(log_entry).collect()
});

/// `exp(x / 8)`, the mapping applied before packing
///
/// NaN, infinity and values whose result would underflow map to zero,
/// values whose result would overflow map to `HALF_MAX`
fn exp_entry(x: u16) -> u16 {
    if is_nan_or_inf(x) {
        return 0;
    }
    if x >= 0xe280 {
        // x <= -832.0
        return 0;
    }
    if (0x558c..0x8000).contains(&x) {
        // x >= 8 * ln(HALF_MAX)
        return HALF_MAX;
    }
    f32_to_half((half_to_f32(x) / 8.0).exp())
}

/// `8 * ln(x)`, the mapping applied after unpacking
///
/// Zero maps to negative infinity, values without a logarithm to zero
fn log_entry(x: u16) -> u16 {
    if is_zero(x) {
        return HALF_NEG_INF;
    }
    if is_nan_or_inf(x) || is_negative(x) {
        return 0;
    }
    f32_to_half(8.0 * half_to_f32(x).ln())
}

/// The table used by `convert_from_linear`
pub fn exp_table() -> &'static [u16] {
    &EXP_TABLE
}

/// The table used by `convert_to_linear`
pub fn log_table() -> &'static [u16] {
    &LOG_TABLE
}

/// Compute both tables now instead of on first use
///
/// Calling this more than once, or from several threads, is harmless
pub fn initialize_tables() {
    LazyLock::force(&EXP_TABLE);
    LazyLock::force(&LOG_TABLE);
}
