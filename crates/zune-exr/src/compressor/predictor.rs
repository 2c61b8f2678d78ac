/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Byte reordering and delta prediction run before RLE and ZIP
//!
//! Even bytes go to the first half of the buffer and odd bytes to the second, so
//! the high and low bytes of 16 bit samples end up apart. Then every byte is
//! replaced with its difference from the previous byte plus 128.
use alloc::vec::Vec;

/// Reorder and predict `raw`, replacing the contents of `out`
pub(crate) fn split_and_predict(raw: &[u8], out: &mut Vec<u8>) {
    out.clear();
    out.resize(raw.len(), 0);

    let half = raw.len().div_ceil(2);
    let (first, second) = out.split_at_mut(half);

    for (dest, src) in first.iter_mut().zip(raw.iter().step_by(2)) {
        *dest = *src;
    }
    for (dest, src) in second.iter_mut().zip(raw.iter().skip(1).step_by(2)) {
        *dest = *src;
    }

    let Some(mut previous) = out.first().copied() else {
        return;
    };

    for byte in out.iter_mut().skip(1) {
        let current = *byte;
        *byte = current.wrapping_sub(previous).wrapping_add(128);
        previous = current;
    }
}

/// Undo the prediction in place, then interleave the two halves into `out`
pub(crate) fn reconstruct_and_interleave(predicted: &mut [u8], out: &mut Vec<u8>) {
    for i in 1..predicted.len() {
        predicted[i] = predicted[i - 1].wrapping_add(predicted[i]).wrapping_sub(128);
    }

    out.clear();
    out.reserve(predicted.len());

    let half = predicted.len().div_ceil(2);
    let (first, second) = predicted.split_at(half);

    for (i, even) in first.iter().enumerate() {
        out.push(*even);

        if let Some(odd) = second.get(i) {
            out.push(*odd);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn test_predicted_layout() {
        let mut out = vec![];
        split_and_predict(&[10, 200, 12, 201, 14], &mut out);
        // reordered: 10 12 14 200 201
        // 200 - 14 + 128 wraps around
        assert_eq!(out, [10, 130, 130, 58, 129]);
    }

    #[test]
    fn test_reverses() {
        for len in [0_usize, 1, 2, 7, 64, 1001] {
            let raw: Vec<u8> = (0..len).map(|x| (x * 37 % 256) as u8).collect();
            let mut predicted = vec![];
            split_and_predict(&raw, &mut predicted);
            assert_eq!(predicted.len(), raw.len());

            let mut restored = vec![];
            reconstruct_and_interleave(&mut predicted, &mut restored);
            assert_eq!(restored, raw);
        }
    }
}
