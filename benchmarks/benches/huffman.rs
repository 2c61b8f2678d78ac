/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use zune_benches::sample_symbols;
use zune_exr::huffman::{HuffmanDecoder, HuffmanEncoder};

fn bench_huffman(c: &mut Criterion) {
    let symbols = sample_symbols(1 << 20);
    let compressed = HuffmanEncoder::new(&symbols).encode().unwrap();

    let mut group = c.benchmark_group("huffman");

    group.throughput(Throughput::Bytes((symbols.len() * 2) as u64));

    group.bench_function("encode", |b| {
        b.iter(|| black_box(HuffmanEncoder::new(&symbols).encode().unwrap()))
    });

    let mut output = vec![0; symbols.len()];

    group.bench_function("decode", |b| {
        b.iter(|| {
            HuffmanDecoder::new(&compressed, symbols.len())
                .decode_into(&mut output)
                .unwrap();
            black_box(&output);
        })
    });
}

criterion_group!(name=benches;
      config={
      let c = Criterion::default();
        c.measurement_time(Duration::from_secs(20))
      };
    targets=bench_huffman);

criterion_main!(benches);
