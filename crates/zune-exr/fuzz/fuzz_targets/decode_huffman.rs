#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // first two bytes pick the symbol count
    if data.len() < 2 {
        return;
    }
    let num_symbols = usize::from(u16::from_le_bytes([data[0], data[1]]));
    let decoder = zune_exr::huffman::HuffmanDecoder::new(&data[2..], num_symbols);
    let _ = decoder.decode();
});
