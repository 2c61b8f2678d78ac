#![no_main]

use libfuzzer_sys::fuzz_target;
use zune_exr::{
    new_compressor, Channel, Compression, CompressorOptions, PixelLayout, PixelType, Region
};

fuzz_target!(|data: &[u8]| {
    let Some((&method, data)) = data.split_first() else {
        return;
    };
    let Some((&kind, data)) = data.split_first() else {
        return;
    };
    let Some(pixel_type) = PixelType::from_u32(u32::from(kind % 3)) else {
        return;
    };
    let compression = match method % 4 {
        0 => Compression::Rle,
        1 => Compression::Zips,
        2 => Compression::Zip,
        _ => Compression::B44
    };
    let layout = PixelLayout::new(Region::new(0, 0, 37, 63))
        .with_channel(Channel::new("Y", PixelType::Half).set_p_linear(true))
        .and_then(|l| l.with_channel(Channel::new("RY", PixelType::Half).set_sampling(2, 2)))
        .and_then(|l| l.with_channel(Channel::new("Z", pixel_type)))
        .unwrap();

    let mut compressor = new_compressor(
        compression,
        layout.max_scan_line_size(),
        &layout,
        CompressorOptions::default()
    )
    .unwrap();
    let _ = compressor.uncompress(data, 0);
});
