#![no_main]

use baseline_jpeg::{decode_jpeg, write_pnm, EnabledFeatures};

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut features = EnabledFeatures::default();

    // keep the allocations small so the fuzzer doesn't run out of memory
    features.max_jpeg_width = 2048;
    features.max_jpeg_height = 2048;

    if let Ok(image) = decode_jpeg(data, &features) {
        let mut output = Vec::new();
        let _ = write_pnm(&image, &mut output);
    }
});
