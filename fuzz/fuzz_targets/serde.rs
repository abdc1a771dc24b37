#![no_main]

use hll_sketch::Sketch;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(sketch) = serde_json::from_slice::<Sketch>(data) {
        sketch.add(b"fuzz");
        assert!(sketch.cardinality() > 0);
    }
});
