#![no_main]

use hll_sketch::{RepresentationKind, Sketch};
use libfuzzer_sys::fuzz_target;
use wyhash::wyhash;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let split_index = wyhash(data, 0) as usize % data.len();
    let (first_half, second_half) = data.split_at(split_index);

    let sketch: Sketch = Sketch::new();
    for chunk in first_half.chunks(2).chain(second_half.chunks(3)) {
        sketch.add(chunk);
        assert!(sketch.cardinality() > 0);
        assert!(!sketch.add(chunk));
    }

    let (exact, dense) = sketch.to_parts();
    let restored = Sketch::from_parts(exact, dense).unwrap();
    assert_eq!(restored, sketch);
    if sketch.representation() == RepresentationKind::Exact {
        assert_eq!(restored.cardinality(), sketch.cardinality());
    }
});
