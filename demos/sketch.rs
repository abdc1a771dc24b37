use std::thread;

use hll_sketch::Sketch;

fn main() {
    let sketch: Sketch = Sketch::new();
    for i in 0..192 {
        sketch.add(format!("hll-{}", i).as_bytes());
    }
    println!("{:?}", sketch);

    sketch.add(b"hll-192");
    println!("{:?}", sketch);

    thread::scope(|s| {
        for t in 0..4 {
            let sketch = &sketch;
            s.spawn(move || {
                for i in 0..250_000 {
                    sketch.add(format!("thread-{}-{}", t, i).as_bytes());
                }
            });
        }
    });
    println!("{:?}", sketch);
}
