use holdfast::Deque;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static ALLOC: jemallocator::Jemalloc = jemallocator::Jemalloc;

const N: u32 = 1 << 22;

fn run(name: &str, mut push: impl FnMut(u32)) {
    // Keep allocating on the side so the container under test cannot grow in
    // place. The side allocations are large enough that the allocator cannot
    // satisfy them out of memory the container just vacated.
    let mut prevent_realloc = Vec::<Box<[u8; 16]>>::new();
    let mut mx = 0.0f64;
    let mut sum = Duration::new(0, 0);
    for i in 0..N {
        let t = Instant::now();
        push(i);
        let took = t.elapsed();
        mx = mx.max(took.as_secs_f64());
        sum += took;
        println!("{} {} {} ms", i, name, took.as_secs_f64() * 1000.0);
        prevent_realloc.push(Box::new([0; 16]));
    }
    eprintln!(
        "{} max: {:?}, mean: {:?}",
        name,
        Duration::from_secs_f64(mx),
        sum / N
    );
}

fn main() {
    let mut vs = Vec::new();
    run("vec", |i| vs.push(i));
    drop(vs);

    let mut vs = VecDeque::new();
    run("vecdeque", |i| vs.push_back(i));
    drop(vs);

    let mut vs = Deque::new();
    run("holdfast", |i| vs.push_back(i));
    drop(vs);
}
