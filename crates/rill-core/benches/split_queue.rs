//! SplitQueue hot-path benchmarks

use rill_core::SplitQueue;

fn main() {
    divan::main();
}

#[divan::bench]
fn take_one(bencher: divan::Bencher) {
    bencher
        .with_inputs(|| {
            let q = SplitQueue::new();
            q.append(0..1024u64);
            q
        })
        .bench_values(|q| {
            while q.take_one().is_some() {}
            q
        });
}

#[divan::bench]
fn snapshot_1k(bencher: divan::Bencher) {
    let q = SplitQueue::new();
    q.append(0..1024u64);
    bencher.bench(|| q.snapshot());
}

#[divan::bench]
fn append_64(bencher: divan::Bencher) {
    let q: SplitQueue<u64> = SplitQueue::new();
    bencher.bench(|| q.append(0..64u64));
}
