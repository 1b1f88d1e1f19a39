use criterion::{black_box, criterion_group, criterion_main, Criterion};
use flacore::decoder::FlacDecoder;
use std::fs::File;
use std::time::Duration;

fn decode(filename: &str) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(filename)?;
    let mut decoder = FlacDecoder::new(file);
    decoder.initialize()?;

    while !decoder.eos()? {
        decoder.decode_frame()?;
    }

    Ok(())
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoders");
    group.sample_size(20).measurement_time(Duration::new(20, 0));
    group.bench_function("decode_flac", |b| {
        b.iter(|| decode(black_box("benches/fixtures/sample.flac")))
    });
    group.finish();
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
