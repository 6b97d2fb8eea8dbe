use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use raiden::raid::StripeCodec;

fn bench_encode(c: &mut Criterion) {
    let data: Vec<u8> = (0..4 * 1024 * 1024).map(|i| (i * 31 + 7) as u8).collect();

    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Bytes(data.len() as u64));
    for disks in [3, 5, 10] {
        let codec = StripeCodec::new(disks).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(disks), &data, |b, data| {
            b.iter(|| codec.encode(black_box(data)).unwrap())
        });
    }
    group.finish();
}

fn bench_reconstruct(c: &mut Criterion) {
    let data: Vec<u8> = (0..4 * 1024 * 1024).map(|i| (i * 31 + 7) as u8).collect();

    let mut group = c.benchmark_group("reconstruct_missing_data_shard");
    group.throughput(Throughput::Bytes(data.len() as u64));
    for disks in [3, 5, 10] {
        let codec = StripeCodec::new(disks).unwrap();
        let stripe = codec.encode(&data).unwrap();
        let mut set = stripe.into_set();
        set.remove(0);

        group.bench_with_input(BenchmarkId::from_parameter(disks), &set, |b, set| {
            b.iter(|| codec.reconstruct(black_box(set.clone())).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_reconstruct);
criterion_main!(benches);
