//! Performance benchmarks for the binnf codec.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use spikeport::binnf::{self, BlockReader};
use spikeport::marshal::{marshal_to_vec, MarshalOptions, NeuronTypeMap};
use spikeport::{Block, Connector, Header, Matrix, Network, NeuronType, NumericType};

fn connections_like(rows: usize) -> Block {
    let header = Header::new([
        ("pid_src", NumericType::Int32),
        ("pid_tar", NumericType::Int32),
        ("nid_src", NumericType::Int32),
        ("nid_tar", NumericType::Int32),
        ("weight", NumericType::Float32),
        ("delay", NumericType::Float32),
    ]);
    let mut matrix = Matrix::new(header, rows);
    for row in 0..rows {
        matrix.set(row, 2, row as i32);
        matrix.set(row, 3, (row * 7 % 1000) as i32);
        matrix.set(row, 4, 0.015f32);
        matrix.set(row, 5, 1.0f32);
    }
    Block::matrix("connections", matrix)
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for rows in [100, 10_000, 100_000].iter() {
        let block = connections_like(*rows);
        group.throughput(Throughput::Bytes(binnf::block_len(&block)));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &block, |b, block| {
            b.iter(|| black_box(binnf::encode(black_box(block)).unwrap()));
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for rows in [100, 10_000, 100_000].iter() {
        let bytes = binnf::encode(&connections_like(*rows)).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &bytes, |b, bytes| {
            b.iter(|| {
                for block in BlockReader::new(black_box(&bytes[..])) {
                    black_box(block.unwrap());
                }
            });
        });
    }
    group.finish();
}

fn bench_resync(c: &mut Criterion) {
    // one corrupt block followed by a good one
    let mut bytes = binnf::encode(&connections_like(10_000)).unwrap();
    bytes[8] = 0xEE;
    bytes.extend(binnf::encode(&connections_like(10)).unwrap());

    c.bench_function("resync_10k_rows", |b| {
        b.iter(|| black_box(binnf::decode_all(black_box(&bytes))));
    });
}

fn bench_marshal(c: &mut Criterion) {
    let mut group = c.benchmark_group("marshal");

    for size in [100, 1000].iter() {
        let mut net = Network::new();
        let input = net.create_population("input", *size, NeuronType::spike_source_array());
        let exc = net.create_population("exc", *size, NeuronType::if_cond_exp());
        for nid in 0..*size {
            net.population_mut(input)
                .unwrap()
                .set_spike_times(nid, (0..10).map(|i| i as f64 * 10.0).collect())
                .unwrap();
        }
        net.connect_populations(input, exc, Connector::fixed_fan_in(10, 0.01, 1.0, Some(0)))
            .unwrap();
        let types = NeuronTypeMap::binnf_default();
        let options = MarshalOptions::default();

        group.bench_with_input(BenchmarkId::from_parameter(size), &net, |b, net| {
            b.iter(|| black_box(marshal_to_vec(black_box(net), &types, &options).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_resync, bench_marshal);

criterion_main!(benches);
