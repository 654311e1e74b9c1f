//! # Codec Benchmarks
//!
//! | Group | Measures |
//! |-------|----------|
//! | boc | Place records and wide cell trees to and from bytes |
//! | dict | Program dictionaries: build, serialize, load |

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use csm_cell::{boc, Address, Builder, CellRef};
use csm_contracts::records::{
    CellCodec, MatrixLevel, PlaceChildren, PlaceRecord, ProfilePrograms, ProfileRefs, ProgramData,
    SecurityInfo,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn addr(b: u8) -> Address {
    Address::new(0, [b; 32])
}

fn sample_place() -> PlaceRecord {
    PlaceRecord {
        marketing: addr(1),
        m: MatrixLevel::new(3).unwrap(),
        parent: Some(addr(2)),
        created_at: 1_700_000_000,
        fill_count: 4,
        profiles: ProfileRefs {
            clone: false,
            profile: addr(3),
            place_number: 42,
            inviter_profile: Some(addr(4)),
        },
        security: SecurityInfo { admin: addr(5) },
        children: Some(PlaceChildren {
            left: addr(6),
            right: Some(addr(7)),
        }),
    }
}

/// Complete tree of the given depth where every node holds 64 bits.
fn wide_tree(depth: u32, seed: &mut u64) -> CellRef {
    *seed += 1;
    let mut builder = Builder::new();
    builder.store_uint(*seed, 64).unwrap();
    if depth > 0 {
        for _ in 0..4 {
            builder.store_ref(wide_tree(depth - 1, seed)).unwrap();
        }
    }
    builder.end_cell().unwrap()
}

fn random_programs(size: usize) -> ProfilePrograms {
    let mut rng = StdRng::seed_from_u64(7);
    let mut programs = ProfilePrograms::new();
    for seq_no in 0..size as u32 {
        programs.set(
            rng.gen(),
            ProgramData {
                inviter: addr(rng.gen()),
                seq_no,
                invite: addr(rng.gen()),
                confirmed: true,
            },
        );
    }
    programs
}

fn bench_boc(c: &mut Criterion) {
    let mut group = c.benchmark_group("boc");
    group.measurement_time(Duration::from_secs(5));

    let place = sample_place();
    let place_bytes = place.to_boc().unwrap();
    group.bench_function("place_encode", |b| b.iter(|| black_box(place.to_boc().unwrap())));
    group.bench_function("place_decode", |b| {
        b.iter(|| black_box(PlaceRecord::from_boc(&place_bytes).unwrap()))
    });

    for depth in [2u32, 4] {
        let tree = wide_tree(depth, &mut 0);
        let bytes = boc::to_boc(&tree).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("tree_serialize", depth), &tree, |b, tree| {
            b.iter(|| black_box(boc::to_boc(tree).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("tree_parse", depth), &bytes, |b, bytes| {
            b.iter(|| black_box(boc::from_boc(bytes).unwrap()))
        });
    }
    group.finish();
}

fn bench_dict(c: &mut Criterion) {
    let mut group = c.benchmark_group("dict");

    for size in [10usize, 100, 1000] {
        let programs = random_programs(size);
        let root = programs.build_root().unwrap().unwrap();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("build", size), &programs, |b, programs| {
            b.iter(|| black_box(programs.build_root().unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("load", size), &root, |b, root| {
            b.iter(|| black_box(ProfilePrograms::load_root(root).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_boc, bench_dict);
criterion_main!(benches);
