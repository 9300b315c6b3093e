use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use candict_core::item::{decode, encode, Entry, Triple};
use candict_core::reorder::reorder_with;
use candict_core::sync::load;

fn bench_entry(words: usize) -> Entry {
    let mut e = Entry::new("ceshi");
    for i in 0..words {
        e.push(format!("词{i},#"), (i as u64 * 7919) % 50);
    }
    e
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    for words in [1, 8, 64] {
        let entry = bench_entry(words);
        let token = encode(&entry);
        group.bench_with_input(BenchmarkId::new("encode", words), &entry, |b, e| {
            b.iter(|| encode(e))
        });
        group.bench_with_input(BenchmarkId::new("decode", words), &token, |b, t| {
            b.iter(|| decode(t))
        });
        group.bench_with_input(BenchmarkId::new("reorder", words), &entry, |b, e| {
            b.iter(|| reorder_with(e, 1))
        });
    }
    group.finish();
}

fn bench_load(c: &mut Criterion) {
    let mut rows = Vec::new();
    for code in 0..2000u32 {
        let code_str: String = code
            .to_string()
            .bytes()
            .map(|b| char::from(b'a' + (b - b'0')))
            .collect();
        for w in 0..5u64 {
            rows.push(Triple::new(code_str.clone(), format!("w{w}"), w * 3));
        }
    }
    c.bench_function("load_10k_rows", |b| {
        b.iter(|| {
            let mut source = rows.clone();
            load(&mut source)
        })
    });
}

criterion_group!(benches, bench_codec, bench_load);
criterion_main!(benches);
