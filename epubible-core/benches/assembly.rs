//! Ordering and fragment rendering benchmarks

use criterion::{criterion_group, criterion_main, Criterion};
use epubible_core::assets::ResolvedAssets;
use epubible_core::order::order;
use epubible_core::render::render_fragments;
use epubible_core::VerseEntry;

/// Roughly the size of Psalms, shuffled deterministically
fn psalms() -> Vec<VerseEntry> {
    let mut entries: Vec<VerseEntry> = (1..=150u32)
        .flat_map(|chapter| {
            (1..=17u32).map(move |verse| {
                VerseEntry::new("Psalms", chapter, verse)
                    .with_text("O LORD our Lord,&nbsp;how excellent")
            })
        })
        .collect();
    let len = entries.len();
    for i in 0..len {
        entries.swap(i, (i * 7919) % len);
    }
    entries
}

fn assembly_benchmark(c: &mut Criterion) {
    let entries = psalms();
    c.bench_function("order_psalms", |b| {
        b.iter(|| order(std::hint::black_box(entries.clone())))
    });

    let ordered = order(entries);
    let assets = ResolvedAssets::default();
    c.bench_function("render_psalms", |b| {
        b.iter(|| render_fragments(std::hint::black_box(&ordered), &assets, "images"))
    });
}

criterion_group!(benches, assembly_benchmark);
criterion_main!(benches);
