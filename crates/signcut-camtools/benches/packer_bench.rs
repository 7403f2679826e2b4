//! Packing and EcoCut benchmarks.
//!
//! Run with: cargo bench -p signcut-camtools

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use signcut_camtools::{EcoCutJoiner, PackOptions, Packer};
use signcut_core::{BBox, Budget, Point, StrategyKind};
use signcut_designer::{Part, PartGeometry, PathData};

/// Deterministic mix of rectangles, some with a hole.
fn make_parts(count: u32) -> Vec<Part> {
    (0..count)
        .map(|i| {
            let w = 10.0 + f64::from((i * 37) % 90);
            let h = 10.0 + f64::from((i * 53) % 70);
            let outer = vec![
                Point::new(0.0, 0.0),
                Point::new(w, 0.0),
                Point::new(w, h),
                Point::new(0.0, h),
                Point::new(0.0, 0.0),
            ];
            let holes = if i % 5 == 0 && w > 40.0 && h > 40.0 {
                vec![BBox::new(w * 0.25, h * 0.25, w * 0.35, h * 0.35)]
            } else {
                Vec::new()
            };
            Part {
                id: i + 1,
                path: PathData::polygon(&outer[..4], true),
                fill: "#000000".into(),
                bbox: BBox::new(0.0, 0.0, w, h),
                original_bbox: BBox::new(0.0, 0.0, w, h),
                geometry: PartGeometry {
                    outer,
                    holes: Vec::new(),
                },
                holes,
            }
        })
        .collect()
}

fn bench_pack(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack");
    for &count in &[50u32, 200, 800] {
        let parts = make_parts(count);
        for strategy in [StrategyKind::FirstFit, StrategyKind::BestShortSideFit] {
            let packer = Packer::new(PackOptions {
                strategy,
                ..Default::default()
            });
            group.bench_with_input(
                BenchmarkId::new(strategy.to_string(), count),
                &parts,
                |b, parts| b.iter(|| packer.pack(black_box(parts), &Budget::unlimited())),
            );
        }
    }
    group.finish();
}

fn bench_ecocut(c: &mut Criterion) {
    let parts = make_parts(60);
    let Ok(layout) = Packer::new(PackOptions::default()).pack(&parts, &Budget::unlimited()) else {
        return;
    };
    let joiner = EcoCutJoiner::new(2.0);
    let Some(sheet) = layout.sheets.first() else {
        return;
    };
    let (contours, _) = joiner.collect_contours(sheet, &parts);

    c.bench_function("ecocut_join_60", |b| {
        b.iter(|| joiner.join(black_box(contours.clone()), &Budget::unlimited()))
    });
}

criterion_group!(benches, bench_pack, bench_ecocut);
criterion_main!(benches);
