//! Measure cutting holes into a shape and triangulating the result
//!
//! Shape is a 200 by 200 square with a row of 5 by 5 holes every 20 units
//!

use bevy::prelude::*;
use bevy_navigator_plugin::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// The outer shape and its holes
fn prepare_shape() -> (Vec<Vec2>, Vec<Vec<Vec2>>) {
	let shape = Bounds::new(Vec2::ZERO, Vec2::splat(200.0)).corners().to_vec();
	let holes = (0..9)
		.map(|i| {
			let min = Vec2::new(10.0 + i as f32 * 20.0, 90.0 + (i % 3) as f32);
			Bounds::new(min, min + Vec2::splat(5.0)).corners().to_vec()
		})
		.collect();
	(shape, holes)
}

/// Cut the holes and triangulate
fn calc(shape: &[Vec2], holes: &[Vec<Vec2>]) {
	let ring = cut_holes_in_shape(shape, holes);
	let _ = triangulate(&ring, Winding::CounterClockwise);
}

pub fn criterion_benchmark(c: &mut Criterion) {
	let mut group = c.benchmark_group("algorithm_use");
	group.significance_level(0.05).sample_size(100);
	let (shape, holes) = prepare_shape();
	group.bench_function("triangulate_with_holes", |b| {
		b.iter(|| calc(black_box(&shape), black_box(&holes)))
	});
	group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
