//! Measure finding a path corner to corner across a grid
//!
//! World is 100 units by 100 units sampled once per unit with a staggered
//! series of walls forcing the path to weave
//!

use bevy::prelude::*;
use bevy_navigator_plugin::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Sample the world into a grid before benchmarking
fn prepare_grid(length: f32) -> SpatialMap {
	let settings = GridSettings {
		center: Vec3::new(length / 2.0 - 0.5, 0.0, length / 2.0 - 0.5),
		region: Vec2::new(length, length),
		..default()
	};
	let mut world = BoxWorld::new(WorldBox::new(
		Vec3::new(-0.5, -1.0, -0.5),
		Vec3::new(length - 0.5, 0.0, length - 0.5),
	));
	// walls every 10 units leaving a gap at alternating ends
	for i in 1..(length as i32 / 10) {
		let x = i as f32 * 10.0;
		let (low, high) = if i % 2 == 0 {
			(-0.5, length - 5.5)
		} else {
			(4.5, length - 0.5)
		};
		world = world.with_obstacle(WorldBox::new(
			Vec3::new(x - 0.5, 0.0, low),
			Vec3::new(x + 0.5, 2.0, high),
		));
	}
	let mut grid = GridMap::build(&settings, &world, &TerrainTable::default());
	grid.blur(3);
	SpatialMap::Grid(grid)
}

/// Find a path from the bottom left to the top right
fn calc(map: &SpatialMap, length: f32) {
	let query = PathQuery::new(Vec3::ZERO, Vec3::new(length - 1.0, 0.0, length - 1.0))
		.smoothed(1.0, 3.0);
	let _ = map.find_path(&query);
}

pub fn criterion_benchmark(c: &mut Criterion) {
	let mut group = c.benchmark_group("algorithm_use");
	group.significance_level(0.05).sample_size(100);
	let map = prepare_grid(100.0);
	group.bench_function("calc_grid_path", |b| {
		b.iter(|| calc(black_box(&map), black_box(100.0)))
	});
	group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
