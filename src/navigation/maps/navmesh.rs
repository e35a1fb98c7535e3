//! Navigation mesh generation.
//!
//! The ground footprint is first clipped by obstacles that straddle its
//! boundary, then obstacles entirely on the ground are cut in as holes. Clipping
//! must come first, a hole bridged to an edge that is later clipped away
//! leaves a malformed ring. The resulting ring is triangulated and a waypoint
//! graph is threaded through the triangles:
//!
//! * every triangle joins its corners and edge midpoints in a perimeter cycle
//! * a large triangle adds a centroid linked to all corners and midpoints
//! * a small triangle links its midpoints to each other directly
//!
//! Nodes shared by neighbouring triangles are merged so the graph spans the
//! whole mesh
//!

use std::collections::HashMap;

use kdtree::{distance::squared_euclidean, KdTree};

use crate::prelude::*;
use bevy::prelude::*;

/// Triangulated walkable surface with its waypoint graph
#[derive(Clone, Debug)]
pub struct NavMesh {
	/// Walkable triangles lifted to the ground height
	triangles: Vec<Triangle>,
	/// Waypoint graph node positions
	nodes: Vec<Vec3>,
	/// Adjacency of each node
	edges: Vec<Vec<usize>>,
	/// Node positions indexing into `nodes`
	tree: KdTree<f32, usize, [f32; 3]>,
}

impl NavMesh {
	/// Create a new instance of [NavMesh] on the `ground` with every
	/// intersecting obstacle removed from it
	pub fn build(ground: &Footprint, obstacles: &[Footprint], settings: &NavMeshSettings) -> Self {
		let ring = NavMesh::walkable_ring(ground, obstacles, settings);
		let triangles: Vec<Triangle> = triangulate(&ring, Winding::CounterClockwise)
			.into_iter()
			.filter(|t| t.area() >= settings.min_triangle_area)
			.map(|t| t.with_height(ground.get_height()))
			.collect();
		NavMesh::from_triangles(triangles, settings.large_triangle_area)
	}
	/// Resolve the ground outline and obstacles into a single ring ready for
	/// triangulation
	pub fn walkable_ring(
		ground: &Footprint,
		obstacles: &[Footprint],
		settings: &NavMeshSettings,
	) -> Vec<Vec2> {
		let mut ring = merge_close_vertices(ground.get_outline(), settings.vertex_merge_distance);
		let Some(ground_bounds) = Bounds::from_points(&ring) else {
			return Vec::new();
		};
		let mut holes = Vec::new();
		for obstacle in obstacles.iter() {
			let Some(bounds) = obstacle.bounds() else {
				continue;
			};
			if !bounds.intersects(&ground_bounds) {
				continue;
			}
			let corners = bounds.expanded(settings.obstacle_padding).corners();
			if corners.iter().all(|c| point_in_polygon(&ring, *c)) {
				holes.push(corners.to_vec());
			} else {
				match subtract_polygon(&ring, &corners) {
					Some(clipped) => ring = clipped,
					None => {
						warn!("An obstacle covers the whole ground, the navmesh is empty");
						return Vec::new();
					}
				}
			}
		}
		cut_holes_in_shape(&ring, &holes)
	}
	/// Create a new instance of [NavMesh] by building the waypoint graph of
	/// existing triangles
	pub fn from_triangles(triangles: Vec<Triangle>, large_triangle_area: f32) -> Self {
		let mut graph = GraphBuilder::default();
		for triangle in triangles.iter() {
			let [v1, v2, v3] = triangle.world_positions();
			let [m1, m2, m3] = triangle.world_midpoints();
			let v = [v1, v2, v3].map(|p| graph.node(p));
			let m = [m1, m2, m3].map(|p| graph.node(p));
			// perimeter v1 -> m1 -> v2 -> m2 -> v3 -> m3 -> v1
			graph.link(m[0], v[0]);
			graph.link(v[0], m[2]);
			graph.link(m[2], v[2]);
			graph.link(v[2], m[1]);
			graph.link(m[1], v[1]);
			graph.link(v[1], m[0]);
			if triangle.area() > large_triangle_area {
				let centroid = graph.node(triangle.world_centroid());
				for n in m.iter().chain(v.iter()) {
					graph.link(centroid, *n);
				}
			} else {
				graph.link(m[0], m[1]);
				graph.link(m[1], m[2]);
				graph.link(m[2], m[0]);
			}
		}
		let mut tree = KdTree::with_capacity(3, graph.nodes.len().max(1));
		for (i, p) in graph.nodes.iter().enumerate() {
			if let Err(e) = tree.add(p.to_array(), i) {
				warn!("Navmesh node {} left out of the index: {:?}", i, e);
			}
		}
		NavMesh {
			triangles,
			nodes: graph.nodes,
			edges: graph.edges,
			tree,
		}
	}
	/// Get the walkable triangles
	pub fn get_triangles(&self) -> &[Triangle] {
		&self.triangles
	}
	/// Get the waypoint graph node positions
	pub fn get_nodes(&self) -> &[Vec3] {
		&self.nodes
	}
	/// Get the adjacency of every node
	pub fn get_edges(&self) -> &[Vec<usize>] {
		&self.edges
	}
	/// Index of the graph node closest to a world position
	pub fn nearest_node(&self, position: Vec3) -> Option<usize> {
		self.tree
			.nearest(&position.to_array(), 1, &squared_euclidean)
			.ok()?
			.first()
			.map(|(_, i)| **i)
	}
	/// Find waypoints between two world positions. The nearest nodes are
	/// joined with the fewest hops and the ends are replaced by the exact
	/// positions asked for
	pub fn find_path(&self, start: Vec3, end: Vec3) -> Option<Vec<Vec3>> {
		let from = self.nearest_node(start)?;
		let to = self.nearest_node(end)?;
		let hops = breadth_first_path(&self.edges, from, to)?;
		let mut waypoints: Vec<Vec3> = hops.into_iter().map(|i| self.nodes[i]).collect();
		if waypoints.len() < 2 {
			return Some(vec![start, end]);
		}
		if let Some(first) = waypoints.first_mut() {
			*first = start;
		}
		if let Some(last) = waypoints.last_mut() {
			*last = end;
		}
		Some(waypoints)
	}
}

/// Accumulates a de-duplicated undirected graph
#[derive(Default)]
struct GraphBuilder {
	/// Node positions
	nodes: Vec<Vec3>,
	/// Adjacency lists
	edges: Vec<Vec<usize>>,
	/// Bit pattern of a position to its node
	lookup: HashMap<[u32; 3], usize>,
}

impl GraphBuilder {
	/// Index of the node at a position, creating it when new
	fn node(&mut self, position: Vec3) -> usize {
		let key = position.to_array().map(f32::to_bits);
		if let Some(i) = self.lookup.get(&key) {
			return *i;
		}
		let i = self.nodes.len();
		self.nodes.push(position);
		self.edges.push(Vec::new());
		self.lookup.insert(key, i);
		i
	}
	/// Join two nodes both ways
	fn link(&mut self, a: usize, b: usize) {
		if a == b {
			return;
		}
		if !self.edges[a].contains(&b) {
			self.edges[a].push(b);
		}
		if !self.edges[b].contains(&a) {
			self.edges[b].push(a);
		}
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	/// 20x20 ground at height 1
	fn ground() -> Footprint {
		Footprint::new(
			vec![
				Vec2::new(0.0, 0.0),
				Vec2::new(20.0, 0.0),
				Vec2::new(20.0, 20.0),
				Vec2::new(0.0, 20.0),
			],
			1.0,
		)
	}
	/// A square footprint
	fn block(min: Vec2, max: Vec2) -> Footprint {
		Footprint::new(Bounds::new(min, max).corners().to_vec(), 2.0)
	}
	#[test]
	fn open_ground() {
		let mesh = NavMesh::build(&ground(), &[], &NavMeshSettings::default());
		assert_eq!(2, mesh.get_triangles().len());
		// 4 corners + 5 midpoints (the diagonal is shared) + 2 centroids
		assert_eq!(11, mesh.get_nodes().len());
		assert!(mesh.get_triangles().iter().all(|t| t.get_a().get_world().y == 1.0));
	}
	#[test]
	fn small_triangles_link_midpoints() {
		let t = Triangle::new(
			Vertex::new(Vec2::new(0.0, 0.0), 0),
			Vertex::new(Vec2::new(1.0, 0.0), 1),
			Vertex::new(Vec2::new(0.0, 1.0), 2),
		);
		let mesh = NavMesh::from_triangles(vec![t], 10.0);
		assert_eq!(6, mesh.get_nodes().len());
		// every midpoint touches two corners and two midpoints
		let m = mesh.nearest_node(Vec3::new(0.5, 0.0, 0.0)).unwrap();
		assert_eq!(4, mesh.get_edges()[m].len());
	}
	#[test]
	fn interior_obstacle_becomes_hole() {
		let obstacle = block(Vec2::new(8.0, 8.0), Vec2::new(12.0, 12.0));
		let mesh = NavMesh::build(&ground(), &[obstacle], &NavMeshSettings::default());
		let area: f32 = mesh.get_triangles().iter().map(|t| t.area()).sum();
		// padded by 1 on every side
		assert!((area - (400.0 - 36.0)).abs() < 1e-2);
		for t in mesh.get_triangles() {
			let c = t.centroid();
			assert!(!(c.x > 7.0 && c.x < 13.0 && c.y > 7.0 && c.y < 13.0));
		}
	}
	#[test]
	fn straddling_obstacle_clips_edge() {
		let obstacle = block(Vec2::new(17.0, 8.0), Vec2::new(25.0, 12.0));
		let ring = NavMesh::walkable_ring(&ground(), &[obstacle], &NavMeshSettings::default());
		assert_eq!(8, ring.len());
		assert!(!point_in_polygon(&ring, Vec2::new(18.0, 10.0)));
		let mesh = NavMesh::build(
			&ground(),
			&[block(Vec2::new(17.0, 8.0), Vec2::new(25.0, 12.0))],
			&NavMeshSettings::default(),
		);
		let area: f32 = mesh.get_triangles().iter().map(|t| t.area()).sum();
		// notch of 4 by 6 once padded
		assert!((area - (400.0 - 24.0)).abs() < 1e-2);
	}
	#[test]
	fn distant_obstacle_ignored() {
		let obstacle = block(Vec2::new(30.0, 30.0), Vec2::new(32.0, 32.0));
		let mesh = NavMesh::build(&ground(), &[obstacle], &NavMeshSettings::default());
		assert_eq!(2, mesh.get_triangles().len());
	}
	#[test]
	fn path_keeps_exact_ends() {
		let obstacle = block(Vec2::new(8.0, 8.0), Vec2::new(12.0, 12.0));
		let mesh = NavMesh::build(&ground(), &[obstacle], &NavMeshSettings::default());
		let start = Vec3::new(1.3, 1.0, 10.2);
		let end = Vec3::new(18.7, 1.0, 9.9);
		let path = mesh.find_path(start, end).unwrap();
		assert!(path.len() >= 2);
		assert_eq!(start, path[0]);
		assert_eq!(end, *path.last().unwrap());
		// nothing between the ends crosses the hole
		for p in path.iter() {
			assert!(!(p.x > 7.0 && p.x < 13.0 && p.z > 7.0 && p.z < 13.0));
		}
	}
	#[test]
	fn same_node_path() {
		let mesh = NavMesh::build(&ground(), &[], &NavMeshSettings::default());
		let start = Vec3::new(0.1, 1.0, 0.1);
		let end = Vec3::new(0.2, 1.0, 0.2);
		assert_eq!(Some(vec![start, end]), mesh.find_path(start, end));
	}
}
