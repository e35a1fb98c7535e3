//! Unweighted search over an adjacency list
//!

use std::collections::VecDeque;

/// Find the route with the fewest hops from `from` to `to`, as node indices
/// including both ends. `None` when `to` cannot be reached or either index
/// is out of range
pub fn breadth_first_path(edges: &[Vec<usize>], from: usize, to: usize) -> Option<Vec<usize>> {
	if from >= edges.len() || to >= edges.len() {
		return None;
	}
	if from == to {
		return Some(vec![from]);
	}
	let mut came_from: Vec<Option<usize>> = vec![None; edges.len()];
	let mut visited = vec![false; edges.len()];
	let mut queue = VecDeque::new();
	visited[from] = true;
	queue.push_back(from);
	while let Some(current) = queue.pop_front() {
		for next in edges[current].iter() {
			let next = *next;
			if next >= edges.len() || visited[next] {
				continue;
			}
			visited[next] = true;
			came_from[next] = Some(current);
			if next == to {
				let mut route = vec![to];
				let mut step = current;
				route.push(step);
				while let Some(previous) = came_from[step] {
					route.push(previous);
					step = previous;
				}
				route.reverse();
				return Some(route);
			}
			queue.push_back(next);
		}
	}
	None
}
