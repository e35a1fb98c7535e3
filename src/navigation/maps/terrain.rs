//! Lookup of movement penalties from the collision layers of the surface a
//! sample lands on
//!

use crate::prelude::*;
use bevy::prelude::*;

/// A kind of ground with its movement penalty. `mask` is matched against the
/// collision layers of a probed surface
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq, Reflect)]
pub struct TerrainType {
	/// Label of the terrain
	name: String,
	/// Collision layer bits identifying the terrain
	mask: u32,
	/// Cost added to moving onto the terrain
	penalty: i32,
}

impl TerrainType {
	/// Create a new instance of [TerrainType]
	pub fn new(name: &str, mask: u32, penalty: i32) -> Self {
		TerrainType {
			name: name.to_string(),
			mask,
			penalty,
		}
	}
	/// Get the label
	pub fn get_name(&self) -> &str {
		&self.name
	}
	/// Get the collision layer bits
	pub fn get_mask(&self) -> u32 {
		self.mask
	}
	/// Get the movement penalty
	pub fn get_penalty(&self) -> i32 {
		self.penalty
	}
	/// Whether a surface on `layers` is this terrain
	pub fn matches(&self, layers: u32) -> bool {
		self.mask & layers != 0
	}
}

/// Ordered list of [TerrainType], the first match wins
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Reflect)]
pub struct TerrainTable(Vec<TerrainType>);

impl Default for TerrainTable {
	/// Grass, path and sand on collision layers 6, 7 and 8
	fn default() -> Self {
		TerrainTable(vec![
			TerrainType::new("grass", 1 << 5, 8),
			TerrainType::new("path", 1 << 6, 3),
			TerrainType::new("sand", 1 << 7, 20),
		])
	}
}

impl TerrainTable {
	/// Create a new instance of [TerrainTable]
	pub fn new(terrains: Vec<TerrainType>) -> Self {
		TerrainTable(terrains)
	}
	/// Create a [TerrainTable] that never matches
	pub fn empty() -> Self {
		TerrainTable(Vec::new())
	}
	/// Get the terrains in match order
	pub fn get(&self) -> &[TerrainType] {
		&self.0
	}
	/// Penalty of the first terrain matching `layers`
	pub fn penalty_for(&self, layers: u32) -> Option<i32> {
		self.0
			.iter()
			.find(|t| t.matches(layers))
			.map(|t| t.get_penalty())
	}
	/// Load a [TerrainTable] from a header-less `.csv` file where each row is
	/// `name,mask,penalty`
	#[cfg(feature = "csv")]
	pub fn from_csv(path: impl AsRef<std::path::Path>) -> Result<Self, NavError> {
		let mut reader = csv::ReaderBuilder::new()
			.has_headers(false)
			.trim(csv::Trim::All)
			.from_path(path)?;
		let mut terrains = Vec::new();
		for record in reader.deserialize() {
			let terrain: TerrainType = record?;
			terrains.push(terrain);
		}
		Ok(TerrainTable(terrains))
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn first_match_wins() {
		let table = TerrainTable::new(vec![
			TerrainType::new("mud", 0b011, 12),
			TerrainType::new("rock", 0b010, 1),
		]);
		assert_eq!(Some(12), table.penalty_for(0b010));
		assert_eq!(Some(12), table.penalty_for(0b001));
		assert_eq!(None, table.penalty_for(0b100));
	}
	#[test]
	fn default_table() {
		let table = TerrainTable::default();
		assert_eq!(Some(8), table.penalty_for(1 << 5));
		assert_eq!(Some(3), table.penalty_for(1 << 6));
		assert_eq!(Some(20), table.penalty_for(1 << 7));
		assert_eq!(None, table.penalty_for(1));
	}
	#[cfg(feature = "csv")]
	#[test]
	fn table_from_csv() {
		let path = env!("CARGO_MANIFEST_DIR").to_string() + "/assets/terrain.csv";
		let table = TerrainTable::from_csv(path).unwrap();
		assert_eq!(TerrainTable::default(), table);
	}
}
