/*!
This module defines the `Config` struct, which is deserialized from the yaml file passed on the command line and overrides the defaults used by [`run`](../fn.run.html). Every field is optional.
*/

use std::collections::BTreeMap;

#[derive(Debug, Default, serde::Deserialize)]
pub struct Config {
	pub column_types: Option<BTreeMap<String, ColumnType>>,
	pub test_fraction: Option<f32>,
	pub shuffle: Option<Shuffle>,
	pub folds: Option<usize>,
	pub trials: Option<usize>,
	pub seed: Option<u64>,
	pub random_space: Option<RandomSpaceConfig>,
	pub grid_space: Option<GridSpaceConfig>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ColumnType {
	#[serde(rename = "unknown")]
	Unknown,
	#[serde(rename = "number")]
	Number,
	#[serde(rename = "enum")]
	Enum { options: Vec<String> },
}

#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
pub enum Shuffle {
	Enabled(bool),
	Options { seed: u64 },
}

#[derive(Debug, serde::Deserialize)]
pub struct RandomSpaceConfig {
	pub max_depth: Option<RangeConfig>,
	pub min_examples_per_split: Option<RangeConfig>,
	pub min_examples_per_leaf: Option<RangeConfig>,
}

/// A half open integer range. `min` is admissible, `max` is not.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct RangeConfig {
	pub min: u64,
	pub max: u64,
}

#[derive(Debug, serde::Deserialize)]
pub struct GridSpaceConfig {
	pub max_depth: Option<Vec<u64>>,
	pub min_examples_per_split: Option<Vec<u64>>,
	pub min_examples_per_leaf: Option<Vec<u64>>,
}

#[test]
fn test_config() {
	let config = r#"
test_fraction: 0.25
folds: 10
trials: 25
seed: 7
column_types:
  id:
    type: unknown
  diagnosis:
    type: enum
    options: ["B", "M"]
  radius_mean:
    type: number
"#;
	let config: Config = serde_yaml::from_str(config).unwrap();
	assert_eq!(config.test_fraction, Some(0.25));
	assert_eq!(config.folds, Some(10));
	assert_eq!(config.trials, Some(25));
	assert_eq!(config.seed, Some(7));
	let column_types = config.column_types.unwrap();
	assert!(matches!(column_types.get("id"), Some(ColumnType::Unknown)));
	assert!(matches!(
		column_types.get("radius_mean"),
		Some(ColumnType::Number)
	));
	match column_types.get("diagnosis") {
		Some(ColumnType::Enum { options }) => assert_eq!(options, &vec!["B", "M"]),
		_ => panic!(),
	}
}

#[test]
fn test_config_shuffle() {
	let config: Config = serde_yaml::from_str("shuffle: false").unwrap();
	assert!(matches!(config.shuffle, Some(Shuffle::Enabled(false))));
	let config: Config = serde_yaml::from_str("shuffle: true").unwrap();
	assert!(matches!(config.shuffle, Some(Shuffle::Enabled(true))));
	let config: Config = serde_yaml::from_str("shuffle:\n  seed: 123").unwrap();
	assert!(matches!(config.shuffle, Some(Shuffle::Options { seed: 123 })));
	let config: Config = serde_yaml::from_str("test_fraction: 0.1").unwrap();
	assert!(config.shuffle.is_none());
}

#[test]
fn test_config_spaces() {
	let config = r#"
random_space:
  max_depth:
    min: 1
    max: 30
  min_examples_per_leaf:
    min: 1
    max: 5
grid_space:
  max_depth: [2, 4, 8]
  min_examples_per_split: [2]
"#;
	let config: Config = serde_yaml::from_str(config).unwrap();
	let random_space = config.random_space.unwrap();
	let max_depth = random_space.max_depth.unwrap();
	assert_eq!(max_depth.min, 1);
	assert_eq!(max_depth.max, 30);
	assert!(random_space.min_examples_per_split.is_none());
	let grid_space = config.grid_space.unwrap();
	assert_eq!(grid_space.max_depth, Some(vec![2, 4, 8]));
	assert_eq!(grid_space.min_examples_per_split, Some(vec![2]));
	assert!(grid_space.min_examples_per_leaf.is_none());
}
