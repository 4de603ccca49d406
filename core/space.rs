/*!
This module defines the hyperparameter configuration for tree training along with the spaces the two searches draw candidate configurations from.
*/

use crate::config;
use cartune_tree::{InvalidTrainOptionsError, TrainOptions};
use itertools::iproduct;
use num_traits::ToPrimitive;
use rand::Rng;
use std::ops::Range;

/// One hyperparameter configuration for tree training.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainConfig {
	/// The maximum depth of the tree, or `None` to grow until the stopping rules apply.
	pub max_depth: Option<u64>,
	/// The minimum number of examples a node must have to be considered for splitting.
	pub min_examples_per_split: u64,
	/// The minimum number of examples either side of a split must receive.
	pub min_examples_per_leaf: u64,
}

impl Default for TrainConfig {
	fn default() -> TrainConfig {
		TrainConfig {
			max_depth: None,
			min_examples_per_split: 2,
			min_examples_per_leaf: 1,
		}
	}
}

impl TrainConfig {
	pub fn to_train_options(&self) -> TrainOptions {
		TrainOptions {
			max_depth: self.max_depth.map(|max_depth| max_depth.to_usize().unwrap()),
			min_examples_per_split: self.min_examples_per_split.to_usize().unwrap(),
			min_examples_per_leaf: self.min_examples_per_leaf.to_usize().unwrap(),
		}
	}
}

impl std::fmt::Display for TrainConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self.max_depth {
			Some(max_depth) => write!(f, "max_depth={}", max_depth)?,
			None => write!(f, "max_depth=none")?,
		};
		write!(
			f,
			", min_examples_per_split={}, min_examples_per_leaf={}",
			self.min_examples_per_split, self.min_examples_per_leaf
		)
	}
}

/// An error returned before a search starts when the declared space holds values the trainer would reject.
#[derive(Clone, Debug, PartialEq)]
pub enum InvalidSpaceError {
	EmptyRange { parameter: &'static str },
	EmptyGrid { parameter: &'static str },
	InvalidValue(InvalidTrainOptionsError),
}

impl std::fmt::Display for InvalidSpaceError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			InvalidSpaceError::EmptyRange { parameter } => {
				write!(f, "the range for {} is empty", parameter)
			}
			InvalidSpaceError::EmptyGrid { parameter } => {
				write!(f, "no values were declared for {}", parameter)
			}
			InvalidSpaceError::InvalidValue(_) => write!(f, "the space holds an invalid value"),
		}
	}
}

impl std::error::Error for InvalidSpaceError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			InvalidSpaceError::InvalidValue(error) => Some(error),
			_ => None,
		}
	}
}

impl From<InvalidTrainOptionsError> for InvalidSpaceError {
	fn from(error: InvalidTrainOptionsError) -> InvalidSpaceError {
		InvalidSpaceError::InvalidValue(error)
	}
}

/// The half open ranges randomized search samples configurations from.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomSpace {
	pub max_depth: Range<u64>,
	pub min_examples_per_split: Range<u64>,
	pub min_examples_per_leaf: Range<u64>,
}

impl Default for RandomSpace {
	fn default() -> RandomSpace {
		RandomSpace {
			max_depth: 1..20,
			min_examples_per_split: 2..20,
			min_examples_per_leaf: 1..20,
		}
	}
}

impl RandomSpace {
	pub fn from_config(config: &config::RandomSpaceConfig) -> RandomSpace {
		let default = RandomSpace::default();
		let range = |range: &Option<config::RangeConfig>, default: Range<u64>| {
			range
				.as_ref()
				.map(|range| range.min..range.max)
				.unwrap_or(default)
		};
		RandomSpace {
			max_depth: range(&config.max_depth, default.max_depth),
			min_examples_per_split: range(
				&config.min_examples_per_split,
				default.min_examples_per_split,
			),
			min_examples_per_leaf: range(
				&config.min_examples_per_leaf,
				default.min_examples_per_leaf,
			),
		}
	}

	pub fn validate(&self) -> Result<(), InvalidSpaceError> {
		if self.max_depth.is_empty() {
			return Err(InvalidSpaceError::EmptyRange {
				parameter: "max_depth",
			});
		}
		if self.min_examples_per_split.is_empty() {
			return Err(InvalidSpaceError::EmptyRange {
				parameter: "min_examples_per_split",
			});
		}
		if self.min_examples_per_leaf.is_empty() {
			return Err(InvalidSpaceError::EmptyRange {
				parameter: "min_examples_per_leaf",
			});
		}
		// the smallest value in each range is the strictest the trainer will see
		TrainOptions {
			max_depth: Some(self.max_depth.start.to_usize().unwrap()),
			min_examples_per_split: self.min_examples_per_split.start.to_usize().unwrap(),
			min_examples_per_leaf: self.min_examples_per_leaf.start.to_usize().unwrap(),
		}
		.validate()?;
		Ok(())
	}

	/// Draw one configuration uniformly from the space.
	pub fn sample(&self, rng: &mut impl Rng) -> TrainConfig {
		TrainConfig {
			max_depth: Some(rng.gen_range(self.max_depth.start, self.max_depth.end)),
			min_examples_per_split: rng.gen_range(
				self.min_examples_per_split.start,
				self.min_examples_per_split.end,
			),
			min_examples_per_leaf: rng.gen_range(
				self.min_examples_per_leaf.start,
				self.min_examples_per_leaf.end,
			),
		}
	}
}

/// The candidate values grid search exhaustively combines.
#[derive(Clone, Debug, PartialEq)]
pub struct GridSpace {
	pub max_depth: Vec<u64>,
	pub min_examples_per_split: Vec<u64>,
	pub min_examples_per_leaf: Vec<u64>,
}

impl Default for GridSpace {
	fn default() -> GridSpace {
		GridSpace {
			max_depth: vec![3, 5, 10, 15],
			min_examples_per_split: vec![2, 5, 10],
			min_examples_per_leaf: vec![1, 5, 10],
		}
	}
}

impl GridSpace {
	pub fn from_config(config: &config::GridSpaceConfig) -> GridSpace {
		let default = GridSpace::default();
		GridSpace {
			max_depth: config.max_depth.clone().unwrap_or(default.max_depth),
			min_examples_per_split: config
				.min_examples_per_split
				.clone()
				.unwrap_or(default.min_examples_per_split),
			min_examples_per_leaf: config
				.min_examples_per_leaf
				.clone()
				.unwrap_or(default.min_examples_per_leaf),
		}
	}

	pub fn validate(&self) -> Result<(), InvalidSpaceError> {
		if self.max_depth.is_empty() {
			return Err(InvalidSpaceError::EmptyGrid {
				parameter: "max_depth",
			});
		}
		if self.min_examples_per_split.is_empty() {
			return Err(InvalidSpaceError::EmptyGrid {
				parameter: "min_examples_per_split",
			});
		}
		if self.min_examples_per_leaf.is_empty() {
			return Err(InvalidSpaceError::EmptyGrid {
				parameter: "min_examples_per_leaf",
			});
		}
		for max_depth in self.max_depth.iter() {
			TrainOptions {
				max_depth: Some(max_depth.to_usize().unwrap()),
				..Default::default()
			}
			.validate()?;
		}
		for min_examples_per_split in self.min_examples_per_split.iter() {
			TrainOptions {
				min_examples_per_split: min_examples_per_split.to_usize().unwrap(),
				..Default::default()
			}
			.validate()?;
		}
		for min_examples_per_leaf in self.min_examples_per_leaf.iter() {
			TrainOptions {
				min_examples_per_leaf: min_examples_per_leaf.to_usize().unwrap(),
				..Default::default()
			}
			.validate()?;
		}
		Ok(())
	}

	/// The number of configurations in the grid.
	pub fn size(&self) -> usize {
		self.max_depth.len() * self.min_examples_per_split.len() * self.min_examples_per_leaf.len()
	}

	/// Every configuration in the grid, in declaration order with the last parameter varying fastest.
	pub fn configurations(&self) -> Vec<TrainConfig> {
		iproduct!(
			self.max_depth.iter(),
			self.min_examples_per_split.iter(),
			self.min_examples_per_leaf.iter()
		)
		.map(
			|(max_depth, min_examples_per_split, min_examples_per_leaf)| TrainConfig {
				max_depth: Some(*max_depth),
				min_examples_per_split: *min_examples_per_split,
				min_examples_per_leaf: *min_examples_per_leaf,
			},
		)
		.collect()
	}
}

#[test]
fn test_train_config_display() {
	let config = TrainConfig::default();
	assert_eq!(
		config.to_string(),
		"max_depth=none, min_examples_per_split=2, min_examples_per_leaf=1"
	);
	let config = TrainConfig {
		max_depth: Some(5),
		min_examples_per_split: 10,
		min_examples_per_leaf: 3,
	};
	assert_eq!(
		config.to_string(),
		"max_depth=5, min_examples_per_split=10, min_examples_per_leaf=3"
	);
}

#[test]
fn test_sample_is_seeded() {
	use rand::SeedableRng;
	use rand_xoshiro::Xoshiro256Plus;
	let space = RandomSpace::default();
	let sample = |seed: u64| {
		let mut rng = Xoshiro256Plus::seed_from_u64(seed);
		(0..20).map(|_| space.sample(&mut rng)).collect::<Vec<_>>()
	};
	assert_eq!(sample(42), sample(42));
	assert_ne!(sample(1), sample(2));
}

#[test]
fn test_sample_stays_in_range() {
	use rand::SeedableRng;
	use rand_xoshiro::Xoshiro256Plus;
	let space = RandomSpace {
		max_depth: 1..4,
		min_examples_per_split: 2..6,
		min_examples_per_leaf: 1..3,
	};
	let mut rng = Xoshiro256Plus::seed_from_u64(0);
	for _ in 0..100 {
		let config = space.sample(&mut rng);
		let max_depth = config.max_depth.unwrap();
		assert!((1..4).contains(&max_depth));
		assert!((2..6).contains(&config.min_examples_per_split));
		assert!((1..3).contains(&config.min_examples_per_leaf));
	}
}

#[test]
fn test_grid_configurations() {
	let space = GridSpace::default();
	let configurations = space.configurations();
	assert_eq!(space.size(), 36);
	assert_eq!(configurations.len(), 36);
	assert_eq!(
		configurations[0],
		TrainConfig {
			max_depth: Some(3),
			min_examples_per_split: 2,
			min_examples_per_leaf: 1,
		}
	);
	assert_eq!(
		configurations[1],
		TrainConfig {
			max_depth: Some(3),
			min_examples_per_split: 2,
			min_examples_per_leaf: 5,
		}
	);
	assert_eq!(
		configurations[3],
		TrainConfig {
			max_depth: Some(3),
			min_examples_per_split: 5,
			min_examples_per_leaf: 1,
		}
	);
	assert_eq!(
		configurations[35],
		TrainConfig {
			max_depth: Some(15),
			min_examples_per_split: 10,
			min_examples_per_leaf: 10,
		}
	);
}

#[test]
fn test_validate_spaces() {
	assert_eq!(RandomSpace::default().validate(), Ok(()));
	assert_eq!(GridSpace::default().validate(), Ok(()));
	let space = RandomSpace {
		max_depth: 5..5,
		..Default::default()
	};
	assert_eq!(
		space.validate(),
		Err(InvalidSpaceError::EmptyRange {
			parameter: "max_depth",
		})
	);
	let space = RandomSpace {
		min_examples_per_split: 1..20,
		..Default::default()
	};
	assert_eq!(
		space.validate(),
		Err(InvalidSpaceError::InvalidValue(InvalidTrainOptionsError {
			option: "min_examples_per_split",
			value: 1,
			minimum: 2,
		}))
	);
	let space = GridSpace {
		max_depth: vec![],
		..Default::default()
	};
	assert_eq!(
		space.validate(),
		Err(InvalidSpaceError::EmptyGrid {
			parameter: "max_depth",
		})
	);
	let space = GridSpace {
		min_examples_per_leaf: vec![1, 0],
		..Default::default()
	};
	assert_eq!(
		space.validate(),
		Err(InvalidSpaceError::InvalidValue(InvalidTrainOptionsError {
			option: "min_examples_per_leaf",
			value: 0,
			minimum: 1,
		}))
	);
}

#[test]
fn test_space_from_config() {
	let config: crate::config::Config = serde_yaml::from_str(
		r#"
random_space:
  max_depth:
    min: 2
    max: 8
grid_space:
  min_examples_per_split: [2, 4]
"#,
	)
	.unwrap();
	let random_space = RandomSpace::from_config(&config.random_space.unwrap());
	assert_eq!(random_space.max_depth, 2..8);
	assert_eq!(random_space.min_examples_per_split, 2..20);
	assert_eq!(random_space.min_examples_per_leaf, 1..20);
	let grid_space = GridSpace::from_config(&config.grid_space.unwrap());
	assert_eq!(grid_space.max_depth, vec![3, 5, 10, 15]);
	assert_eq!(grid_space.min_examples_per_split, vec![2, 4]);
	assert_eq!(grid_space.min_examples_per_leaf, vec![1, 5, 10]);
}
