use crate::TrainOptions;
use ndarray::prelude::*;
use num_traits::ToPrimitive;
use rayon::prelude::*;

/// The best split found for a node. Examples whose value for `feature_index` is at most `split_value` go left. `gain` is the reduction in weighted Gini impurity relative to the unsplit node.
#[derive(Clone, Debug, PartialEq)]
pub struct BestSplit {
	pub feature_index: usize,
	pub split_value: f32,
	pub gain: f64,
}

/// Find the split of the examples at a node with the largest positive Gini gain, or `None` when no feature admits a split that keeps at least `min_examples_per_leaf` examples on each side. Equal gains are resolved in favor of the lowest feature index, then the lowest threshold.
pub fn choose_best_split(
	features: ArrayView2<f32>,
	labels: &[usize],
	example_indexes: &[usize],
	options: &TrainOptions,
) -> Option<BestSplit> {
	let n_examples = example_indexes.len();
	let n_positive = example_indexes
		.iter()
		.filter(|example_index| labels[**example_index] == 1)
		.count();
	let parent_gini = gini(n_positive, n_examples);
	if parent_gini == 0.0 {
		return None;
	}
	let candidates: Vec<Option<BestSplit>> = features
		.axis_iter(Axis(1))
		.into_par_iter()
		.enumerate()
		.map(|(feature_index, values)| {
			choose_best_split_for_feature(
				values,
				labels,
				example_indexes,
				feature_index,
				parent_gini,
				n_positive,
				options,
			)
		})
		.collect();
	// reduce in feature order so equal gains keep the lowest feature index
	let mut best: Option<BestSplit> = None;
	for candidate in candidates.into_iter().flatten() {
		let better = match &best {
			None => true,
			Some(best) => candidate.gain > best.gain,
		};
		if better {
			best = Some(candidate);
		}
	}
	best
}

fn choose_best_split_for_feature(
	values: ArrayView1<f32>,
	labels: &[usize],
	example_indexes: &[usize],
	feature_index: usize,
	parent_gini: f64,
	n_positive: usize,
	options: &TrainOptions,
) -> Option<BestSplit> {
	let n_examples = example_indexes.len();
	let mut sorted: Vec<(f32, usize)> = example_indexes
		.iter()
		.map(|example_index| (values[*example_index], labels[*example_index]))
		.collect();
	sorted.sort_unstable_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
	let mut best: Option<BestSplit> = None;
	let mut n_positive_left = 0;
	for split_index in 1..n_examples {
		if sorted[split_index - 1].1 == 1 {
			n_positive_left += 1;
		}
		let value_left = sorted[split_index - 1].0;
		let value_right = sorted[split_index].0;
		// a threshold only exists between two distinct neighboring values
		if value_left == value_right {
			continue;
		}
		let n_left = split_index;
		let n_right = n_examples - split_index;
		if n_left < options.min_examples_per_leaf || n_right < options.min_examples_per_leaf {
			continue;
		}
		let gini_left = gini(n_positive_left, n_left);
		let gini_right = gini(n_positive - n_positive_left, n_right);
		let n_left_fraction = n_left.to_f64().unwrap() / n_examples.to_f64().unwrap();
		let weighted_gini = n_left_fraction * gini_left + (1.0 - n_left_fraction) * gini_right;
		let gain = parent_gini - weighted_gini;
		if gain <= 0.0 {
			continue;
		}
		let better = match &best {
			None => true,
			Some(best) => gain > best.gain,
		};
		if better {
			// place the threshold halfway between the neighboring values, falling back to the left value when the midpoint rounds up to the right one
			let mut split_value = value_left / 2.0 + value_right / 2.0;
			if split_value == value_right {
				split_value = value_left;
			}
			best = Some(BestSplit {
				feature_index,
				split_value,
				gain,
			});
		}
	}
	best
}

fn gini(n_positive: usize, n_examples: usize) -> f64 {
	if n_examples == 0 {
		return 0.0;
	}
	let p = n_positive.to_f64().unwrap() / n_examples.to_f64().unwrap();
	1.0 - p * p - (1.0 - p) * (1.0 - p)
}

#[test]
fn test_choose_best_split_separable() {
	let features = array![[1.0], [2.0], [3.0], [4.0]];
	let labels = vec![0, 0, 1, 1];
	let best = choose_best_split(
		features.view(),
		&labels,
		&[0, 1, 2, 3],
		&TrainOptions::default(),
	)
	.unwrap();
	assert_eq!(best.feature_index, 0);
	assert_eq!(best.split_value, 2.5);
	assert!((best.gain - 0.5).abs() < 1e-9);
}

#[test]
fn test_equal_gains_keep_the_lowest_threshold() {
	let features = array![[1.0], [2.0], [3.0], [4.0]];
	let labels = vec![1, 0, 0, 1];
	let best = choose_best_split(
		features.view(),
		&labels,
		&[0, 1, 2, 3],
		&TrainOptions::default(),
	)
	.unwrap();
	assert_eq!(best.split_value, 1.5);
	assert!((best.gain - 1.0 / 6.0).abs() < 1e-9);
}

#[test]
fn test_no_split_for_constant_feature() {
	let features = array![[7.0], [7.0], [7.0], [7.0]];
	let labels = vec![0, 1, 0, 1];
	let best = choose_best_split(
		features.view(),
		&labels,
		&[0, 1, 2, 3],
		&TrainOptions::default(),
	);
	assert_eq!(best, None);
}

#[test]
fn test_no_split_for_pure_node() {
	let features = array![[1.0], [2.0], [3.0]];
	let labels = vec![1, 1, 1];
	let best = choose_best_split(features.view(), &labels, &[0, 1, 2], &TrainOptions::default());
	assert_eq!(best, None);
}

#[test]
fn test_min_examples_per_leaf_blocks_splits() {
	let features = array![[1.0], [2.0], [3.0]];
	let labels = vec![0, 0, 1];
	let options = TrainOptions {
		min_examples_per_leaf: 2,
		..Default::default()
	};
	let best = choose_best_split(features.view(), &labels, &[0, 1, 2], &options);
	assert_eq!(best, None);
}

#[test]
fn test_midpoint_falls_back_to_the_left_value() {
	let value_left = 1.0 + f32::EPSILON;
	let value_right = 1.0 + 2.0 * f32::EPSILON;
	let features = array![[value_left], [value_right]];
	let labels = vec![0, 1];
	let options = TrainOptions {
		min_examples_per_split: 2,
		..Default::default()
	};
	let best = choose_best_split(features.view(), &labels, &[0, 1], &options).unwrap();
	assert_eq!(best.split_value, value_left);
}
