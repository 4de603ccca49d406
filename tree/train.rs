use crate::choose_best_split::choose_best_split;
use crate::{BinaryClassifier, BranchNode, LeafNode, Node, Tree, TrainOptions};
use ndarray::prelude::*;
use num_traits::ToPrimitive;

impl BinaryClassifier {
	/// Train a tree on `features` and 0/1 `labels`. Every feature value must be finite. The tree is fully determined by its inputs, so training twice with the same inputs produces the same model.
	pub fn train(features: ArrayView2<f32>, labels: &[usize], options: &TrainOptions) -> Self {
		assert_eq!(features.nrows(), labels.len());
		assert!(!labels.is_empty());
		debug_assert!(options.validate().is_ok());
		let example_indexes: Vec<usize> = (0..labels.len()).collect();
		let mut context = TrainContext {
			features,
			labels,
			options,
			nodes: Vec::new(),
		};
		train_node(&mut context, example_indexes, 0);
		BinaryClassifier {
			tree: Tree {
				nodes: context.nodes,
			},
		}
	}
}

struct TrainContext<'a, 'b> {
	features: ArrayView2<'a, f32>,
	labels: &'b [usize],
	options: &'b TrainOptions,
	nodes: Vec<Node>,
}

/// Grow the node holding `example_indexes` at `depth`, pushing it and all of its descendants onto `context.nodes`, and return its index.
fn train_node(context: &mut TrainContext, example_indexes: Vec<usize>, depth: usize) -> usize {
	let n_examples = example_indexes.len();
	let n_positive = example_indexes
		.iter()
		.filter(|example_index| context.labels[**example_index] == 1)
		.count();
	let probability = n_positive.to_f32().unwrap() / n_examples.to_f32().unwrap();
	let is_pure = n_positive == 0 || n_positive == n_examples;
	let reached_max_depth = context
		.options
		.max_depth
		.map(|max_depth| depth >= max_depth)
		.unwrap_or(false);
	let should_split =
		!is_pure && !reached_max_depth && n_examples >= context.options.min_examples_per_split;
	let best_split = if should_split {
		choose_best_split(
			context.features,
			context.labels,
			&example_indexes,
			context.options,
		)
	} else {
		None
	};
	match best_split {
		None => {
			let node_index = context.nodes.len();
			context.nodes.push(Node::Leaf(LeafNode { probability }));
			node_index
		}
		Some(best_split) => {
			let (left_indexes, right_indexes): (Vec<usize>, Vec<usize>) =
				example_indexes.into_iter().partition(|example_index| {
					context.features[[*example_index, best_split.feature_index]]
						<= best_split.split_value
				});
			let node_index = context.nodes.len();
			context.nodes.push(Node::Branch(BranchNode {
				left_child_index: 0,
				right_child_index: 0,
				feature_index: best_split.feature_index,
				split_value: best_split.split_value,
			}));
			let left_child_index = train_node(context, left_indexes, depth + 1);
			let right_child_index = train_node(context, right_indexes, depth + 1);
			match context.nodes.get_mut(node_index) {
				Some(Node::Branch(branch)) => {
					branch.left_child_index = left_child_index;
					branch.right_child_index = right_child_index;
				}
				_ => unreachable!(),
			}
			node_index
		}
	}
}

#[test]
fn test_train_pure_node() {
	let features = array![[1.0], [2.0], [3.0]];
	let labels = vec![1, 1, 1];
	let model = BinaryClassifier::train(features.view(), &labels, &TrainOptions::default());
	assert_eq!(model.tree.nodes.len(), 1);
	assert_eq!(
		model.tree.nodes[0],
		Node::Leaf(LeafNode { probability: 1.0 })
	);
}

#[test]
fn test_train_separable() {
	let features = array![[1.0], [2.0], [3.0], [4.0]];
	let labels = vec![0, 0, 1, 1];
	let model = BinaryClassifier::train(features.view(), &labels, &TrainOptions::default());
	assert_eq!(model.tree.depth(), 1);
	match &model.tree.nodes[0] {
		Node::Branch(branch) => {
			assert_eq!(branch.feature_index, 0);
			assert_eq!(branch.split_value, 2.5);
		}
		_ => panic!("expected the root to be a branch"),
	}
	let mut probabilities = Array1::zeros(4);
	model.predict(features.view(), probabilities.view_mut());
	assert_eq!(probabilities, array![0.0, 0.0, 1.0, 1.0]);
}

#[test]
fn test_max_depth_bounds_the_tree() {
	let features = array![[1.0], [2.0], [3.0], [4.0]];
	let labels = vec![1, 0, 0, 1];
	let unlimited = BinaryClassifier::train(features.view(), &labels, &TrainOptions::default());
	assert_eq!(unlimited.tree.depth(), 2);
	let options = TrainOptions {
		max_depth: Some(1),
		..Default::default()
	};
	let stump = BinaryClassifier::train(features.view(), &labels, &options);
	assert_eq!(stump.tree.depth(), 1);
}

#[test]
fn test_min_examples_per_split_stops_growth() {
	let features = array![[1.0], [2.0], [3.0], [4.0]];
	let labels = vec![1, 0, 0, 1];
	let options = TrainOptions {
		min_examples_per_split: 4,
		..Default::default()
	};
	let model = BinaryClassifier::train(features.view(), &labels, &options);
	// the root has exactly four examples and splits, but its children are below the threshold
	assert_eq!(model.tree.depth(), 1);
}

#[test]
fn test_ties_prefer_the_first_feature() {
	let features = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
	let labels = vec![0, 0, 1, 1];
	let model = BinaryClassifier::train(features.view(), &labels, &TrainOptions::default());
	match &model.tree.nodes[0] {
		Node::Branch(branch) => assert_eq!(branch.feature_index, 0),
		_ => panic!("expected the root to be a branch"),
	}
}

#[test]
fn test_train_is_deterministic() {
	let features = array![
		[5.1, 0.3],
		[1.2, 8.8],
		[4.4, 2.0],
		[0.5, 9.1],
		[6.0, 0.1],
		[1.0, 7.7],
		[5.5, 1.9],
		[0.2, 6.4],
	];
	let labels = vec![1, 0, 1, 0, 1, 0, 1, 0];
	let options = TrainOptions::default();
	let a = BinaryClassifier::train(features.view(), &labels, &options);
	let b = BinaryClassifier::train(features.view(), &labels, &options);
	assert_eq!(a, b);
}
