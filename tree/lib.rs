/*!
This crate implements a single CART decision tree for binary classification. Training grows the tree depth first, choosing at each node the feature and threshold whose split yields the largest reduction in Gini impurity, and prediction walks each example from the root to a leaf, which holds the probability of the positive class.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod choose_best_split;
mod predict;
mod train;

/// These are the options passed to [`BinaryClassifier::train`](struct.BinaryClassifier.html#method.train).
#[derive(Clone, Debug, PartialEq)]
pub struct TrainOptions {
	/// The depth of the tree will never exceed this value. `None` means the depth is unbounded.
	pub max_depth: Option<usize>,
	/// A node will only be considered for splitting if it holds at least this many training examples.
	pub min_examples_per_split: usize,
	/// A split is only valid if each of the resulting children holds at least this many training examples.
	pub min_examples_per_leaf: usize,
}

impl Default for TrainOptions {
	fn default() -> Self {
		Self {
			max_depth: None,
			min_examples_per_split: 2,
			min_examples_per_leaf: 1,
		}
	}
}

impl TrainOptions {
	/// Check every option against the values training accepts: `max_depth` must be at least 1 when set, `min_examples_per_split` at least 2, and `min_examples_per_leaf` at least 1.
	pub fn validate(&self) -> Result<(), InvalidTrainOptionsError> {
		if let Some(max_depth) = self.max_depth {
			if max_depth < 1 {
				return Err(InvalidTrainOptionsError {
					option: "max_depth",
					value: max_depth,
					minimum: 1,
				});
			}
		}
		if self.min_examples_per_split < 2 {
			return Err(InvalidTrainOptionsError {
				option: "min_examples_per_split",
				value: self.min_examples_per_split,
				minimum: 2,
			});
		}
		if self.min_examples_per_leaf < 1 {
			return Err(InvalidTrainOptionsError {
				option: "min_examples_per_leaf",
				value: self.min_examples_per_leaf,
				minimum: 1,
			});
		}
		Ok(())
	}
}

/// The error returned when [`TrainOptions::validate`](struct.TrainOptions.html#method.validate) rejects an option value.
#[derive(Clone, Debug, PartialEq)]
pub struct InvalidTrainOptionsError {
	pub option: &'static str,
	pub value: usize,
	pub minimum: usize,
}

impl std::fmt::Display for InvalidTrainOptionsError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(
			f,
			"{} must be at least {}, got {}",
			self.option, self.minimum, self.value
		)
	}
}

impl std::error::Error for InvalidTrainOptionsError {}

/// A trained binary classifier. Call [`predict`](#method.predict) to fill a probability of the positive class for each input example.
#[derive(Clone, Debug, PartialEq)]
pub struct BinaryClassifier {
	pub tree: Tree,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tree {
	pub nodes: Vec<Node>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
	Branch(BranchNode),
	Leaf(LeafNode),
}

/// Examples whose value for `feature_index` is less than or equal to `split_value` continue to the left child, all others to the right child.
#[derive(Clone, Debug, PartialEq)]
pub struct BranchNode {
	pub left_child_index: usize,
	pub right_child_index: usize,
	pub feature_index: usize,
	pub split_value: f32,
}

/// The fraction of training examples at this leaf whose label is the positive class.
#[derive(Clone, Debug, PartialEq)]
pub struct LeafNode {
	pub probability: f32,
}

impl Tree {
	/// The number of branches on the longest path from the root to a leaf.
	pub fn depth(&self) -> usize {
		self.node_depth(0)
	}

	fn node_depth(&self, node_index: usize) -> usize {
		match &self.nodes[node_index] {
			Node::Leaf(_) => 0,
			Node::Branch(branch) => {
				1 + usize::max(
					self.node_depth(branch.left_child_index),
					self.node_depth(branch.right_child_index),
				)
			}
		}
	}
}

#[test]
fn test_validate() {
	assert!(TrainOptions::default().validate().is_ok());
	let options = TrainOptions {
		max_depth: Some(0),
		..Default::default()
	};
	let error = options.validate().unwrap_err();
	assert_eq!(error.option, "max_depth");
	assert_eq!(error.to_string(), "max_depth must be at least 1, got 0");
	let options = TrainOptions {
		min_examples_per_split: 1,
		..Default::default()
	};
	assert_eq!(
		options.validate().unwrap_err().option,
		"min_examples_per_split"
	);
	let options = TrainOptions {
		min_examples_per_leaf: 0,
		..Default::default()
	};
	assert_eq!(
		options.validate().unwrap_err().option,
		"min_examples_per_leaf"
	);
}
