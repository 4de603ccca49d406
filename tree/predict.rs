use crate::{BinaryClassifier, Node};
use itertools::izip;
use ndarray::prelude::*;

impl BinaryClassifier {
	/// Write the probability of the positive class for each row of `features` into `probabilities`.
	pub fn predict(&self, features: ArrayView2<f32>, mut probabilities: ArrayViewMut1<f32>) {
		for (row, probability) in izip!(features.genrows(), probabilities.iter_mut()) {
			let mut node_index = 0;
			loop {
				match &self.tree.nodes[node_index] {
					Node::Leaf(leaf) => {
						*probability = leaf.probability;
						break;
					}
					Node::Branch(branch) => {
						node_index = if row[branch.feature_index] <= branch.split_value {
							branch.left_child_index
						} else {
							branch.right_child_index
						};
					}
				}
			}
		}
	}
}

#[test]
fn test_predict_walks_to_the_correct_leaf() {
	use crate::{BranchNode, LeafNode, Tree};
	let model = BinaryClassifier {
		tree: Tree {
			nodes: vec![
				Node::Branch(BranchNode {
					left_child_index: 1,
					right_child_index: 2,
					feature_index: 1,
					split_value: 0.5,
				}),
				Node::Leaf(LeafNode { probability: 0.25 }),
				Node::Leaf(LeafNode { probability: 0.75 }),
			],
		},
	};
	let features = array![[9.0, 0.0], [9.0, 1.0], [9.0, 0.5]];
	let mut probabilities = Array1::zeros(3);
	model.predict(features.view(), probabilities.view_mut());
	assert_eq!(probabilities, array![0.25, 0.75, 0.25]);
}
