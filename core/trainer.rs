/*!
This module defines the `Trainer` trait, which is how the searches see model fitting, and the `TreeTrainer` that the pipeline plugs into them.
*/

use crate::space::TrainConfig;
use anyhow::Result;
use cartune_metrics::{Accuracy, StreamingMetric};
use itertools::izip;
use ndarray::prelude::*;

/// Model fitting as the searches see it. Implementations must be deterministic so that repeated runs produce the same comparison.
pub trait Trainer: Sync {
	type Model: Send;
	/// Train a model on `features` and `labels` with the given configuration.
	fn train(
		&self,
		features: ArrayView2<f32>,
		labels: &[usize],
		config: &TrainConfig,
	) -> Result<Self::Model>;
	/// The fraction of `labels` the model predicts correctly.
	fn test(&self, model: &Self::Model, features: ArrayView2<f32>, labels: &[usize]) -> f32;
}

/// Trains decision tree classifiers with [`cartune_tree`](../../cartune_tree/index.html).
pub struct TreeTrainer;

impl Trainer for TreeTrainer {
	type Model = cartune_tree::BinaryClassifier;

	fn train(
		&self,
		features: ArrayView2<f32>,
		labels: &[usize],
		config: &TrainConfig,
	) -> Result<Self::Model> {
		let options = config.to_train_options();
		options.validate()?;
		Ok(cartune_tree::BinaryClassifier::train(
			features, labels, &options,
		))
	}

	fn test(&self, model: &Self::Model, features: ArrayView2<f32>, labels: &[usize]) -> f32 {
		let mut probabilities = Array1::zeros(labels.len());
		model.predict(features, probabilities.view_mut());
		let mut accuracy = Accuracy::new();
		for (probability, label) in izip!(probabilities.iter(), labels.iter()) {
			let prediction = if *probability > 0.5 { 1 } else { 0 };
			accuracy.update((prediction, *label));
		}
		accuracy.finalize().unwrap()
	}
}

#[test]
fn test_tree_trainer() {
	let features = arr2(&[[0.0], [1.0], [2.0], [3.0]]);
	let labels = vec![0, 0, 1, 1];
	let trainer = TreeTrainer;
	let model = trainer
		.train(features.view(), &labels, &TrainConfig::default())
		.unwrap();
	let accuracy = trainer.test(&model, features.view(), &labels);
	assert_eq!(accuracy, 1.0);
}

#[test]
fn test_tree_trainer_rejects_invalid_config() {
	let features = arr2(&[[0.0], [1.0]]);
	let labels = vec![0, 1];
	let config = TrainConfig {
		max_depth: Some(0),
		..Default::default()
	};
	let result = TreeTrainer.train(features.view(), &labels, &config);
	assert!(result.is_err());
}
