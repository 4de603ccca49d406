/*!
Test doubles for the in crate tests. They implement [`Trainer`](../trainer/trait.Trainer.html) without fitting anything so the tests can drive the searches and observe exactly what they do.
*/

use crate::space::TrainConfig;
use crate::trainer::Trainer;
use anyhow::Result;
use ndarray::prelude::*;
use num_traits::ToPrimitive;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A trainer whose accuracy depends only on the configuration, so tests control which candidate wins.
pub struct FakeTrainer {
	pub train_calls: AtomicUsize,
	pub score: fn(&TrainConfig) -> f32,
}

impl FakeTrainer {
	pub fn new(score: fn(&TrainConfig) -> f32) -> FakeTrainer {
		FakeTrainer {
			train_calls: AtomicUsize::new(0),
			score,
		}
	}
}

pub struct FakeModel {
	pub config: TrainConfig,
	pub n_train_examples: usize,
}

impl Trainer for FakeTrainer {
	type Model = FakeModel;

	fn train(
		&self,
		_features: ArrayView2<f32>,
		labels: &[usize],
		config: &TrainConfig,
	) -> Result<FakeModel> {
		self.train_calls.fetch_add(1, Ordering::Relaxed);
		config.to_train_options().validate()?;
		Ok(FakeModel {
			config: config.clone(),
			n_train_examples: labels.len(),
		})
	}

	fn test(&self, model: &FakeModel, _features: ArrayView2<f32>, _labels: &[usize]) -> f32 {
		(self.score)(&model.config)
	}
}

/// A trainer that records the labels each fold trains on and scores each fold as its fraction of positive labels.
pub struct FoldRecordingTrainer {
	pub folds: Mutex<Vec<(usize, usize)>>,
}

impl FoldRecordingTrainer {
	pub fn new() -> FoldRecordingTrainer {
		FoldRecordingTrainer {
			folds: Mutex::new(Vec::new()),
		}
	}
}

impl Trainer for FoldRecordingTrainer {
	type Model = ();

	fn train(
		&self,
		_features: ArrayView2<f32>,
		labels: &[usize],
		_config: &TrainConfig,
	) -> Result<()> {
		let n_positive = labels.iter().filter(|label| **label == 1).count();
		self.folds.lock().unwrap().push((labels.len(), n_positive));
		Ok(())
	}

	fn test(&self, _model: &(), _features: ArrayView2<f32>, labels: &[usize]) -> f32 {
		let n_positive = labels.iter().filter(|label| **label == 1).count();
		n_positive.to_f32().unwrap() / labels.len().to_f32().unwrap()
	}
}
