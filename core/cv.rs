/*!
This module implements k fold cross validation over a training set that has already been shuffled, so the folds are contiguous row ranges.
*/

use crate::space::TrainConfig;
use crate::trainer::Trainer;
use anyhow::{format_err, Result};
use cartune_metrics::{Mean, StreamingMetric};
use ndarray::{prelude::*, s};

/// The row boundaries of `n_folds` contiguous folds over `n_examples` rows. The first `n_examples % n_folds` folds hold one extra row.
pub fn fold_boundaries(n_examples: usize, n_folds: usize) -> Vec<(usize, usize)> {
	let base = n_examples / n_folds;
	let remainder = n_examples % n_folds;
	let mut boundaries = Vec::with_capacity(n_folds);
	let mut start = 0;
	for fold_index in 0..n_folds {
		let len = if fold_index < remainder {
			base + 1
		} else {
			base
		};
		boundaries.push((start, start + len));
		start += len;
	}
	boundaries
}

/// Estimate the accuracy of one configuration by training on all rows outside each fold and scoring on the fold, then averaging the fold scores.
pub fn cross_validate<T>(
	trainer: &T,
	features: ArrayView2<f32>,
	labels: &[usize],
	config: &TrainConfig,
	n_folds: usize,
) -> Result<f32>
where
	T: Trainer,
{
	let n_examples = labels.len();
	if n_folds < 2 {
		return Err(format_err!(
			"cross validation requires at least 2 folds, got {}",
			n_folds
		));
	}
	if n_folds > n_examples {
		return Err(format_err!(
			"cannot split {} examples into {} folds",
			n_examples,
			n_folds
		));
	}
	let mut mean = Mean::new();
	for (fold_start, fold_end) in fold_boundaries(n_examples, n_folds) {
		let train_indexes: Vec<usize> = (0..fold_start).chain(fold_end..n_examples).collect();
		let features_train = features.select(Axis(0), &train_indexes);
		let labels_train: Vec<usize> = train_indexes.iter().map(|index| labels[*index]).collect();
		let features_fold = features.slice(s![fold_start..fold_end, ..]);
		let labels_fold = &labels[fold_start..fold_end];
		let model = trainer.train(features_train.view(), &labels_train, config)?;
		mean.update(trainer.test(&model, features_fold, labels_fold));
	}
	Ok(mean.finalize().unwrap())
}

#[test]
fn test_fold_boundaries() {
	assert_eq!(
		fold_boundaries(10, 5),
		vec![(0, 2), (2, 4), (4, 6), (6, 8), (8, 10)]
	);
	assert_eq!(
		fold_boundaries(11, 5),
		vec![(0, 3), (3, 5), (5, 7), (7, 9), (9, 11)]
	);
	assert_eq!(fold_boundaries(6, 3), vec![(0, 2), (2, 4), (4, 6)]);
	assert_eq!(
		fold_boundaries(5, 5),
		vec![(0, 1), (1, 2), (2, 3), (3, 4), (4, 5)]
	);
}

#[test]
fn test_cross_validate_averages_over_folds() {
	use crate::testing::FoldRecordingTrainer;
	let features = Array2::<f32>::zeros((6, 1));
	let labels = vec![1, 1, 0, 0, 0, 0];
	let trainer = FoldRecordingTrainer::new();
	let accuracy = cross_validate(
		&trainer,
		features.view(),
		&labels,
		&TrainConfig::default(),
		3,
	)
	.unwrap();
	// fold scores are 1.0, 0.0, and 0.0
	assert!((accuracy - 1.0 / 3.0).abs() < 1e-6);
	// each fold trains on the four rows outside it
	let folds = trainer.folds.lock().unwrap();
	assert_eq!(*folds, vec![(4, 0), (4, 2), (4, 2)]);
}

#[test]
fn test_cross_validate_requires_enough_folds() {
	use crate::testing::FoldRecordingTrainer;
	let features = Array2::<f32>::zeros((6, 1));
	let labels = vec![0, 1, 0, 1, 0, 1];
	let trainer = FoldRecordingTrainer::new();
	let result = cross_validate(
		&trainer,
		features.view(),
		&labels,
		&TrainConfig::default(),
		1,
	);
	assert!(result.is_err());
	let result = cross_validate(
		&trainer,
		features.view(),
		&labels,
		&TrainConfig::default(),
		7,
	);
	assert!(result.is_err());
}
