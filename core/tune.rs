/*!
This module implements the two searches. Both score every candidate configuration with k fold cross validation, keep the first candidate with the highest score, and refit it on the entire training set.
*/

use crate::cv::cross_validate;
use crate::space::{GridSpace, RandomSpace, TrainConfig};
use crate::trainer::Trainer;
use anyhow::{format_err, Result};
use cartune_util::progress_counter::ProgressCounter;
use ndarray::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// The outcome of one search: the winning configuration refit on the entire training set, along with the numbers the report shows.
pub struct TuneOutput<Model> {
	/// The first configuration to reach the highest cross validation accuracy.
	pub best_config: TrainConfig,
	/// The model trained with `best_config` on the entire training set.
	pub model: Model,
	/// The cross validation accuracy of `best_config`.
	pub best_cv_accuracy: f32,
	/// How many configurations the search scored.
	pub n_evaluated: usize,
	/// How long the search took, including the refit.
	pub duration: Duration,
}

/// Sample `trials` configurations from `space` and return the best, refit on all of `features` and `labels`.
pub fn random_search<T>(
	trainer: &T,
	features: ArrayView2<f32>,
	labels: &[usize],
	space: &RandomSpace,
	trials: usize,
	n_folds: usize,
	seed: u64,
	progress: &ProgressCounter,
) -> Result<TuneOutput<T::Model>>
where
	T: Trainer,
{
	space.validate()?;
	if trials == 0 {
		return Err(format_err!("the number of trials must be at least 1"));
	}
	let start = Instant::now();
	// sample every configuration up front so the candidate sequence depends only on the seed
	let mut rng = Xoshiro256Plus::seed_from_u64(seed);
	let configurations: Vec<TrainConfig> = (0..trials).map(|_| space.sample(&mut rng)).collect();
	let (best_config, model, best_cv_accuracy) =
		evaluate_and_refit(trainer, features, labels, &configurations, n_folds, progress)?;
	Ok(TuneOutput {
		best_config,
		model,
		best_cv_accuracy,
		n_evaluated: configurations.len(),
		duration: start.elapsed(),
	})
}

/// Score every configuration in `space` and return the best, refit on all of `features` and `labels`.
pub fn grid_search<T>(
	trainer: &T,
	features: ArrayView2<f32>,
	labels: &[usize],
	space: &GridSpace,
	n_folds: usize,
	progress: &ProgressCounter,
) -> Result<TuneOutput<T::Model>>
where
	T: Trainer,
{
	space.validate()?;
	let start = Instant::now();
	let configurations = space.configurations();
	let (best_config, model, best_cv_accuracy) =
		evaluate_and_refit(trainer, features, labels, &configurations, n_folds, progress)?;
	Ok(TuneOutput {
		best_config,
		model,
		best_cv_accuracy,
		n_evaluated: configurations.len(),
		duration: start.elapsed(),
	})
}

fn evaluate_and_refit<T>(
	trainer: &T,
	features: ArrayView2<f32>,
	labels: &[usize],
	configurations: &[TrainConfig],
	n_folds: usize,
	progress: &ProgressCounter,
) -> Result<(TrainConfig, T::Model, f32)>
where
	T: Trainer,
{
	// score every candidate in parallel
	let scores: Vec<Result<f32>> = configurations
		.par_iter()
		.map(|config| {
			let score = cross_validate(trainer, features, labels, config, n_folds)?;
			progress.inc(1);
			Ok(score)
		})
		.collect();
	// scan in candidate order with a strictly greater comparison so the first of equal scores wins
	let mut best: Option<(usize, f32)> = None;
	for (index, score) in scores.into_iter().enumerate() {
		let score = score?;
		match best {
			Some((_, best_score)) if score <= best_score => {}
			_ => best = Some((index, score)),
		}
	}
	let (best_index, best_score) =
		best.ok_or_else(|| format_err!("no configurations were evaluated"))?;
	let best_config = configurations[best_index].clone();
	// refit the winner on the entire training set
	let model = trainer.train(features, labels, &best_config)?;
	Ok((best_config, model, best_score))
}

#[cfg(test)]
use crate::testing::FakeTrainer;
#[cfg(test)]
use std::sync::atomic::Ordering;

#[cfg(test)]
fn depth_score(config: &TrainConfig) -> f32 {
	// deeper is better, so the search must find the largest max_depth
	config.max_depth.unwrap() as f32 / 100.0
}

#[cfg(test)]
fn constant_score(_config: &TrainConfig) -> f32 {
	0.5
}

#[cfg(test)]
fn leaf_tie_score(config: &TrainConfig) -> f32 {
	if config.min_examples_per_leaf == 5 {
		0.9
	} else {
		0.7
	}
}

#[test]
fn test_random_search_budget() {
	let trainer = FakeTrainer::new(depth_score);
	let features = Array2::<f32>::zeros((20, 1));
	let labels = vec![0, 1].repeat(10);
	let space = RandomSpace::default();
	let progress = ProgressCounter::new(10);
	let output = random_search(&trainer, features.view(), &labels, &space, 10, 4, 42, &progress)
		.unwrap();
	assert_eq!(output.n_evaluated, 10);
	assert_eq!(progress.get(), 10);
	// ten candidates with four folds each, plus the refit
	assert_eq!(trainer.train_calls.load(Ordering::Relaxed), 10 * 4 + 1);
	let max_depth = output.best_config.max_depth.unwrap();
	assert!((1..20).contains(&max_depth));
	assert!((2..20).contains(&output.best_config.min_examples_per_split));
	assert!((1..20).contains(&output.best_config.min_examples_per_leaf));
	assert_eq!(output.best_cv_accuracy, depth_score(&output.best_config));
}

#[test]
fn test_random_search_is_seeded() {
	let features = Array2::<f32>::zeros((12, 1));
	let labels = vec![0, 1].repeat(6);
	let space = RandomSpace::default();
	let run = |seed: u64| {
		let trainer = FakeTrainer::new(depth_score);
		let progress = ProgressCounter::new(20);
		random_search(&trainer, features.view(), &labels, &space, 20, 3, seed, &progress)
			.unwrap()
	};
	let first = run(42);
	let second = run(42);
	assert_eq!(first.best_config, second.best_config);
	assert_eq!(first.best_cv_accuracy, second.best_cv_accuracy);
}

#[test]
fn test_random_search_ties_go_to_the_first_candidate() {
	let trainer = FakeTrainer::new(constant_score);
	let features = Array2::<f32>::zeros((8, 1));
	let labels = vec![0, 1].repeat(4);
	let space = RandomSpace::default();
	let progress = ProgressCounter::new(15);
	let output = random_search(&trainer, features.view(), &labels, &space, 15, 2, 7, &progress)
		.unwrap();
	// every candidate scores the same, so the first sampled one must win
	let mut rng = Xoshiro256Plus::seed_from_u64(7);
	let first_sampled = space.sample(&mut rng);
	assert_eq!(output.best_config, first_sampled);
	assert_eq!(output.best_cv_accuracy, 0.5);
}

#[test]
fn test_grid_search_is_exhaustive() {
	let trainer = FakeTrainer::new(depth_score);
	let features = Array2::<f32>::zeros((12, 1));
	let labels = vec![0, 1].repeat(6);
	let space = GridSpace::default();
	let progress = ProgressCounter::new(36);
	let output = grid_search(&trainer, features.view(), &labels, &space, 3, &progress).unwrap();
	assert_eq!(output.n_evaluated, 36);
	assert_eq!(progress.get(), 36);
	assert_eq!(trainer.train_calls.load(Ordering::Relaxed), 36 * 3 + 1);
	// the winner must match an independent scan over every configuration
	let best_by_hand = space
		.configurations()
		.into_iter()
		.max_by(|a, b| depth_score(a).partial_cmp(&depth_score(b)).unwrap())
		.unwrap();
	assert_eq!(output.best_cv_accuracy, depth_score(&best_by_hand));
	assert_eq!(output.best_config.max_depth, Some(15));
}

#[test]
fn test_grid_search_ties_go_to_the_first_candidate() {
	let trainer = FakeTrainer::new(leaf_tie_score);
	let features = Array2::<f32>::zeros((8, 1));
	let labels = vec![0, 1].repeat(4);
	let space = GridSpace::default();
	let progress = ProgressCounter::new(36);
	let output = grid_search(&trainer, features.view(), &labels, &space, 2, &progress).unwrap();
	// twelve configurations score 0.9, and the first of them in grid order is (3, 2, 5)
	assert_eq!(
		output.best_config,
		TrainConfig {
			max_depth: Some(3),
			min_examples_per_split: 2,
			min_examples_per_leaf: 5,
		}
	);
	assert_eq!(output.best_cv_accuracy, 0.9);
}

#[test]
fn test_search_refits_on_the_entire_training_set() {
	let trainer = FakeTrainer::new(constant_score);
	let features = Array2::<f32>::zeros((10, 1));
	let labels = vec![0, 1].repeat(5);
	let space = GridSpace::default();
	let progress = ProgressCounter::new(36);
	let output = grid_search(&trainer, features.view(), &labels, &space, 5, &progress).unwrap();
	// cross validation trains on 8 of 10 rows, the refit must see all 10
	assert_eq!(output.model.n_train_examples, 10);
}

#[test]
fn test_invalid_space_fails_before_any_evaluation() {
	let trainer = FakeTrainer::new(constant_score);
	let features = Array2::<f32>::zeros((8, 1));
	let labels = vec![0, 1].repeat(4);
	let space = RandomSpace {
		max_depth: 0..20,
		..Default::default()
	};
	let progress = ProgressCounter::new(5);
	let result = random_search(&trainer, features.view(), &labels, &space, 5, 2, 42, &progress);
	assert!(result.is_err());
	assert_eq!(trainer.train_calls.load(Ordering::Relaxed), 0);
	let space = GridSpace {
		min_examples_per_split: vec![0],
		..Default::default()
	};
	let result = grid_search(&trainer, features.view(), &labels, &space, 2, &progress);
	assert!(result.is_err());
	assert_eq!(trainer.train_calls.load(Ordering::Relaxed), 0);
}
