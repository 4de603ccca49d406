use crate::{
	config::{self, Config},
	progress::Progress,
	report::{ComparisonReport, Method, MethodFailure, MethodResult},
	space::{GridSpace, InvalidSpaceError, RandomSpace, TrainConfig},
	trainer::{Trainer, TreeTrainer},
	tune::{self, TuneOutput},
};
use anyhow::{format_err, Context, Result};
use cartune_dataframe::*;
use cartune_tree::InvalidTrainOptionsError;
use cartune_util::progress_counter::ProgressCounter;
use itertools::izip;
use ndarray::prelude::*;
use num_traits::ToPrimitive;
use rand::{seq::SliceRandom, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;
use std::{collections::BTreeMap, path::Path, time::Duration};

/// Run the whole comparison: load the csv at `file_path`, hold out a test set, train a baseline tree, tune with randomized search and with grid search, and score all three models on the held out set.
pub fn run(
	file_path: &Path,
	target_column_name: &str,
	config_path: Option<&Path>,
	update_progress: &mut dyn FnMut(Progress),
) -> Result<ComparisonReport> {
	// load the config from the config file, if one was provided
	let config = load_config(config_path)?;
	// load the dataframe from the csv file
	let mut dataframe = load_dataframe(file_path, &config, update_progress)?;
	// shuffle the dataframe, unless the config disables it
	shuffle(&mut dataframe, &config, update_progress);
	// train and compare
	run_pipeline(
		&dataframe,
		target_column_name,
		&config,
		&TreeTrainer,
		update_progress,
	)
}

fn load_config(config_path: Option<&Path>) -> Result<Option<Config>> {
	if let Some(config_path) = config_path {
		let config = std::fs::read_to_string(config_path)
			.with_context(|| format!("failed to read config file {}", config_path.display()))?;
		let config = serde_yaml::from_str(&config)
			.with_context(|| format!("failed to parse config file {}", config_path.display()))?;
		Ok(Some(config))
	} else {
		Ok(None)
	}
}

fn load_dataframe(
	file_path: &Path,
	config: &Option<Config>,
	update_progress: &mut dyn FnMut(Progress),
) -> Result<DataFrame> {
	let len = std::fs::metadata(file_path)
		.with_context(|| format!("failed to read dataset csv {}", file_path.display()))?
		.len();
	let progress_counter = ProgressCounter::new(len);
	update_progress(Progress::Loading(progress_counter.clone()));
	let column_types = match config.as_ref().and_then(|config| config.column_types.as_ref()) {
		Some(column_types) => column_types
			.iter()
			.map(|(column_name, column_type)| {
				let column_type = match column_type {
					config::ColumnType::Unknown => ColumnType::Unknown,
					config::ColumnType::Number => ColumnType::Number,
					config::ColumnType::Enum { options } => ColumnType::Enum {
						options: options.clone(),
					},
				};
				(column_name.clone(), column_type)
			})
			.collect(),
		None => {
			// without a config, ignore the id column the reference dataset carries
			let mut column_types = BTreeMap::new();
			column_types.insert("id".to_owned(), ColumnType::Unknown);
			column_types
		}
	};
	let dataframe = DataFrame::from_path(
		file_path,
		FromCsvOptions {
			column_types: Some(column_types),
			..Default::default()
		},
		|byte| progress_counter.set(byte),
	)
	.with_context(|| format!("failed to load dataset csv {}", file_path.display()))?;
	Ok(dataframe)
}

fn shuffle(
	dataframe: &mut DataFrame,
	config: &Option<Config>,
	update_progress: &mut dyn FnMut(Progress),
) {
	// shuffling is on by default with a fixed seed so repeated runs see the same split
	let default_seed = 42;
	let shuffle_seed = config
		.as_ref()
		.and_then(|config| config.shuffle.as_ref())
		.map(|shuffle| match shuffle {
			config::Shuffle::Enabled(enabled) => {
				if *enabled {
					Some(default_seed)
				} else {
					None
				}
			}
			config::Shuffle::Options { seed } => Some(*seed),
		})
		.unwrap_or(Some(default_seed));
	if let Some(seed) = shuffle_seed {
		update_progress(Progress::Shuffling);
		dataframe.columns.par_iter_mut().for_each(|column| {
			// seed each column identically so the rows stay aligned across columns
			let mut rng = Xoshiro256Plus::seed_from_u64(seed);
			match column {
				Column::Unknown(_) => {}
				Column::Number(column) => column.data.shuffle(&mut rng),
				Column::Enum(column) => column.data.shuffle(&mut rng),
			}
		});
	}
}

fn run_pipeline<T>(
	dataframe: &DataFrame,
	target_column_name: &str,
	config: &Option<Config>,
	trainer: &T,
	update_progress: &mut dyn FnMut(Progress),
) -> Result<ComparisonReport>
where
	T: Trainer,
{
	// split the dataframe into train and test
	let test_fraction = config
		.as_ref()
		.and_then(|config| config.test_fraction)
		.unwrap_or(0.2);
	if !(test_fraction > 0.0 && test_fraction < 1.0) {
		return Err(format_err!(
			"test_fraction must be between 0 and 1, got {}",
			test_fraction
		));
	}
	let n_rows_train = ((1.0 - test_fraction) * dataframe.nrows().to_f32().unwrap())
		.to_usize()
		.unwrap();
	let (dataframe_train, dataframe_test) = dataframe.view().split_at_row(n_rows_train);
	if dataframe_train.nrows() == 0 || dataframe_test.nrows() == 0 {
		return Err(format_err!(
			"the dataset has too few rows to hold out a fraction of {} for testing",
			test_fraction
		));
	}
	let (features_train, labels_train) = features_and_labels(&dataframe_train, target_column_name)?;
	let (features_test, labels_test) = features_and_labels(&dataframe_test, target_column_name)?;
	// read the search settings
	let n_folds = config.as_ref().and_then(|config| config.folds).unwrap_or(5);
	let trials = config
		.as_ref()
		.and_then(|config| config.trials)
		.unwrap_or(50);
	let seed = config.as_ref().and_then(|config| config.seed).unwrap_or(42);
	let random_space = config
		.as_ref()
		.and_then(|config| config.random_space.as_ref())
		.map(RandomSpace::from_config)
		.unwrap_or_default();
	let grid_space = config
		.as_ref()
		.and_then(|config| config.grid_space.as_ref())
		.map(GridSpace::from_config)
		.unwrap_or_default();
	// train the baseline with the default configuration. it does no search, so its training time is zero by convention
	update_progress(Progress::TrainingBaseline);
	let baseline_config = TrainConfig::default();
	let baseline_model = trainer.train(features_train.view(), &labels_train, &baseline_config)?;
	let mut rows = vec![MethodResult {
		method: Method::Default,
		test_accuracy: trainer.test(&baseline_model, features_test.view(), &labels_test),
		train_duration: Duration::from_secs(0),
		config: baseline_config,
		cv_accuracy: None,
		n_evaluated: None,
	}];
	let mut failures = Vec::new();
	// run randomized search
	let progress_counter = ProgressCounter::new(trials.to_u64().unwrap());
	update_progress(Progress::RandomSearch(progress_counter.clone()));
	let output = tune::random_search(
		trainer,
		features_train.view(),
		&labels_train,
		&random_space,
		trials,
		n_folds,
		seed,
		&progress_counter,
	);
	collect_search_output(
		output,
		Method::RandomSearch,
		trainer,
		features_test.view(),
		&labels_test,
		&mut rows,
		&mut failures,
	)?;
	// run grid search
	let progress_counter = ProgressCounter::new(grid_space.size().to_u64().unwrap());
	update_progress(Progress::GridSearch(progress_counter.clone()));
	let output = tune::grid_search(
		trainer,
		features_train.view(),
		&labels_train,
		&grid_space,
		n_folds,
		&progress_counter,
	);
	collect_search_output(
		output,
		Method::GridSearch,
		trainer,
		features_test.view(),
		&labels_test,
		&mut rows,
		&mut failures,
	)?;
	Ok(ComparisonReport { rows, failures })
}

fn collect_search_output<T>(
	output: Result<TuneOutput<T::Model>>,
	method: Method,
	trainer: &T,
	features_test: ArrayView2<f32>,
	labels_test: &[usize],
	rows: &mut Vec<MethodResult>,
	failures: &mut Vec<MethodFailure>,
) -> Result<()>
where
	T: Trainer,
{
	match output {
		Ok(output) => {
			rows.push(MethodResult {
				method,
				test_accuracy: trainer.test(&output.model, features_test, labels_test),
				train_duration: output.duration,
				config: output.best_config,
				cv_accuracy: Some(output.best_cv_accuracy),
				n_evaluated: Some(output.n_evaluated),
			});
			Ok(())
		}
		// a space that declares invalid values skips its search, but the rest of the comparison still runs
		Err(error) if is_invalid_space_error(&error) => {
			failures.push(MethodFailure {
				method,
				message: format!("{:#}", error),
			});
			Ok(())
		}
		Err(error) => Err(error),
	}
}

fn is_invalid_space_error(error: &anyhow::Error) -> bool {
	error.downcast_ref::<InvalidSpaceError>().is_some()
		|| error.downcast_ref::<InvalidTrainOptionsError>().is_some()
}

fn features_and_labels(
	dataframe: &DataFrameView,
	target_column_name: &str,
) -> Result<(Array2<f32>, Vec<usize>)> {
	// the target must be an enum column with exactly two options
	let target_column = dataframe.column(target_column_name).ok_or_else(|| {
		let column_names: Vec<&str> = dataframe
			.columns
			.iter()
			.map(|column| column.name())
			.collect();
		format_err!(
			"did not find target column \"{}\" among column names \"{}\"",
			target_column_name,
			column_names.join(", ")
		)
	})?;
	let target_column = target_column.as_enum().ok_or_else(|| {
		format_err!(
			"the target column \"{}\" must hold one of a small set of values",
			target_column_name
		)
	})?;
	if target_column.options.len() != 2 {
		return Err(format_err!(
			"the target column \"{}\" must have exactly 2 options, found {}",
			target_column_name,
			target_column.options.len()
		));
	}
	let labels: Vec<usize> = target_column
		.data
		.iter()
		.map(|value| {
			value.map(|value| value.get() - 1).ok_or_else(|| {
				format_err!(
					"the target column \"{}\" has a missing value",
					target_column_name
				)
			})
		})
		.collect::<Result<Vec<usize>>>()?;
	// every number column other than the target becomes a feature
	let feature_columns: Vec<NumberColumnView> = dataframe
		.columns
		.iter()
		.filter(|column| column.name() != target_column_name)
		.filter_map(|column| column.as_number())
		.collect();
	if feature_columns.is_empty() {
		return Err(format_err!("found no number columns to use as features"));
	}
	let mut features = Array2::zeros((dataframe.nrows(), feature_columns.len()));
	for (mut feature_column, column) in izip!(features.gencolumns_mut(), feature_columns.iter()) {
		for (feature, value) in izip!(feature_column.iter_mut(), column.data.iter()) {
			if !value.is_finite() {
				return Err(format_err!(
					"the feature column \"{}\" has a missing or invalid value",
					column.name
				));
			}
			*feature = *value;
		}
	}
	Ok((features, labels))
}

#[cfg(test)]
use crate::testing::{FakeTrainer, FoldRecordingTrainer};
#[cfg(test)]
use std::num::NonZeroUsize;

#[cfg(test)]
fn test_dataframe(n_rows: usize) -> DataFrame {
	// two number features and a binary target that tracks whether size is in the first half
	let size: Vec<f32> = (0..n_rows).map(|index| index.to_f32().unwrap()).collect();
	let noise: Vec<f32> = (0..n_rows)
		.map(|index| (index * 7 % 13).to_f32().unwrap())
		.collect();
	let diagnosis: Vec<Option<NonZeroUsize>> = (0..n_rows)
		.map(|index| {
			if index < n_rows / 2 {
				NonZeroUsize::new(1)
			} else {
				NonZeroUsize::new(2)
			}
		})
		.collect();
	DataFrame {
		columns: vec![
			Column::Number(NumberColumn {
				name: "size".to_owned(),
				data: size,
			}),
			Column::Number(NumberColumn {
				name: "noise".to_owned(),
				data: noise,
			}),
			Column::Enum(EnumColumn {
				name: "diagnosis".to_owned(),
				options: vec!["B".to_owned(), "M".to_owned()],
				data: diagnosis,
			}),
		],
	}
}

#[cfg(test)]
fn leaf_score(config: &TrainConfig) -> f32 {
	config.min_examples_per_leaf as f32 / 100.0
}

#[test]
fn test_features_and_labels() {
	let dataframe = test_dataframe(10);
	let (features, labels) = features_and_labels(&dataframe.view(), "diagnosis").unwrap();
	assert_eq!(features.dim(), (10, 2));
	assert_eq!(features[[3, 0]], 3.0);
	assert_eq!(features[[3, 1]], 8.0);
	assert_eq!(labels, vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1]);
}

#[test]
fn test_features_and_labels_errors() {
	let dataframe = test_dataframe(10);
	let error = features_and_labels(&dataframe.view(), "missing")
		.unwrap_err()
		.to_string();
	assert!(error.contains("did not find target column"));
	let error = features_and_labels(&dataframe.view(), "size")
		.unwrap_err()
		.to_string();
	assert!(error.contains("must hold one of a small set of values"));
	let mut dataframe = test_dataframe(10);
	match &mut dataframe.columns[1] {
		Column::Number(column) => column.data[4] = std::f32::NAN,
		_ => unreachable!(),
	}
	let error = features_and_labels(&dataframe.view(), "diagnosis")
		.unwrap_err()
		.to_string();
	assert!(error.contains("missing or invalid value"));
	let mut dataframe = test_dataframe(10);
	match &mut dataframe.columns[2] {
		Column::Enum(column) => column.data[0] = None,
		_ => unreachable!(),
	}
	let error = features_and_labels(&dataframe.view(), "diagnosis")
		.unwrap_err()
		.to_string();
	assert!(error.contains("has a missing value"));
	let mut dataframe = test_dataframe(10);
	match &mut dataframe.columns[2] {
		Column::Enum(column) => column.options.push("U".to_owned()),
		_ => unreachable!(),
	}
	let error = features_and_labels(&dataframe.view(), "diagnosis")
		.unwrap_err()
		.to_string();
	assert!(error.contains("exactly 2 options"));
}

#[test]
fn test_shuffle_is_deterministic_and_keeps_rows_aligned() {
	let mut a = test_dataframe(20);
	let mut b = test_dataframe(20);
	shuffle(&mut a, &None, &mut |_| {});
	shuffle(&mut b, &None, &mut |_| {});
	assert_eq!(a, b);
	// every row keeps its size and diagnosis pairing
	let size = a.columns[0].as_number().unwrap();
	let diagnosis = a.columns[2].as_enum().unwrap();
	for (size, diagnosis) in izip!(size.data.iter(), diagnosis.data.iter()) {
		let expected = if (*size as usize) < 10 { 1 } else { 2 };
		assert_eq!(diagnosis.unwrap().get(), expected);
	}
	// and the order actually changed
	let original: Vec<f32> = (0..20).map(|index| index as f32).collect();
	assert_ne!(size.data, original);
}

#[test]
fn test_shuffle_can_be_disabled() {
	let mut dataframe = test_dataframe(20);
	let config = Some(Config {
		shuffle: Some(config::Shuffle::Enabled(false)),
		..Default::default()
	});
	shuffle(&mut dataframe, &config, &mut |_| {});
	assert_eq!(dataframe, test_dataframe(20));
}

#[test]
fn test_shuffle_seed_changes_the_permutation() {
	let mut a = test_dataframe(20);
	let mut b = test_dataframe(20);
	shuffle(&mut a, &None, &mut |_| {});
	let config = Some(Config {
		shuffle: Some(config::Shuffle::Options { seed: 7 }),
		..Default::default()
	});
	shuffle(&mut b, &config, &mut |_| {});
	assert_ne!(a, b);
}

#[test]
fn test_run_pipeline_reports_all_three_methods() {
	let dataframe = test_dataframe(40);
	let trainer = FakeTrainer::new(leaf_score);
	let report = run_pipeline(&dataframe, "diagnosis", &None, &trainer, &mut |_| {}).unwrap();
	assert!(report.failures.is_empty());
	assert_eq!(report.rows.len(), 3);
	let default = &report.rows[0];
	assert_eq!(default.method, Method::Default);
	assert_eq!(default.train_duration, Duration::from_secs(0));
	assert_eq!(default.config, TrainConfig::default());
	assert_eq!(default.cv_accuracy, None);
	assert_eq!(default.n_evaluated, None);
	assert_eq!(default.test_accuracy, leaf_score(&TrainConfig::default()));
	let random = &report.rows[1];
	assert_eq!(random.method, Method::RandomSearch);
	assert_eq!(random.n_evaluated, Some(50));
	assert_eq!(random.cv_accuracy, Some(leaf_score(&random.config)));
	let grid = &report.rows[2];
	assert_eq!(grid.method, Method::GridSearch);
	assert_eq!(grid.n_evaluated, Some(36));
	// the first grid configuration with the best score wins
	assert_eq!(
		grid.config,
		TrainConfig {
			max_depth: Some(3),
			min_examples_per_split: 2,
			min_examples_per_leaf: 10,
		}
	);
	assert_eq!(grid.test_accuracy, leaf_score(&grid.config));
}

#[test]
fn test_run_pipeline_progress_events() {
	let dataframe = test_dataframe(40);
	let trainer = FakeTrainer::new(leaf_score);
	let mut events = Vec::new();
	run_pipeline(&dataframe, "diagnosis", &None, &trainer, &mut |progress| {
		events.push(progress)
	})
	.unwrap();
	assert_eq!(events.len(), 3);
	assert!(matches!(events[0], Progress::TrainingBaseline));
	match &events[1] {
		Progress::RandomSearch(counter) => {
			assert_eq!(counter.total(), 50);
			assert_eq!(counter.get(), 50);
		}
		_ => panic!(),
	}
	match &events[2] {
		Progress::GridSearch(counter) => {
			assert_eq!(counter.total(), 36);
			assert_eq!(counter.get(), 36);
		}
		_ => panic!(),
	}
}

#[test]
fn test_run_pipeline_trains_the_baseline_on_the_training_partition() {
	let dataframe = test_dataframe(40);
	let trainer = FoldRecordingTrainer::new();
	run_pipeline(&dataframe, "diagnosis", &None, &trainer, &mut |_| {}).unwrap();
	// the first training call is the baseline: 32 of 40 rows, 12 of them positive
	let folds = trainer.folds.lock().unwrap();
	assert_eq!(folds[0], (32, 12));
}

#[test]
fn test_run_pipeline_skips_a_search_whose_space_is_invalid() {
	let dataframe = test_dataframe(40);
	let trainer = FakeTrainer::new(leaf_score);
	let config = Some(Config {
		grid_space: Some(config::GridSpaceConfig {
			max_depth: None,
			min_examples_per_split: Some(vec![1]),
			min_examples_per_leaf: None,
		}),
		..Default::default()
	});
	let report = run_pipeline(&dataframe, "diagnosis", &config, &trainer, &mut |_| {}).unwrap();
	let methods: Vec<Method> = report.rows.iter().map(|row| row.method).collect();
	assert_eq!(methods, vec![Method::Default, Method::RandomSearch]);
	assert_eq!(report.failures.len(), 1);
	assert_eq!(report.failures[0].method, Method::GridSearch);
	assert!(report.failures[0].message.contains("min_examples_per_split"));
}

#[test]
fn test_run_pipeline_is_deterministic() {
	let dataframe = test_dataframe(40);
	let config = Some(Config {
		folds: Some(3),
		trials: Some(10),
		..Default::default()
	});
	let run = || {
		run_pipeline(&dataframe, "diagnosis", &config, &TreeTrainer, &mut |_| {}).unwrap()
	};
	let first = run();
	let second = run();
	assert_eq!(first.rows.len(), second.rows.len());
	for (a, b) in izip!(first.rows.iter(), second.rows.iter()) {
		assert_eq!(a.method, b.method);
		assert_eq!(a.test_accuracy, b.test_accuracy);
		assert_eq!(a.config, b.config);
		assert_eq!(a.cv_accuracy, b.cv_accuracy);
	}
}

#[test]
fn test_run_pipeline_rejects_a_bad_test_fraction() {
	let dataframe = test_dataframe(40);
	let trainer = FakeTrainer::new(leaf_score);
	let config = Some(Config {
		test_fraction: Some(1.5),
		..Default::default()
	});
	let result = run_pipeline(&dataframe, "diagnosis", &config, &trainer, &mut |_| {});
	assert!(result.is_err());
}
