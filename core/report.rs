/*!
This module defines the `ComparisonReport` returned by [`run`](../fn.run.html), which holds one row per tuning method along with any searches that were skipped.
*/

use crate::space::TrainConfig;
use cartune_util::table::Table;
use std::time::Duration;

/// The tuning method that produced a row of the comparison.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
	Default,
	RandomSearch,
	GridSearch,
}

impl std::fmt::Display for Method {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Method::Default => write!(f, "Default"),
			Method::RandomSearch => write!(f, "Random Search"),
			Method::GridSearch => write!(f, "Grid Search"),
		}
	}
}

/// One completed row of the comparison.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodResult {
	pub method: Method,
	/// The accuracy of the final model on the held out test set.
	pub test_accuracy: f32,
	/// How long the method spent training. For the searches this covers scoring every candidate and the refit, and for `Default` it is zero.
	pub train_duration: Duration,
	/// The configuration the final model was trained with.
	pub config: TrainConfig,
	/// The cross validation accuracy of the winning configuration, if the method searched.
	pub cv_accuracy: Option<f32>,
	/// How many configurations the method scored, if the method searched.
	pub n_evaluated: Option<usize>,
}

/// A search that was skipped because its space failed validation.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodFailure {
	pub method: Method,
	pub message: String,
}

/// The assembled comparison, one row per method that ran to completion.
#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonReport {
	pub rows: Vec<MethodResult>,
	pub failures: Vec<MethodFailure>,
}

impl ComparisonReport {
	/// Render the comparison as a text table.
	pub fn to_table(&self) -> Table {
		let mut table = Table::new(vec![
			"method".to_owned(),
			"test accuracy".to_owned(),
			"training time".to_owned(),
		]);
		for row in self.rows.iter() {
			table.add_row(vec![
				row.method.to_string(),
				format!("{:.4}", row.test_accuracy),
				format!("{:.2}s", row.train_duration.as_secs_f32()),
			]);
		}
		table
	}
}

#[test]
fn test_method_display() {
	assert_eq!(Method::Default.to_string(), "Default");
	assert_eq!(Method::RandomSearch.to_string(), "Random Search");
	assert_eq!(Method::GridSearch.to_string(), "Grid Search");
}

#[test]
fn test_report_to_table() {
	let row = |method, test_accuracy, millis| MethodResult {
		method,
		test_accuracy,
		train_duration: Duration::from_millis(millis),
		config: TrainConfig::default(),
		cv_accuracy: None,
		n_evaluated: None,
	};
	let report = ComparisonReport {
		rows: vec![
			row(Method::Default, 0.9474, 0),
			row(Method::RandomSearch, 0.9385, 3210),
			row(Method::GridSearch, 0.9561, 12350),
		],
		failures: vec![],
	};
	let expected = concat!(
		"| method        | test accuracy | training time |\n",
		"|---------------|---------------|---------------|\n",
		"| Default       | 0.9474        | 0.00s         |\n",
		"| Random Search | 0.9385        | 3.21s         |\n",
		"| Grid Search   | 0.9561        | 12.35s        |\n",
	);
	assert_eq!(report.to_table().to_string(), expected);
}
