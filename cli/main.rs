//! This module contains the main entrypoint to the cartune cli.

use cartune_core::Progress;
use clap::Clap;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Clap)]
#[clap(about = "Compare decision tree hyperparameter tuning methods on a csv dataset.")]
struct Options {
	#[clap(
		short,
		long,
		about = "the path to the dataset csv",
		default_value = "data/breast_cancer.csv"
	)]
	file: PathBuf,
	#[clap(
		short,
		long,
		about = "the name of the column to predict",
		default_value = "diagnosis"
	)]
	target: String,
	#[clap(short, long, about = "the path to a config file")]
	config: Option<PathBuf>,
	#[clap(
		short,
		long,
		about = "the path to write the accuracy chart to",
		default_value = "tuning_comparison.png"
	)]
	output: PathBuf,
	#[clap(long = "no-chart", about = "disable writing the accuracy chart", parse(from_flag = std::ops::Not::not))]
	chart: bool,
	#[clap(long = "no-progress", about = "disable the progress messages", parse(from_flag = std::ops::Not::not))]
	progress: bool,
}

fn main() {
	let options = Options::parse();
	if let Err(error) = cli_run(options) {
		eprintln!("{}: {:#}", "error".red().bold(), error);
		std::process::exit(1);
	}
}

fn cli_run(options: Options) -> anyhow::Result<()> {
	let show_progress = options.progress;
	let report = cartune_core::run(
		&options.file,
		&options.target,
		options.config.as_deref(),
		&mut |progress| {
			if show_progress {
				render_progress(&progress);
			}
		},
	)?;
	// report searches that were skipped because their space failed validation
	for failure in report.failures.iter() {
		eprintln!(
			"{}: {} was skipped: {}",
			"error".red().bold(),
			failure.method.to_string().to_lowercase(),
			failure.message,
		);
	}
	// print a line for each method, then the comparison table
	for row in report.rows.iter() {
		match (row.cv_accuracy, row.n_evaluated) {
			(Some(cv_accuracy), Some(n_evaluated)) => println!(
				"{}: evaluated {} configurations in {:.2}s, best cv accuracy {:.4}, best configuration: {}",
				row.method.to_string().to_lowercase(),
				n_evaluated,
				row.train_duration.as_secs_f32(),
				cv_accuracy,
				row.config,
			),
			_ => println!(
				"{}: test accuracy {:.4} with {}",
				row.method.to_string().to_lowercase(),
				row.test_accuracy,
				row.config,
			),
		}
	}
	println!();
	print!("{}", report.to_table());
	// write the chart, unless disabled. a chart failure must not fail the comparison
	if options.chart {
		let bars = report
			.rows
			.iter()
			.map(|row| cartune_chart::Bar {
				label: row.method.to_string(),
				value: row.test_accuracy,
			})
			.collect();
		let chart = cartune_chart::BarChart {
			title: "Hyperparameter Tuning Comparison".to_owned(),
			y_min: 0.9,
			y_max: 1.0,
			width: 640,
			height: 480,
			bars,
		};
		match chart.render(&options.output) {
			Ok(()) => eprintln!("wrote the accuracy chart to {}", options.output.display()),
			Err(error) => eprintln!(
				"{}: failed to write the accuracy chart to {}: {:#}",
				"warning".yellow().bold(),
				options.output.display(),
				error,
			),
		}
	}
	Ok(())
}

fn render_progress(progress: &Progress) {
	match progress {
		Progress::Loading(_) => eprintln!("loading the dataset"),
		Progress::Shuffling => eprintln!("shuffling the dataset"),
		Progress::TrainingBaseline => eprintln!("training the baseline model"),
		Progress::RandomSearch(counter) => eprintln!(
			"running random search over {} configurations",
			counter.total(),
		),
		Progress::GridSearch(counter) => eprintln!(
			"running grid search over {} configurations",
			counter.total(),
		),
	}
}
