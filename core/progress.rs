use cartune_util::progress_counter::ProgressCounter;

/// A `Progress` is sent to the progress callback passed to [`run`](fn.run.html) as each stage of the pipeline begins.
#[derive(Debug)]
pub enum Progress {
	Loading(ProgressCounter),
	Shuffling,
	TrainingBaseline,
	RandomSearch(ProgressCounter),
	GridSearch(ProgressCounter),
}
