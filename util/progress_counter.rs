use std::sync::{
	atomic::{AtomicU64, Ordering},
	Arc,
};

/// A `ProgressCounter` tracks how many items of a known total have been processed. It is cheap to clone and safe to update from multiple threads, so a long-running step can hand one to a progress callback and keep incrementing it while the caller renders it.
#[derive(Clone, Debug)]
pub struct ProgressCounter {
	current: Arc<AtomicU64>,
	total: u64,
}

impl ProgressCounter {
	pub fn new(total: u64) -> Self {
		Self {
			current: Arc::new(AtomicU64::new(0)),
			total,
		}
	}
	pub fn total(&self) -> u64 {
		self.total
	}
	pub fn get(&self) -> u64 {
		self.current.load(Ordering::Relaxed)
	}
	pub fn set(&self, value: u64) {
		self.current.store(value, Ordering::Relaxed);
	}
	pub fn inc(&self, amount: u64) {
		self.current.fetch_add(amount, Ordering::Relaxed);
	}
	/// Returns the completed fraction in `[0, 1]`, or `1.0` when the total is zero.
	pub fn fraction(&self) -> f32 {
		if self.total == 0 {
			return 1.0;
		}
		self.get() as f32 / self.total as f32
	}
}

#[test]
fn test_progress_counter() {
	let counter = ProgressCounter::new(4);
	assert_eq!(counter.get(), 0);
	counter.inc(1);
	let clone = counter.clone();
	clone.inc(1);
	assert_eq!(counter.get(), 2);
	assert_eq!(counter.total(), 4);
	assert!((counter.fraction() - 0.5).abs() < f32::EPSILON);
	counter.set(4);
	assert_eq!(counter.get(), 4);
}
