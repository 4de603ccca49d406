use super::StreamingMetric;
use num_traits::ToPrimitive;

/// The streaming arithmetic mean of a sequence of `f32`s.
#[derive(Clone, Debug, Default)]
pub struct Mean {
	n: u64,
	mean: f64,
}

impl Mean {
	pub fn new() -> Self {
		Self::default()
	}
}

impl StreamingMetric<'_> for Mean {
	type Input = f32;
	type Output = Option<f32>;

	fn update(&mut self, input: Self::Input) {
		self.n += 1;
		self.mean += (input.to_f64().unwrap() - self.mean) / self.n.to_f64().unwrap();
	}

	fn merge(&mut self, other: Self) {
		if other.n == 0 {
			return;
		}
		let n = self.n + other.n;
		self.mean = (self.mean * self.n.to_f64().unwrap() + other.mean * other.n.to_f64().unwrap())
			/ n.to_f64().unwrap();
		self.n = n;
	}

	fn finalize(self) -> Self::Output {
		if self.n == 0 {
			None
		} else {
			self.mean.to_f32()
		}
	}
}

#[test]
fn test_mean() {
	let mut mean = Mean::new();
	assert_eq!(mean.clone().finalize(), None);
	for value in &[1.0, 2.0, 3.0] {
		mean.update(*value);
	}
	assert_eq!(mean.finalize(), Some(2.0));
}

#[test]
fn test_mean_merge() {
	let mut a = Mean::new();
	a.update(1.0);
	a.update(2.0);
	let mut b = Mean::new();
	b.update(5.0);
	a.merge(b);
	assert_eq!(a.finalize(), Some(8.0 / 3.0));
	let mut c = Mean::new();
	c.update(4.0);
	c.merge(Mean::new());
	assert_eq!(c.finalize(), Some(4.0));
}
