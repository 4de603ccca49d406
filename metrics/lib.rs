/*!
This crate defines the [`StreamingMetric`](trait.StreamingMetric.html) trait and the concrete metrics cartune computes with it, [`Mean`](struct.Mean.html) and [`Accuracy`](struct.Accuracy.html).
*/

#![allow(clippy::tabs_in_doc_comments)]

mod accuracy;
mod mean;

pub use self::accuracy::Accuracy;
pub use self::mean::Mean;

/**
The `StreamingMetric` trait is a common interface to metrics that can be computed over input that arrives in chunks. After initializing a metric, call `update()` with each value of the associated type `Input`. Metrics computed independently, for example on separate threads, can be combined with `merge()`. When all input has been aggregated, `finalize()` consumes the metric and produces the associated type `Output`.

The seemingly unused generic lifetime `'a` exists here to allow `Input`s and `Output`s to borrow from their enclosing scope. When Rust stabilizes Generic Associated Types (GATs), the generic lifetime will move to the associated types.
*/
pub trait StreamingMetric<'a> {
	/// `Input` is the type to aggregate in calls to `update()`.
	type Input;
	/// `Output` is the return type of `finalize()`.
	type Output;
	/// Update this streaming metric with the `Input` `input`.
	fn update(&mut self, input: Self::Input);
	/// Merge multiple independently computed streaming metrics.
	fn merge(&mut self, other: Self);
	/// When you are done aggregating `Input`s, call `finalize()` to produce an `Output`.
	fn finalize(self) -> Self::Output;
}
