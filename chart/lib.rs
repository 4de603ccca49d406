/*!
This crate renders the accuracy comparison as a bar chart png.
*/

use anyhow::{format_err, Result};
use plotters::prelude::*;
use std::path::Path;

/// One bar of the chart.
pub struct Bar {
	pub label: String,
	pub value: f32,
}

/// A vertical bar chart with a fixed value axis. Values below `y_min` are clipped, so pick bounds that keep the differences between bars visible.
pub struct BarChart {
	pub title: String,
	pub y_min: f32,
	pub y_max: f32,
	pub width: u32,
	pub height: u32,
	pub bars: Vec<Bar>,
}

impl BarChart {
	/// Render the chart to a png file at `path`.
	pub fn render(&self, path: &Path) -> Result<()> {
		let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
		root.fill(&WHITE)
			.map_err(|error| format_err!("{}", error))?;
		let mut chart = ChartBuilder::on(&root)
			.caption(&self.title, ("sans-serif", 24))
			.margin(10)
			.x_label_area_size(40)
			.y_label_area_size(50)
			.build_cartesian_2d(
				(0..self.bars.len()).into_segmented(),
				self.y_min..self.y_max,
			)
			.map_err(|error| format_err!("{}", error))?;
		let labels: Vec<&str> = self.bars.iter().map(|bar| bar.label.as_str()).collect();
		chart
			.configure_mesh()
			.disable_x_mesh()
			.x_label_formatter(&|value| match value {
				SegmentValue::CenterOf(index) => {
					labels.get(*index).map(|label| label.to_string()).unwrap_or_default()
				}
				_ => String::new(),
			})
			.y_label_formatter(&|value| format!("{:.2}", value))
			.y_desc("test accuracy")
			.draw()
			.map_err(|error| format_err!("{}", error))?;
		chart
			.draw_series(
				Histogram::vertical(&chart)
					.style(BLUE.filled())
					.margin(20)
					.data(
						self.bars
							.iter()
							.enumerate()
							.map(|(index, bar)| (index, bar.value)),
					),
			)
			.map_err(|error| format_err!("{}", error))?;
		root.present().map_err(|error| format_err!("{}", error))?;
		Ok(())
	}
}
