/*!
This crate implements the small dataframe cartune loads tabular datasets into. A dataframe is a list of named columns, one per csv column, where each column holds every value as a number, as a member of a small set of options, or not at all for columns the pipeline ignores.
*/

use std::num::NonZeroUsize;

pub mod load;

pub use self::load::*;

#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
	pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
	Unknown(UnknownColumn),
	Number(NumberColumn),
	Enum(EnumColumn),
}

/// A column whose type could not be determined or that was explicitly excluded. Only its length is tracked.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownColumn {
	pub name: String,
	pub len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberColumn {
	pub name: String,
	pub data: Vec<f32>,
}

/// A column whose values are drawn from a small set of options. Each value is stored as a one-based index into `options`, or `None` when the csv held a missing or unlisted value.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumColumn {
	pub name: String,
	pub options: Vec<String>,
	pub data: Vec<Option<NonZeroUsize>>,
}

#[derive(Debug, Clone)]
pub enum ColumnType {
	Unknown,
	Number,
	Enum { options: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataFrameView<'a> {
	pub columns: Vec<ColumnView<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnView<'a> {
	Unknown(UnknownColumnView<'a>),
	Number(NumberColumnView<'a>),
	Enum(EnumColumnView<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnknownColumnView<'a> {
	pub name: &'a str,
	pub len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberColumnView<'a> {
	pub name: &'a str,
	pub data: &'a [f32],
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumColumnView<'a> {
	pub name: &'a str,
	pub options: &'a [String],
	pub data: &'a [Option<NonZeroUsize>],
}

impl DataFrame {
	pub fn new(column_names: Vec<String>, column_types: Vec<ColumnType>) -> Self {
		let columns = column_names
			.into_iter()
			.zip(column_types.into_iter())
			.map(|(column_name, column_type)| match column_type {
				ColumnType::Unknown => Column::Unknown(UnknownColumn::new(column_name)),
				ColumnType::Number => Column::Number(NumberColumn::new(column_name)),
				ColumnType::Enum { options } => Column::Enum(EnumColumn::new(column_name, options)),
			})
			.collect();
		Self { columns }
	}

	pub fn ncols(&self) -> usize {
		self.columns.len()
	}

	pub fn nrows(&self) -> usize {
		self.columns.first().map(|column| column.len()).unwrap_or(0)
	}

	/// Look up a column by name.
	pub fn column(&self, name: &str) -> Option<&Column> {
		self.columns.iter().find(|column| column.name() == name)
	}

	pub fn view(&self) -> DataFrameView {
		let columns = self.columns.iter().map(|column| column.view()).collect();
		DataFrameView { columns }
	}
}

impl Column {
	pub fn len(&self) -> usize {
		match self {
			Self::Unknown(s) => s.len,
			Self::Number(s) => s.data.len(),
			Self::Enum(s) => s.data.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn name(&self) -> &str {
		match self {
			Self::Unknown(s) => s.name.as_str(),
			Self::Number(s) => s.name.as_str(),
			Self::Enum(s) => s.name.as_str(),
		}
	}

	pub fn as_number(&self) -> Option<&NumberColumn> {
		match self {
			Self::Number(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_enum(&self) -> Option<&EnumColumn> {
		match self {
			Self::Enum(s) => Some(s),
			_ => None,
		}
	}

	pub fn view(&self) -> ColumnView {
		match self {
			Self::Unknown(column) => ColumnView::Unknown(column.view()),
			Self::Number(column) => ColumnView::Number(column.view()),
			Self::Enum(column) => ColumnView::Enum(column.view()),
		}
	}
}

impl UnknownColumn {
	pub fn new(name: String) -> Self {
		Self { name, len: 0 }
	}

	pub fn view(&self) -> UnknownColumnView {
		UnknownColumnView {
			name: &self.name,
			len: self.len,
		}
	}
}

impl NumberColumn {
	pub fn new(name: String) -> Self {
		Self {
			name,
			data: Vec::new(),
		}
	}

	pub fn view(&self) -> NumberColumnView {
		NumberColumnView {
			name: &self.name,
			data: &self.data,
		}
	}
}

impl EnumColumn {
	pub fn new(name: String, options: Vec<String>) -> Self {
		Self {
			name,
			options,
			data: Vec::new(),
		}
	}

	pub fn view(&self) -> EnumColumnView {
		EnumColumnView {
			name: &self.name,
			options: &self.options,
			data: &self.data,
		}
	}
}

impl<'a> DataFrameView<'a> {
	pub fn ncols(&self) -> usize {
		self.columns.len()
	}

	pub fn nrows(&self) -> usize {
		self.columns.first().map(|column| column.len()).unwrap_or(0)
	}

	/// Look up a column by name.
	pub fn column(&self, name: &str) -> Option<&ColumnView<'a>> {
		self.columns.iter().find(|column| column.name() == name)
	}

	/// Split every column at `index`, returning the view of rows `[0, index)` and the view of rows `[index, nrows)`.
	pub fn split_at_row(&self, index: usize) -> (Self, Self) {
		let iter = self.columns.iter().map(|column| column.split_at_row(index));
		let mut columns_a = Vec::with_capacity(self.columns.len());
		let mut columns_b = Vec::with_capacity(self.columns.len());
		for (column_a, column_b) in iter {
			columns_a.push(column_a);
			columns_b.push(column_b);
		}
		(Self { columns: columns_a }, Self { columns: columns_b })
	}
}

impl<'a> ColumnView<'a> {
	pub fn len(&self) -> usize {
		match self {
			Self::Unknown(s) => s.len,
			Self::Number(s) => s.data.len(),
			Self::Enum(s) => s.data.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn name(&self) -> &str {
		match self {
			Self::Unknown(s) => s.name,
			Self::Number(s) => s.name,
			Self::Enum(s) => s.name,
		}
	}

	pub fn as_number(&self) -> Option<NumberColumnView<'a>> {
		match self {
			Self::Number(s) => Some(s.clone()),
			_ => None,
		}
	}

	pub fn as_enum(&self) -> Option<EnumColumnView<'a>> {
		match self {
			Self::Enum(s) => Some(s.clone()),
			_ => None,
		}
	}

	pub fn split_at_row(&self, index: usize) -> (Self, Self) {
		match self {
			ColumnView::Unknown(column) => (
				ColumnView::Unknown(UnknownColumnView {
					name: column.name,
					len: index,
				}),
				ColumnView::Unknown(UnknownColumnView {
					name: column.name,
					len: column.len - index,
				}),
			),
			ColumnView::Number(column) => {
				let (data_a, data_b) = column.data.split_at(index);
				(
					ColumnView::Number(NumberColumnView {
						name: column.name,
						data: data_a,
					}),
					ColumnView::Number(NumberColumnView {
						name: column.name,
						data: data_b,
					}),
				)
			}
			ColumnView::Enum(column) => {
				let (data_a, data_b) = column.data.split_at(index);
				(
					ColumnView::Enum(EnumColumnView {
						name: column.name,
						options: column.options,
						data: data_a,
					}),
					ColumnView::Enum(EnumColumnView {
						name: column.name,
						options: column.options,
						data: data_b,
					}),
				)
			}
		}
	}
}

#[test]
fn test_split_at_row() {
	let dataframe = DataFrame {
		columns: vec![
			Column::Number(NumberColumn {
				name: "a".to_owned(),
				data: vec![1.0, 2.0, 3.0, 4.0],
			}),
			Column::Enum(EnumColumn {
				name: "b".to_owned(),
				options: vec!["x".to_owned(), "y".to_owned()],
				data: vec![
					NonZeroUsize::new(1),
					NonZeroUsize::new(2),
					NonZeroUsize::new(2),
					NonZeroUsize::new(1),
				],
			}),
		],
	};
	let (left, right) = dataframe.view().split_at_row(3);
	assert_eq!(left.nrows(), 3);
	assert_eq!(right.nrows(), 1);
	let left_a = left.columns[0].as_number().unwrap();
	assert_eq!(left_a.data, &[1.0, 2.0, 3.0]);
	let right_b = right.columns[1].as_enum().unwrap();
	assert_eq!(right_b.data, &[NonZeroUsize::new(1)]);
	assert_eq!(right_b.options, &["x".to_owned(), "y".to_owned()]);
}

#[test]
fn test_column_lookup() {
	let dataframe = DataFrame::new(
		vec!["a".to_owned(), "b".to_owned()],
		vec![
			ColumnType::Number,
			ColumnType::Enum {
				options: vec!["x".to_owned()],
			},
		],
	);
	assert_eq!(dataframe.column("a").unwrap().name(), "a");
	assert!(dataframe.column("a").unwrap().as_number().is_some());
	assert!(dataframe.column("b").unwrap().as_enum().is_some());
	assert!(dataframe.column("c").is_none());
}
