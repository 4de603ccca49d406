use super::*;
use anyhow::Result;
use std::{
	collections::{BTreeMap, BTreeSet},
	path::Path,
};

#[derive(Clone, Default)]
pub struct FromCsvOptions {
	pub column_types: Option<BTreeMap<String, ColumnType>>,
	pub infer_options: InferOptions,
}

#[derive(Debug, Clone)]
pub struct InferOptions {
	/// A column whose set of distinct values stays at or below this count is inferred as an enum column.
	pub enum_max_unique_values: usize,
}

impl Default for InferOptions {
	fn default() -> Self {
		Self {
			enum_max_unique_values: 100,
		}
	}
}

/// Values that count as missing wherever they appear.
const INVALID_VALUES: &[&str] = &[
	"", "null", "NULL", "n/a", "N/A", "nan", "-nan", "NaN", "-NaN", "?",
];

impl DataFrame {
	pub fn from_path(path: &Path, options: FromCsvOptions, progress: impl Fn(u64)) -> Result<Self> {
		Self::from_csv(&mut csv::Reader::from_path(path)?, options, progress)
	}

	pub fn from_csv<R>(
		reader: &mut csv::Reader<R>,
		options: FromCsvOptions,
		progress: impl Fn(u64),
	) -> Result<Self>
	where
		R: std::io::Read + std::io::Seek,
	{
		let column_names: Vec<String> = reader
			.headers()?
			.into_iter()
			.map(|column_name| column_name.to_owned())
			.collect();
		let n_columns = column_names.len();
		let start_position = reader.position().clone();
		let infer_options = &options.infer_options;
		let mut n_rows = None;

		#[derive(Clone, Debug)]
		enum ColumnTypeOrInferStats<'a> {
			ColumnType(ColumnType),
			InferStats(InferStats<'a>),
		}

		// Take the column types given in the options and set up inference for the rest.
		let mut column_types: Vec<ColumnTypeOrInferStats> =
			if let Some(column_types) = options.column_types {
				column_names
					.iter()
					.map(|column_name| {
						column_types
							.get(column_name)
							.map(|column_type| {
								ColumnTypeOrInferStats::ColumnType(column_type.clone())
							})
							.unwrap_or_else(|| {
								ColumnTypeOrInferStats::InferStats(InferStats::new(infer_options))
							})
					})
					.collect()
			} else {
				vec![ColumnTypeOrInferStats::InferStats(InferStats::new(infer_options)); n_columns]
			};

		// An inference pass over the csv is only necessary if one or more columns did not have its type specified.
		let needs_infer =
			column_types.iter().any(
				|column_type_or_infer_stats| match column_type_or_infer_stats {
					ColumnTypeOrInferStats::ColumnType(_) => false,
					ColumnTypeOrInferStats::InferStats(_) => true,
				},
			);

		let column_types: Vec<ColumnType> = if needs_infer {
			let mut infer_stats: Vec<(usize, &mut InferStats)> = column_types
				.iter_mut()
				.enumerate()
				.filter_map(
					|(index, column_type_or_infer_stats)| match column_type_or_infer_stats {
						ColumnTypeOrInferStats::ColumnType(_) => None,
						ColumnTypeOrInferStats::InferStats(infer_stats) => {
							Some((index, infer_stats))
						}
					},
				)
				.collect();
			// Update the infer stats for each record in the csv.
			let mut record = csv::StringRecord::new();
			let mut n_rows_computed = 0;
			while reader.read_record(&mut record)? {
				n_rows_computed += 1;
				for (index, infer_stats) in infer_stats.iter_mut() {
					let value = record.get(*index).unwrap_or("");
					infer_stats.update(value);
				}
			}
			n_rows = Some(n_rows_computed);
			let column_types = column_types
				.into_iter()
				.map(
					|column_type_or_infer_stats| match column_type_or_infer_stats {
						ColumnTypeOrInferStats::ColumnType(column_type) => column_type,
						ColumnTypeOrInferStats::InferStats(infer_stats) => infer_stats.finalize(),
					},
				)
				.collect();
			// Return to the first record of the csv to load the values.
			reader.seek(start_position)?;
			column_types
		} else {
			column_types
				.into_iter()
				.map(
					|column_type_or_infer_stats| match column_type_or_infer_stats {
						ColumnTypeOrInferStats::ColumnType(column_type) => column_type,
						_ => unreachable!(),
					},
				)
				.collect()
		};

		let mut dataframe = Self::new(column_names, column_types);
		// If an inference pass ran, the row count is known, so reserve storage up front.
		if let Some(n_rows) = n_rows {
			for column in dataframe.columns.iter_mut() {
				match column {
					Column::Unknown(_) => {}
					Column::Number(column) => column.data.reserve_exact(n_rows),
					Column::Enum(column) => column.data.reserve_exact(n_rows),
				}
			}
		}
		// Read each csv record and insert the values into the columns of the dataframe.
		let mut record = csv::ByteRecord::new();
		while reader.read_byte_record(&mut record)? {
			progress(record.position().unwrap().byte());
			for (column, value) in dataframe.columns.iter_mut().zip(record.iter()) {
				match column {
					Column::Unknown(column) => {
						column.len += 1;
					}
					Column::Number(column) => {
						let value = match lexical::parse::<f32, &[u8]>(value) {
							Ok(value) if value.is_finite() => value,
							_ => std::f32::NAN,
						};
						column.data.push(value);
					}
					Column::Enum(column) => {
						let value = std::str::from_utf8(value).ok().and_then(|value| {
							column
								.options
								.iter()
								.position(|option| option.as_str() == value)
								.map(|position| NonZeroUsize::new(position + 1).unwrap())
						});
						column.data.push(value);
					}
				}
			}
		}
		Ok(dataframe)
	}
}

#[derive(Clone, Debug)]
pub struct InferStats<'a> {
	infer_options: &'a InferOptions,
	column_type: InferColumnType,
	unique_values: Option<BTreeSet<String>>,
}

#[derive(PartialEq, Clone, Copy, Debug)]
enum InferColumnType {
	Unknown,
	Number,
	Enum,
	Other,
}

impl<'a> InferStats<'a> {
	pub fn new(infer_options: &'a InferOptions) -> Self {
		Self {
			infer_options,
			column_type: InferColumnType::Unknown,
			unique_values: Some(BTreeSet::new()),
		}
	}

	pub fn update(&mut self, value: &str) {
		if INVALID_VALUES.contains(&value) {
			return;
		}
		if let Some(unique_values) = self.unique_values.as_mut() {
			if !unique_values.contains(value) {
				unique_values.insert(value.to_owned());
			}
			if unique_values.len() > self.infer_options.enum_max_unique_values {
				self.unique_values = None;
			}
		}
		match self.column_type {
			InferColumnType::Unknown | InferColumnType::Number => {
				if lexical::parse::<f32, &str>(value)
					.map(|v| v.is_finite())
					.unwrap_or(false)
				{
					self.column_type = InferColumnType::Number;
				} else if self.unique_values.is_some() {
					self.column_type = InferColumnType::Enum;
				} else {
					self.column_type = InferColumnType::Other;
				}
			}
			InferColumnType::Enum => {
				if self.unique_values.is_none() {
					self.column_type = InferColumnType::Other;
				}
			}
			InferColumnType::Other => {}
		}
	}

	pub fn finalize(self) -> ColumnType {
		match self.column_type {
			InferColumnType::Unknown => ColumnType::Unknown,
			InferColumnType::Number => {
				// A number column whose values are all zero or one is an enum column in disguise.
				if let Some(unique_values) = self.unique_values {
					let mut values = unique_values.iter();
					if values.next().map(|s| s.as_str()) == Some("0")
						&& values.next().map(|s| s.as_str()) == Some("1")
						&& values.next().is_none()
					{
						return ColumnType::Enum {
							options: unique_values.into_iter().collect(),
						};
					}
				}
				ColumnType::Number
			}
			InferColumnType::Enum => ColumnType::Enum {
				options: self.unique_values.unwrap().into_iter().collect(),
			},
			InferColumnType::Other => ColumnType::Unknown,
		}
	}
}

#[test]
fn test_infer() {
	let csv = r#"size,diagnosis,id
1,B,a1
2,B,a2
3,M,a3
"#;
	let df = DataFrame::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions {
			column_types: None,
			infer_options: InferOptions {
				enum_max_unique_values: 2,
			},
		},
		|_| {},
	)
	.unwrap();
	insta::assert_debug_snapshot!(df, @r###"
 DataFrame {
     columns: [
         Number(
             NumberColumn {
                 name: "size",
                 data: [
                     1.0,
                     2.0,
                     3.0,
                 ],
             },
         ),
         Enum(
             EnumColumn {
                 name: "diagnosis",
                 options: [
                     "B",
                     "M",
                 ],
                 data: [
                     Some(
                         1,
                     ),
                     Some(
                         1,
                     ),
                     Some(
                         2,
                     ),
                 ],
             },
         ),
         Unknown(
             UnknownColumn {
                 name: "id",
                 len: 3,
             },
         ),
     ],
 }
 "###);
}

#[test]
fn test_column_types() {
	let csv = r#"id,size,diagnosis
1,10.5,B
2,11.5,M
"#;
	let mut column_types = BTreeMap::new();
	column_types.insert("id".to_owned(), ColumnType::Unknown);
	column_types.insert(
		"diagnosis".to_owned(),
		ColumnType::Enum {
			options: vec!["B".to_owned(), "M".to_owned()],
		},
	);
	let df = DataFrame::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions {
			column_types: Some(column_types),
			infer_options: InferOptions::default(),
		},
		|_| {},
	)
	.unwrap();
	insta::assert_debug_snapshot!(df, @r###"
 DataFrame {
     columns: [
         Unknown(
             UnknownColumn {
                 name: "id",
                 len: 2,
             },
         ),
         Number(
             NumberColumn {
                 name: "size",
                 data: [
                     10.5,
                     11.5,
                 ],
             },
         ),
         Enum(
             EnumColumn {
                 name: "diagnosis",
                 options: [
                     "B",
                     "M",
                 ],
                 data: [
                     Some(
                         1,
                     ),
                     Some(
                         2,
                     ),
                 ],
             },
         ),
     ],
 }
 "###);
}

#[test]
fn test_missing_values() {
	let csv = r#"a,b
1,x
?,y
3,
"#;
	let df = DataFrame::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions::default(),
		|_| {},
	)
	.unwrap();
	insta::assert_debug_snapshot!(df, @r###"
 DataFrame {
     columns: [
         Number(
             NumberColumn {
                 name: "a",
                 data: [
                     1.0,
                     NaN,
                     3.0,
                 ],
             },
         ),
         Enum(
             EnumColumn {
                 name: "b",
                 options: [
                     "x",
                     "y",
                 ],
                 data: [
                     Some(
                         1,
                     ),
                     Some(
                         2,
                     ),
                     None,
                 ],
             },
         ),
     ],
 }
 "###);
}

#[test]
fn test_zero_one_number_column_is_enum() {
	let csv = r#"label
0
1
0
"#;
	let df = DataFrame::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions::default(),
		|_| {},
	)
	.unwrap();
	let column = df.column("label").unwrap().as_enum().unwrap();
	assert_eq!(column.options, vec!["0".to_owned(), "1".to_owned()]);
	assert_eq!(
		column.data,
		vec![
			NonZeroUsize::new(1),
			NonZeroUsize::new(2),
			NonZeroUsize::new(1),
		]
	);
}
