/// A `Table` renders rows of values as a pipe-delimited text table whose columns are padded to the width of their longest value.
pub struct Table {
	padding: usize,
	header: Vec<String>,
	rows: Vec<Vec<String>>,
}

impl Table {
	pub fn new(header: Vec<String>) -> Self {
		Self {
			padding: 1,
			header,
			rows: Vec::new(),
		}
	}
	/// Add a row to the bottom of the table. The row must have one value per header column.
	pub fn add_row(&mut self, row: Vec<String>) {
		assert_eq!(row.len(), self.header.len());
		self.rows.push(row);
	}
}

impl std::fmt::Display for Table {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		// compute column widths from the header and all rows
		let mut column_widths: Vec<usize> = self.header.iter().map(|header| header.len()).collect();
		for row in self.rows.iter() {
			for (column_width, value) in column_widths.iter_mut().zip(row.iter()) {
				*column_width = usize::max(*column_width, value.len());
			}
		}
		// write the header
		let header = Row {
			column_widths: &column_widths,
			padding: self.padding,
			values: &self.header,
		};
		writeln!(f, "{}", header)?;
		let line = Line {
			column_widths: &column_widths,
			padding: self.padding,
		};
		writeln!(f, "{}", line)?;
		// write the rows
		for values in self.rows.iter() {
			let row = Row {
				column_widths: &column_widths,
				padding: self.padding,
				values,
			};
			writeln!(f, "{}", row)?;
		}
		Ok(())
	}
}

struct Line<'a> {
	column_widths: &'a [usize],
	padding: usize,
}

impl<'a> std::fmt::Display for Line<'a> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "|")?;
		for column_width in self.column_widths.iter() {
			for _ in 0..column_width + 2 * self.padding {
				write!(f, "-")?;
			}
			write!(f, "|")?;
		}
		Ok(())
	}
}

struct Row<'a> {
	column_widths: &'a [usize],
	padding: usize,
	values: &'a [String],
}

impl<'a> std::fmt::Display for Row<'a> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "|")?;
		for (column_width, value) in self.column_widths.iter().zip(self.values) {
			for _ in 0..self.padding {
				write!(f, " ")?;
			}
			write!(f, "{}", value)?;
			for _ in 0..column_width + self.padding - value.len() {
				write!(f, " ")?;
			}
			write!(f, "|")?;
		}
		Ok(())
	}
}

#[test]
fn test_table_display() {
	let mut table = Table::new(vec!["method".to_owned(), "accuracy".to_owned()]);
	table.add_row(vec!["Default".to_owned(), "0.9474".to_owned()]);
	table.add_row(vec!["Grid Search".to_owned(), "0.9561".to_owned()]);
	let expected = concat!(
		"| method      | accuracy |\n",
		"|-------------|----------|\n",
		"| Default     | 0.9474   |\n",
		"| Grid Search | 0.9561   |\n",
	);
	assert_eq!(table.to_string(), expected);
}

#[test]
fn test_table_display_wide_value() {
	let mut table = Table::new(vec!["a".to_owned(), "b".to_owned()]);
	table.add_row(vec!["x".to_owned(), "longer than header".to_owned()]);
	let expected = concat!(
		"| a | b                  |\n",
		"|---|--------------------|\n",
		"| x | longer than header |\n",
	);
	assert_eq!(table.to_string(), expected);
}
