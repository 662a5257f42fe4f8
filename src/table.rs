use std::collections::HashMap;

use serde::Serialize;

use crate::error::{EditorError, EditorResult};

/// The whole in-memory sheet of a session.
///
/// A table is a list of named columns and a list of rows, every row holding
/// exactly one string cell per column in column order. Tables are treated as
/// values: the editing operations below never touch `self` and return a new
/// table instead, so a table handed out for rendering can never change under
/// the reader.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// A read-only projection of a [`Table`] produced by [`Table::filter`].
///
/// Matching rows keep the index they have in the underlying table.
#[derive(Clone, Debug)]
pub struct View<'a> {
    table: &'a Table,
    matches: Vec<usize>,
    filtered: bool,
}

impl Table {
    /// Build a table from column names and rows.
    ///
    /// # Arguments
    /// * `columns` - Column names, in display order
    /// * `rows` - Row cells, each aligned with `columns`
    ///
    /// # Returns
    /// * `EditorResult<Table>` - The table, or `EditorError::Shape` if any row
    ///   has a different number of cells than there are columns
    ///
    /// # Examples
    /// ```
    /// use sheet_editor::table::Table;
    ///
    /// let table = Table::new(
    ///     vec!["name".to_string(), "age".to_string()],
    ///     vec![vec!["Ann".to_string(), "30".to_string()]],
    /// )
    /// .unwrap();
    /// assert_eq!(table.row_count(), 1);
    /// assert_eq!(table.value(0, "age"), Some("30"));
    /// ```
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> EditorResult<Self> {
        if let Some(row) = rows.iter().find(|row| row.len() != columns.len()) {
            return Err(EditorError::Shape {
                expected: columns.len(),
                found: row.len(),
            });
        }
        Ok(Table { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Cell at `row` in the named column.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|cells| cells[col].as_str())
    }

    /// Row `index` as `(column, value)` pairs in column order.
    pub fn record(&self, index: usize) -> Option<Vec<(&str, &str)>> {
        let row = self.rows.get(index)?;
        Some(
            self.columns
                .iter()
                .map(String::as_str)
                .zip(row.iter().map(String::as_str))
                .collect(),
        )
    }

    /// Validate a user supplied row index against the current row count.
    ///
    /// The index arrives as a signed number from a form, so negative values are
    /// rejected here as well.
    pub fn checked_index(&self, index: i64) -> EditorResult<usize> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.rows.len())
            .ok_or(EditorError::IndexOutOfRange {
                index,
                len: self.rows.len(),
            })
    }

    /// Keep the rows whose value in `column` contains `needle`.
    ///
    /// Matching is a plain case-sensitive substring test. An empty `needle`
    /// yields the identity view without looking at `column` at all.
    ///
    /// # Arguments
    /// * `column` - Name of the column to test
    /// * `needle` - Substring that must occur in the cell
    ///
    /// # Returns
    /// * `EditorResult<View>` - The view, or `EditorError::UnknownColumn`
    pub fn filter<'a>(&'a self, column: &str, needle: &str) -> EditorResult<View<'a>> {
        if needle.is_empty() {
            return Ok(View {
                table: self,
                matches: (0..self.rows.len()).collect(),
                filtered: false,
            });
        }

        let col = self
            .column_index(column)
            .ok_or_else(|| EditorError::UnknownColumn(column.to_string()))?;

        let matches = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row[col].contains(needle))
            .map(|(i, _)| i)
            .collect();

        Ok(View {
            table: self,
            matches,
            filtered: true,
        })
    }

    /// Append a row built from `values`.
    ///
    /// Columns without an entry get an empty cell; keys that are not columns
    /// are dropped.
    pub fn add_row(&self, values: &HashMap<String, String>) -> Table {
        for key in values.keys().filter(|k| self.column_index(k).is_none()) {
            log::debug!("ignoring value for unknown column `{}`", key);
        }

        let row = self
            .columns
            .iter()
            .map(|col| values.get(col).cloned().unwrap_or_default())
            .collect();

        let mut rows = self.rows.clone();
        rows.push(row);
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Remove the row at `index`; the rows after it move up by one.
    pub fn delete_row(&self, index: usize) -> EditorResult<Table> {
        self.ensure_index(index)?;

        let mut rows = self.rows.clone();
        rows.remove(index);
        Ok(Table {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Overwrite the cells of row `index` with `values`, column by column.
    ///
    /// A column with no entry in `values` keeps its current cell.
    pub fn modify_row(&self, index: usize, values: &HashMap<String, String>) -> EditorResult<Table> {
        self.ensure_index(index)?;

        let mut rows = self.rows.clone();
        for (col, name) in self.columns.iter().enumerate() {
            if let Some(value) = values.get(name) {
                rows[index][col] = value.clone();
            }
        }
        Ok(Table {
            columns: self.columns.clone(),
            rows,
        })
    }

    fn ensure_index(&self, index: usize) -> EditorResult<()> {
        if index < self.rows.len() {
            Ok(())
        } else {
            Err(EditorError::IndexOutOfRange {
                index: i64::try_from(index).unwrap_or(i64::MAX),
                len: self.rows.len(),
            })
        }
    }
}

impl<'a> View<'a> {
    pub fn columns(&self) -> &'a [String] {
        self.table.columns()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Whether a non-empty filter was applied.
    pub fn is_filtered(&self) -> bool {
        self.filtered
    }

    /// Matching rows with their index in the source table.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &'a [String])> + '_ {
        let table = self.table;
        self.matches.iter().map(move |&i| (i, table.rows[i].as_slice()))
    }

    /// Copy the matching rows into a standalone table.
    pub fn to_table(&self) -> Table {
        Table {
            columns: self.table.columns.clone(),
            rows: self.iter().map(|(_, row)| row.to_vec()).collect(),
        }
    }
}
