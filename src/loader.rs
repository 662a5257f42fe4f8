use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use chrono::{NaiveDateTime, Timelike};

use crate::error::{EditorError, EditorResult};
use crate::table::Table;

/// Load a table from the bytes of an Excel workbook
///
/// This function reads the first worksheet of an XLSX file. The first used row
/// becomes the column names and every following row becomes a table row. All
/// cells are normalized to strings (see [`cell_to_string`]).
///
/// # Arguments
/// * `bytes` - Raw content of the uploaded `.xlsx` file
///
/// # Returns
/// * `EditorResult<Table>` - The loaded table, or `EditorError::Parse` if the
///   bytes are not a readable workbook
///
/// # Examples
/// ```no_run
/// use sheet_editor::loader::from_xlsx_bytes;
///
/// let bytes = std::fs::read("data.xlsx").unwrap();
/// match from_xlsx_bytes(&bytes) {
///     Ok(table) => println!("Loaded {} rows", table.row_count()),
///     Err(e) => eprintln!("Error loading Excel: {}", e),
/// }
/// ```
pub fn from_xlsx_bytes(bytes: &[u8]) -> EditorResult<Table> {
    let mut workbook: Xlsx<_> =
        open_workbook_from_rs(Cursor::new(bytes)).map_err(|e: calamine::XlsxError| EditorError::Parse(e.to_string()))?;

    // Only the first worksheet is edited
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| EditorError::Parse("No sheets found in Excel file".to_string()))?
        .map_err(|e| EditorError::Parse(e.to_string()))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Table::default());
    };

    let columns = header_names(header);
    let body = rows
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    Table::new(columns, body)
}

/// Check that an uploaded file name carries the `.xlsx` extension
///
/// # Arguments
/// * `file_name` - Name reported by the browser for the upload
///
/// # Returns
/// * `EditorResult<()>` - Ok for `.xlsx` (any case), `UnsupportedUpload` otherwise
pub fn ensure_xlsx_name(file_name: &str) -> EditorResult<()> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("xlsx") => Ok(()),
        _ => Err(EditorError::UnsupportedUpload(file_name.to_string())),
    }
}

/// Convert a worksheet cell to the string stored in the table
///
/// * empty cells become `""`
/// * whole floats drop their fraction (`30.0` is `"30"`)
/// * booleans are written the way Excel shows them (`TRUE`/`FALSE`)
/// * dates become `YYYY-MM-DD`, or `YYYY-MM-DD HH:MM:SS` when they carry a time
/// * everything else uses the cell's own text
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => float_to_string(*f),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        Data::DateTime(dt) if !dt.is_duration() => match dt.as_datetime() {
            Some(datetime) => datetime_to_string(datetime),
            None => cell.to_string(),
        },
        other => other.to_string(),
    }
}

fn float_to_string(f: f64) -> String {
    // Whole numbers well inside the exact range of f64
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

fn datetime_to_string(datetime: NaiveDateTime) -> String {
    if datetime.hour() == 0 && datetime.minute() == 0 && datetime.second() == 0 {
        datetime.format("%Y-%m-%d").to_string()
    } else {
        datetime.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

// Blank headers get a positional name and repeated ones a numeric suffix, so
// every column name is unique and non-empty.
fn header_names(header: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(header.len());

    for (position, cell) in header.iter().enumerate() {
        let mut name = cell_to_string(cell);
        if name.is_empty() {
            name = format!("Unnamed: {}", position);
        }

        let base = name.clone();
        while seen.contains_key(&name) {
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            name = format!("{}.{}", base, count);
        }
        seen.insert(name.clone(), 0);
        names.push(name);
    }

    names
}
