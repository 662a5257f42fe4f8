use rust_xlsxwriter::Workbook;

use crate::error::EditorResult;
use crate::table::Table;

/// MIME type of the downloaded workbook.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Name the browser is told to save the download as.
pub const DOWNLOAD_FILE_NAME: &str = "modified_dataset.xlsx";

/// Convert a table to XLSX format
///
/// This function exports a table to XLSX (Excel) format using the rust_xlsxwriter library.
/// The worksheet starts with one header row holding the column names, followed by
/// the data rows in table order. No row-index column is written. Every cell is
/// written as a string, so loading the result gives back the same table.
///
/// # Arguments
/// * `table` - Reference to the table to convert
///
/// # Returns
/// * `EditorResult<Vec<u8>>` - XLSX file content as bytes or an error
///
/// # Examples
/// ```
/// use sheet_editor::downloader::to_xlsx;
/// use sheet_editor::table::Table;
///
/// let table = Table::new(vec!["name".to_string()], vec![vec!["Ann".to_string()]]).unwrap();
/// let xlsx_data = to_xlsx(&table).unwrap();
/// assert!(!xlsx_data.is_empty());
/// ```
pub fn to_xlsx(table: &Table) -> EditorResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    // Header row
    for (c, name) in table.columns().iter().enumerate() {
        worksheet.write_string(0, column_number(c), name)?;
    }

    // Data rows start right below the header
    for (r, row) in table.rows().iter().enumerate() {
        let sheet_row = (r + 1) as u32;
        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            worksheet.write_string(sheet_row, column_number(c), value)?;
        }
    }

    let buffer = workbook.save_to_buffer()?;
    log::debug!(
        "exported {} rows x {} columns ({} bytes)",
        table.row_count(),
        table.columns().len(),
        buffer.len()
    );

    Ok(buffer)
}

// Column positions past u16 are rejected by the writer itself
fn column_number(c: usize) -> u16 {
    u16::try_from(c).unwrap_or(u16::MAX)
}
