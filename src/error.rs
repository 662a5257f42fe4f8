use thiserror::Error;

/// Everything that can go wrong while editing a sheet.
///
/// Each variant carries enough context to be shown to the user as-is; the web
/// layer renders the `Display` text as a notice.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The uploaded bytes are not a readable workbook.
    #[error("Failed to read workbook: {0}")]
    Parse(String),

    /// A delete/modify target outside `0..len`.
    #[error("Invalid index {index}: the table has {len} rows. Please try again.")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("Unknown column `{0}`")]
    UnknownColumn(String),

    /// A row whose width differs from the table's column count.
    #[error("Row has {found} cells but the table has {expected} columns")]
    Shape { expected: usize, found: usize },

    #[error("Unsupported upload `{0}`: only .xlsx workbooks are accepted")]
    UnsupportedUpload(String),

    #[error("No workbook loaded. Upload an .xlsx file first.")]
    NoSession,

    #[error("Failed to write workbook: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
}

pub type EditorResult<T> = Result<T, EditorError>;
