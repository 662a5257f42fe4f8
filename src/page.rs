use handlebars::{Handlebars, RenderError, TemplateError};
use serde::{Deserialize, Serialize};

use crate::session::{Notice, Session};
use crate::table::Table;

/// Prefix of the form fields carrying cell values (`cell:<column>`).
pub const CELL_FIELD_PREFIX: &str = "cell:";

const EDITOR_TEMPLATE: &str = "editor";

/// Query string of the page: filter criterion and modify target.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PageQuery {
    pub column: Option<String>,
    pub value: Option<String>,
    pub row: Option<String>,
}

/// Parse a row index typed into one of the index boxes.
pub fn parse_index(raw: &str) -> Result<i64, String> {
    let raw = raw.trim();
    raw.parse()
        .map_err(|_| format!("Invalid index {:?}. Please try again.", raw))
}

#[derive(Debug, Serialize)]
pub struct PageContext {
    loaded: bool,
    file_name: Option<String>,
    notices: Vec<Notice>,
    columns: Vec<ColumnOption>,
    rows: Vec<RowContext>,
    row_count: usize,
    max_index: usize,
    add_fields: Vec<Field>,
    filter: Option<FilterContext>,
    modify: Option<ModifyContext>,
}

#[derive(Debug, Serialize)]
struct ColumnOption {
    name: String,
    selected: bool,
}

#[derive(Debug, Serialize)]
struct RowContext {
    index: usize,
    cells: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Field {
    name: String,
    column: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct FilterContext {
    column: String,
    value: String,
    count: usize,
    rows: Vec<RowContext>,
}

#[derive(Debug, Serialize)]
struct ModifyContext {
    index: usize,
    fields: Vec<Field>,
}

/// Build the template registry with the editor page.
pub fn templates() -> Result<Handlebars<'static>, TemplateError> {
    let mut registry = Handlebars::new();
    registry.register_template_string(EDITOR_TEMPLATE, include_str!("./static/editor.hbs"))?;
    Ok(registry)
}

/// Render the editor page.
pub fn render(registry: &Handlebars<'static>, context: &PageContext) -> Result<String, RenderError> {
    registry.render(EDITOR_TEMPLATE, context)
}

impl PageContext {
    /// Page with only the file picker, shown before any upload.
    pub fn upload_only(notice: Option<Notice>) -> Self {
        PageContext {
            loaded: false,
            file_name: None,
            notices: notice.into_iter().collect(),
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: 0,
            max_index: 0,
            add_fields: Vec::new(),
            filter: None,
            modify: None,
        }
    }

    /// Full page for a loaded session.
    pub fn for_session(session: &Session, query: &PageQuery) -> Self {
        let table = session.table();
        let mut notices: Vec<Notice> = session.notice().cloned().into_iter().collect();

        // The column selector defaults to the first column
        let filter_column = query
            .column
            .clone()
            .or_else(|| table.columns().first().cloned())
            .unwrap_or_default();
        let filter_value = query.value.clone().unwrap_or_default();

        let filter = match table.filter(&filter_column, &filter_value) {
            Ok(view) if view.is_filtered() => Some(FilterContext {
                column: filter_column.clone(),
                value: filter_value.clone(),
                count: view.len(),
                rows: view
                    .iter()
                    .map(|(index, cells)| RowContext {
                        index,
                        cells: cells.to_vec(),
                    })
                    .collect(),
            }),
            Ok(_) => None,
            Err(e) => {
                notices.push(Notice::Error(e.to_string()));
                None
            }
        };

        let modify = if table.is_empty() {
            None
        } else {
            // A cleared box selects the first row
            let requested = match query.row.as_deref().map(str::trim) {
                None | Some("") => Ok(0),
                Some(raw) => parse_index(raw),
            };
            match requested.and_then(|row| table.checked_index(row).map_err(|e| e.to_string())) {
                Ok(index) => Some(ModifyContext {
                    index,
                    fields: fields(table, Some(index)),
                }),
                Err(message) => {
                    notices.push(Notice::Error(message));
                    None
                }
            }
        };

        PageContext {
            loaded: true,
            file_name: Some(session.file_name().to_string()),
            notices,
            columns: table
                .columns()
                .iter()
                .map(|name| ColumnOption {
                    name: name.clone(),
                    selected: *name == filter_column,
                })
                .collect(),
            rows: table
                .rows()
                .iter()
                .enumerate()
                .map(|(index, cells)| RowContext {
                    index,
                    cells: cells.clone(),
                })
                .collect(),
            row_count: table.row_count(),
            max_index: table.row_count().saturating_sub(1),
            add_fields: fields(table, None),
            filter,
            modify,
        }
    }
}

// One input per column, prefilled from `row` when given.
fn fields(table: &Table, row: Option<usize>) -> Vec<Field> {
    table
        .columns()
        .iter()
        .map(|column| Field {
            name: format!("{}{}", CELL_FIELD_PREFIX, column),
            column: column.clone(),
            value: row
                .and_then(|r| table.value(r, column))
                .unwrap_or_default()
                .to_string(),
        })
        .collect()
}
