/*!
# Sheet Editor

A browser-based editor for Excel workbooks, built in Rust.

## Overview

A user uploads an `.xlsx` file, sees its first worksheet as a table, filters
rows by substring on a chosen column, appends, deletes or edits rows, and
downloads the result as `modified_dataset.xlsx`.

## Architecture

### Data Layer
- **table**: the `Table` value and its functional edit operations
  (filter, add, delete, modify). Edits return a new table.
- **loader**: `.xlsx` bytes to `Table` (first worksheet, header row, cells
  normalized to strings)
- **downloader**: `Table` to `.xlsx` bytes
- **cache**: content-addressed cache of parsed uploads (SHA-256 of the bytes)

### Session Layer
- **session**: a `Session` owns one table; `Event`s move a session to the next
  one; the `SessionStore` keeps sessions by cookie id and expires idle ones

### Web Layer (feature `web`)
- **app**: axum routes and handlers
- **page**: handlebars page model for the single editor page

## HTTP Endpoints

- `GET /` - Editor page (`column`, `value` filter; `row` modify target)
- `POST /upload` - Multipart upload of an `.xlsx` file
- `POST /rows/add`, `/rows/delete`, `/rows/modify` - Row edits
- `GET /download` - Modified workbook
- `POST /session/close` - Discard the session
- `GET /api/table` - Current table or filtered view as JSON
*/

pub mod cache;
pub mod config;
pub mod downloader;
pub mod error;
pub mod loader;
pub mod session;
pub mod table;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod page;

pub use error::{EditorError, EditorResult};
pub use session::{Event, Notice, Session, SessionStore};
pub use table::{Table, View};
