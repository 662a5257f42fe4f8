use axum::{
    Form, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use handlebars::{Handlebars, TemplateError};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::cache::LoadCache;
use crate::config::Config;
use crate::downloader::{self, DOWNLOAD_FILE_NAME, XLSX_MIME};
use crate::error::{EditorError, EditorResult};
use crate::loader;
use crate::page::{self, CELL_FIELD_PREFIX, PageContext, PageQuery, parse_index};
use crate::session::{Event, Notice, Session, SessionStore};

pub const SESSION_COOKIE: &str = "session";

pub struct AppState {
    pub sessions: SessionStore,
    pub cache: LoadCache,
    pub config: Config,
    templates: Handlebars<'static>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, TemplateError> {
        Ok(AppState {
            sessions: SessionStore::new(config.session_ttl),
            cache: LoadCache::new(),
            templates: page::templates()?,
            config,
        })
    }
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    message: Option<String>,
}

#[derive(Serialize)]
struct TableResponse<'a> {
    file_name: &'a str,
    digest: &'a str,
    columns: &'a [String],
    filtered: bool,
    rows: Vec<RowResponse<'a>>,
}

#[derive(Serialize)]
struct RowResponse<'a> {
    index: usize,
    cells: &'a [String],
}

// Fields of the add/delete/modify forms
#[derive(Default)]
struct RowForm {
    index: Option<String>,
    values: HashMap<String, String>,
    filter_column: Option<String>,
    filter_value: Option<String>,
}

impl RowForm {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = RowForm::default();
        for (key, value) in pairs {
            if key == "index" {
                form.index = Some(value);
            } else if key == "column" {
                form.filter_column = Some(value);
            } else if key == "value" {
                form.filter_value = Some(value);
            } else if let Some(column) = key.strip_prefix(CELL_FIELD_PREFIX) {
                form.values.insert(column.to_string(), value);
            } else {
                log::debug!("ignoring form field `{}`", key);
            }
        }
        form
    }

    fn index(&self) -> Result<i64, String> {
        parse_index(self.index.as_deref().unwrap_or(""))
    }

    // Editor page with the sidebar filter the form was sent from
    fn return_to(&self) -> String {
        match (&self.filter_column, &self.filter_value) {
            (Some(column), Some(value)) if !value.is_empty() => format!(
                "/?column={}&value={}",
                urlencoding::encode(column),
                urlencoding::encode(value)
            ),
            _ => "/".to_string(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(serve_editor))
        .route("/upload", post(upload_workbook))
        .route("/rows/add", post(add_row))
        .route("/rows/delete", post(delete_row))
        .route("/rows/modify", post(modify_row))
        .route("/download", get(download_workbook))
        .route("/session/close", post(close_session))
        .route("/api/table", get(get_table_data))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.addr;
    let app_state = Arc::new(AppState::new(config)?);
    let app = router(app_state);

    let listener = TcpListener::bind(addr).await?;
    log::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn session_id(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string())
}

fn live_session(state: &AppState, jar: &CookieJar) -> Option<Session> {
    session_id(jar).and_then(|id| state.sessions.get(&id))
}

fn render_page(state: &AppState, status: StatusCode, context: &PageContext) -> Response {
    match page::render(&state.templates, context) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            log::error!("failed to render editor page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

fn no_session_page(state: &AppState) -> Response {
    let notice = Notice::Error(EditorError::NoSession.to_string());
    render_page(state, StatusCode::BAD_REQUEST, &PageContext::upload_only(Some(notice)))
}

async fn serve_editor(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> Response {
    let snapshot = session_id(&jar).and_then(|id| state.sessions.snapshot(&id));

    let context = match snapshot {
        Some(session) => PageContext::for_session(&session, &query),
        None => PageContext::upload_only(None),
    };
    render_page(&state, StatusCode::OK, &context)
}

async fn upload_workbook(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response {
    let loaded = match read_upload(&mut multipart).await {
        Ok((file_name, bytes)) => state
            .cache
            .get_or_load(&bytes)
            .map(|(digest, table)| (file_name, digest, table)),
        Err(e) => Err(e),
    };

    let (file_name, digest, table) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            log::warn!("upload rejected: {}", e);
            let notice = Notice::Error(e.to_string());

            // A failed upload leaves an existing session untouched
            if let Some(id) = session_id(&jar) {
                if state.sessions.update(&id, |s| s.with_notice(notice.clone())).is_ok() {
                    return Redirect::to("/").into_response();
                }
            }
            return render_page(
                &state,
                StatusCode::UNPROCESSABLE_ENTITY,
                &PageContext::upload_only(Some(notice)),
            );
        }
    };

    log::info!(
        "loaded {} ({} rows x {} columns)",
        file_name,
        table.row_count(),
        table.columns().len()
    );

    if let Some(old) = session_id(&jar) {
        state.sessions.close(&old);
    }
    let session = Session::open(file_name, digest, table);
    let id = state.sessions.open(session);

    let cookie = Cookie::build((SESSION_COOKIE, id)).path("/").http_only(true);
    (jar.add(cookie), Redirect::to("/")).into_response()
}

async fn read_upload(multipart: &mut Multipart) -> EditorResult<(String, Vec<u8>)> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(EditorError::Parse(format!("Upload failed: {}", e))),
        };

        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("").to_string();
        loader::ensure_xlsx_name(&file_name)?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| EditorError::Parse(format!("Upload failed: {}", e)))?;
        return Ok((file_name, bytes.to_vec()));
    }

    Err(EditorError::Parse("No file data received".to_string()))
}

async fn add_row(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let form = RowForm::from_pairs(pairs);
    let return_to = form.return_to();
    apply_event(&state, &jar, Event::AddRow(form.values), &return_to)
}

async fn delete_row(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let form = RowForm::from_pairs(pairs);
    let return_to = form.return_to();
    match form.index() {
        Ok(index) => apply_event(&state, &jar, Event::DeleteRow(index), &return_to),
        Err(message) => reject(&state, &jar, message, &return_to),
    }
}

async fn modify_row(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let form = RowForm::from_pairs(pairs);
    let return_to = form.return_to();
    match form.index() {
        Ok(index) => apply_event(
            &state,
            &jar,
            Event::ModifyRow {
                index,
                values: form.values,
            },
            &return_to,
        ),
        Err(message) => reject(&state, &jar, message, &return_to),
    }
}

fn apply_event(state: &AppState, jar: &CookieJar, event: Event, return_to: &str) -> Response {
    let Some(id) = session_id(jar) else {
        return no_session_page(state);
    };

    match state.sessions.update(&id, |session| session.handle(&event)) {
        Ok(()) => Redirect::to(return_to).into_response(),
        Err(_) => no_session_page(state),
    }
}

fn reject(state: &AppState, jar: &CookieJar, message: String, return_to: &str) -> Response {
    log::warn!("rejected form: {}", message);
    let Some(id) = session_id(jar) else {
        return no_session_page(state);
    };

    match state.sessions.update(&id, |session| session.with_notice(Notice::Error(message))) {
        Ok(()) => Redirect::to(return_to).into_response(),
        Err(_) => no_session_page(state),
    }
}

async fn download_workbook(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let Some(session) = live_session(&state, &jar) else {
        return no_session_page(&state);
    };

    match downloader::to_xlsx(session.table()) {
        Ok(buffer) => {
            log::info!(
                "Changes saved and ready to download: {} ({} rows)",
                session.file_name(),
                session.table().row_count()
            );
            let disposition = format!("attachment; filename=\"{}\"", DOWNLOAD_FILE_NAME);
            (
                [
                    (header::CONTENT_TYPE, XLSX_MIME.to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                buffer,
            )
                .into_response()
        }
        Err(e) => {
            log::error!("failed to export {}: {}", session.file_name(), e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse {
                    status: "error".to_string(),
                    message: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

async fn close_session(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if let Some(id) = session_id(&jar) {
        state.sessions.close(&id);
    }
    let cookie = Cookie::build(SESSION_COOKIE).path("/");
    (jar.remove(cookie), Redirect::to("/")).into_response()
}

async fn get_table_data(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> Response {
    let Some(session) = live_session(&state, &jar) else {
        return (
            StatusCode::NOT_FOUND,
            Json(StatusResponse {
                status: "error".to_string(),
                message: Some(EditorError::NoSession.to_string()),
            }),
        )
            .into_response();
    };

    let table = session.table();
    let column = query.column.unwrap_or_default();
    let value = query.value.unwrap_or_default();

    match table.filter(&column, &value) {
        Ok(view) => Json(TableResponse {
            file_name: session.file_name(),
            digest: session.digest(),
            columns: table.columns(),
            filtered: view.is_filtered(),
            rows: view
                .iter()
                .map(|(index, cells)| RowResponse { index, cells })
                .collect(),
        })
        .into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(StatusResponse {
                status: "error".to_string(),
                message: Some(e.to_string()),
            }),
        )
            .into_response(),
    }
}
