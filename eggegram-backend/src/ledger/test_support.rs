//! Local stand-ins for Google endpoints, served with axum on 127.0.0.1:0.

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::get;
use axum::Json;
use egg_ledger_types::ValueRange;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

pub const FAKE_TOKEN: &str = "test-token";

/// Serve `app` on an ephemeral port and return its base URL.
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{}", addr)
}

/// One spreadsheet tab behind a minimal Sheets v4 `values` API.
#[derive(Clone, Default)]
pub struct FakeSheet {
    values: Arc<Mutex<Vec<Vec<Value>>>>,
    requests: Arc<Mutex<Vec<String>>>,
    failure: Arc<Mutex<Option<u16>>>,
}

impl FakeSheet {
    pub fn with_values(values: Vec<Vec<Value>>) -> Self {
        let sheet = Self::default();
        *sheet.values.lock() = values;
        sheet
    }

    pub fn values(&self) -> Vec<Vec<Value>> {
        self.values.lock().clone()
    }

    /// `METHOD range` for every authorized request, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    /// Answer every subsequent request with this HTTP status.
    pub fn fail_with(&self, status: u16) {
        *self.failure.lock() = Some(status);
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route(
                "/spreadsheets/:id/values/:range",
                get(get_values).put(update_values).post(append_values),
            )
            .with_state(self.clone())
    }

    fn admit(&self, headers: &HeaderMap, method: &str, range: &str) -> Result<(), StatusCode> {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let expected = format!("Bearer {}", FAKE_TOKEN);
        if bearer != Some(expected.as_str()) {
            return Err(StatusCode::UNAUTHORIZED);
        }
        if let Some(status) = *self.failure.lock() {
            return Err(StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR));
        }
        self.requests.lock().push(format!("{} {}", method, range));
        Ok(())
    }
}

async fn get_values(
    State(sheet): State<FakeSheet>,
    headers: HeaderMap,
    Path((_id, range)): Path<(String, String)>,
) -> Result<Json<ValueRange>, StatusCode> {
    sheet.admit(&headers, "GET", &range)?;
    Ok(Json(ValueRange::rows(range, sheet.values())))
}

async fn update_values(
    State(sheet): State<FakeSheet>,
    headers: HeaderMap,
    Path((id, range)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<ValueRange>,
) -> Result<Json<Value>, StatusCode> {
    sheet.admit(&headers, "PUT", &range)?;
    if params.get("valueInputOption").map(String::as_str) != Some("RAW") {
        return Err(StatusCode::BAD_REQUEST);
    }

    let (col, row) = parse_cell(&range).ok_or(StatusCode::BAD_REQUEST)?;
    let value = body
        .values
        .first()
        .and_then(|r| r.first())
        .cloned()
        .ok_or(StatusCode::BAD_REQUEST)?;

    let mut grid = sheet.values.lock();
    while grid.len() < row {
        grid.push(Vec::new());
    }
    let cells = &mut grid[row - 1];
    while cells.len() <= col {
        cells.push(json!(""));
    }
    cells[col] = value;

    Ok(Json(json!({
        "spreadsheetId": id,
        "updatedRange": range,
        "updatedRows": 1,
        "updatedCells": 1,
    })))
}

async fn append_values(
    State(sheet): State<FakeSheet>,
    headers: HeaderMap,
    Path((id, range)): Path<(String, String)>,
    Json(body): Json<ValueRange>,
) -> Result<Json<Value>, StatusCode> {
    sheet.admit(&headers, "POST", &range)?;
    let table = range.strip_suffix(":append").ok_or(StatusCode::NOT_FOUND)?;

    let added = body.values.len();
    sheet.values.lock().extend(body.values);

    Ok(Json(json!({
        "spreadsheetId": id,
        "tableRange": table,
        "updates": { "updatedRange": table, "updatedRows": added },
    })))
}

/// `'Tab'!B3` -> (1, 3). Single-letter columns only.
fn parse_cell(range: &str) -> Option<(usize, usize)> {
    let cell = range.rsplit('!').next()?;
    let mut chars = cell.chars();
    let letter = chars.next().filter(|c| c.is_ascii_uppercase())?;
    let row: usize = chars.as_str().parse().ok().filter(|r| *r > 0)?;
    Some(((letter as u8 - b'A') as usize, row))
}
