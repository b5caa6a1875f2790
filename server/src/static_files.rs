//! `GET /*` and `GET /main`, both served from the same file cache.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use farm_core::FileError;

use crate::state::AppState;

pub async fn get_path(State(state): State<AppState>, Path(path): Path<String>) -> impl IntoResponse {
    serve(&state, &path)
}

pub async fn get_root(State(state): State<AppState>) -> impl IntoResponse {
    serve(&state, "")
}

pub async fn get_main(State(state): State<AppState>) -> impl IntoResponse {
    serve(&state, "RapidControl.html")
}

fn serve(state: &AppState, path: &str) -> impl IntoResponse {
    match state.files.read(path) {
        Ok(bytes) => (StatusCode::OK, (*bytes).clone()).into_response(),
        Err(FileError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg).into_response(),
        Err(FileError::Io(e)) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
