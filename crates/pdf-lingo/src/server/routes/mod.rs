//! Routes for the translation server

pub mod download;
pub mod process;

use axum::{
    extract::{DefaultBodyLimit, State},
    response::Html,
    routing::{get, post},
    Json, Router,
};

use crate::server::pages;
use crate::server::state::AppState;
use crate::types::Language;

/// Browser-facing routes: upload form, result page, downloads
pub fn page_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(index)
                .post(process::process_form)
                .layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/download/:filename", get(download::download_file))
}

/// JSON API routes, nested under `/api`
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/process",
            post(process::process_api).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/languages", get(languages))
        .route("/info", get(info))
}

/// GET / - upload form
async fn index(State(state): State<AppState>) -> Html<String> {
    Html(pages::index_page(state.languages()))
}

/// GET /api/languages - selectable target languages
async fn languages(State(state): State<AppState>) -> Json<Vec<Language>> {
    Json(state.languages().languages().to_vec())
}

/// GET /api/info - service info
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let llm = state.processor().llm();
    let healthy = llm.health_check().await.unwrap_or_else(|e| {
        tracing::warn!("{} health check failed: {}", llm.name(), e);
        false
    });

    Json(serde_json::json!({
        "name": "pdf-lingo",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "PDF language detection, translation, JSON extraction and summaries",
        "llm": {
            "provider": llm.name(),
            "model": llm.model(),
            "healthy": healthy,
        },
        "endpoints": {
            "GET /": "Upload form",
            "POST /": "Process a PDF and render the result page",
            "POST /api/process": "Process a PDF and return JSON",
            "GET /download/:filename": "Download a generated file",
            "GET /api/languages": "List target languages",
            "GET /api/info": "Service info",
            "GET /health": "Health check"
        },
        "outputs": {
            "json": "{stem}_output.json",
            "pdf": "{stem}_translated.pdf",
            "summary": "{stem}_summary.txt or {stem}_summary.pdf"
        },
        "max_upload_size": state.config().server.max_upload_size,
    }))
}
