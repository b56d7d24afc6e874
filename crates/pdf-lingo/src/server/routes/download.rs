//! Generated file downloads

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::error::Result;
use crate::server::state::AppState;

/// GET /download/:filename - serve an output file as an attachment
pub async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response> {
    let data = state.store().load(&filename).await?;
    let content_type = mime_guess::from_path(&filename).first_or_octet_stream();

    tracing::debug!("Serving {} ({} bytes)", filename, data.len());

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        data,
    )
        .into_response())
}
