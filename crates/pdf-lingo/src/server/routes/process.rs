//! Upload processing endpoints

use axum::{
    extract::{Multipart, State},
    response::Html,
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::pages;
use crate::server::state::AppState;
use crate::storage::secure_filename;
use crate::types::{
    CustomInstructions, OutputKind, ProcessRequest, ProcessResponse, SummaryFormat, UploadedPdf,
};

/// Read the upload form into an upload and processing options
pub(crate) async fn read_form(mut multipart: Multipart) -> Result<(UploadedPdf, ProcessRequest)> {
    let mut request = ProcessRequest::default();
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        Error::InvalidRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            let original = field.file_name().unwrap_or("").to_string();
            let data = field.bytes().await.map_err(|e| {
                Error::InvalidRequest(format!("Failed to read file: {}", e))
            })?;
            if original.is_empty() && data.is_empty() {
                continue;
            }

            let filename = secure_filename(&original)
                .unwrap_or_else(|| format!("upload_{}.pdf", Uuid::new_v4()));
            tracing::info!("Received upload: {} ({} bytes)", filename, data.len());
            upload = Some(UploadedPdf::new(filename, data));
            continue;
        }

        let value = field.text().await.map_err(|e| {
            Error::InvalidRequest(format!("Failed to read field '{}': {}", name, e))
        })?;

        match name.as_str() {
            "target_language" => {
                if !value.trim().is_empty() {
                    request.target_language = value.trim().to_string();
                }
            }
            "outputs" => match OutputKind::from_form_value(&value) {
                Some(kind) => request.select(kind),
                None => tracing::warn!("Ignoring unknown output '{}'", value),
            },
            "summary_format" => request.summary_format = SummaryFormat::from_form_value(&value),
            "custom_json_instructions" => request.custom.json = CustomInstructions::normalize(value),
            "custom_pdf_instructions" => request.custom.pdf = CustomInstructions::normalize(value),
            "custom_summary_instructions" => {
                request.custom.summary = CustomInstructions::normalize(value)
            }
            other => tracing::debug!("Ignoring form field '{}'", other),
        }
    }

    let upload = upload.ok_or_else(|| Error::InvalidRequest("No file uploaded".to_string()))?;
    Ok((upload, request))
}

/// POST / - process the form and render the result page
pub async fn process_form(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Html<String>> {
    let (upload, request) = read_form(multipart).await?;
    let response = state.processor().process(&upload, &request).await?;
    Ok(Html(pages::result_page(&response)))
}

/// POST /api/process - process the form and return JSON
pub async fn process_api(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ProcessResponse>> {
    let (upload, request) = read_form(multipart).await?;
    let response = state.processor().process(&upload, &request).await?;
    Ok(Json(response))
}
