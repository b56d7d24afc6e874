//! HTTP server for the translation service

pub mod pages;
pub mod routes;
pub mod state;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use state::AppState;

/// Translation HTTP server
pub struct Server {
    config: AppConfig,
    state: AppState,
}

impl Server {
    /// Create a server backed by Gemini
    pub fn new(config: AppConfig) -> Result<Self> {
        let state = AppState::new(config.clone())?;
        Ok(Self { config, state })
    }

    /// Create a server around prepared state
    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config().clone(),
            state,
        }
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        let max_upload_size = self.config.server.max_upload_size;

        let router = Router::new()
            .route("/health", get(health_check))
            .merge(routes::page_routes(max_upload_size))
            .nest("/api", routes::api_routes(max_upload_size))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new());

        if self.config.server.enable_cors {
            router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
        } else {
            router
        }
    }

    /// Bind and serve until the process is stopped
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.router();

        tracing::info!("Starting pdf-lingo on http://{}", addr);
        tracing::info!("Outputs are written to {}", self.state.store().root().display());

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::pdf_with_pages;
    use crate::providers::LlmProvider;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "pdf-lingo-test-boundary";

    struct FixedLlm;

    #[async_trait]
    impl LlmProvider for FixedLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            if prompt.contains("detect its original language") {
                Ok(r#"{"detected_language": "German (de)", "confidence": 0.9}"#.to_string())
            } else {
                Ok("Kurze Zusammenfassung.".to_string())
            }
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "fixed"
        }

        fn model(&self) -> &str {
            "fixed-1"
        }
    }

    fn test_server() -> (Server, TempDir) {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.storage.output_dir = dir.path().join("outputs");
        config.storage.languages_path = dir.path().join("missing-languages.json");
        let state = AppState::with_provider(config, Arc::new(FixedLlm)).unwrap();
        (Server::with_state(state), dir)
    }

    fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, Vec<u8>)>) -> Body {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((filename, data)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(&data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Body::from(body)
    }

    fn post(uri: &str, body: Body) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(body)
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (server, _dir) = test_server();
        let response = server.router().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "OK");
    }

    #[tokio::test]
    async fn test_index_and_languages() {
        let (server, _dir) = test_server();

        let response = server.router().oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("enctype=\"multipart/form-data\""));

        let response = server.router().oneshot(get("/api/languages")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let languages: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(languages[0]["code"], "en");
    }

    #[tokio::test]
    async fn test_info_reports_model() {
        let (server, _dir) = test_server();
        let response = server.router().oneshot(get("/api/info")).await.unwrap();
        let info: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(info["name"], "pdf-lingo");
        assert_eq!(info["llm"]["model"], "fixed-1");
        assert_eq!(info["llm"]["healthy"], true);
    }

    #[tokio::test]
    async fn test_download_missing_file() {
        let (server, _dir) = test_server();
        let response = server.router().oneshot(get("/download/nothing.pdf")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_string(response).await.contains("File not found"));
    }

    #[tokio::test]
    async fn test_process_api_and_download() {
        let (server, _dir) = test_server();
        let pdf = pdf_with_pages(&[b"BT /F1 12 Tf 72 700 Td (Guten Tag) Tj ET"]);
        let body = multipart_body(
            &[("target_language", "German"), ("outputs", "summary"), ("summary_format", "txt")],
            Some(("my letter.pdf", pdf)),
        );

        let response = server.router().oneshot(post("/api/process", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let result: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(result["detected_language"], "German (de)");
        assert_eq!(result["summary"], "Kurze Zusammenfassung.");
        assert_eq!(result["files"][0]["label"], "Summary (TXT)");
        assert_eq!(result["files"][0]["filename"], "my_letter_summary.txt");

        let response = server
            .router()
            .oneshot(get("/download/my_letter_summary.txt"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
        assert!(disposition.starts_with("attachment"));
        assert_eq!(body_string(response).await, "Kurze Zusammenfassung.");
    }

    #[tokio::test]
    async fn test_process_form_renders_html() {
        let (server, _dir) = test_server();
        let pdf = pdf_with_pages(&[b"BT /F1 12 Tf 72 700 Td (Guten Tag) Tj ET"]);
        let body = multipart_body(&[], Some(("brief.pdf", pdf)));

        let response = server.router().oneshot(post("/", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_string(response).await;
        assert!(page.contains("German (de)"));
        assert!(page.contains("No files generated."));
    }

    #[tokio::test]
    async fn test_process_requires_file() {
        let (server, _dir) = test_server();
        let body = multipart_body(&[("outputs", "json")], None);
        let response = server.router().oneshot(post("/api/process", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = multipart_body(&[], Some(("broken.pdf", b"not a pdf".to_vec())));
        let response = server.router().oneshot(post("/api/process", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
