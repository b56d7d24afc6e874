//! Translation server binary
//!
//! Run with: cargo run -p pdf-lingo --bin pdf-lingo-server

use pdf_lingo::{AppConfig, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_lingo=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Model: {}", config.llm.model);
    tracing::info!("  - Output directory: {}", config.storage.output_dir.display());
    tracing::info!("  - Languages: {}", config.storage.languages_path.display());
    tracing::info!("  - Max upload: {} bytes", config.server.max_upload_size);

    let server = Server::new(config)?;

    println!("\nServer starting...");
    println!("  Upload form: http://{}/", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/process         - Process a PDF (multipart)");
    println!("  GET  /download/<filename> - Download a generated file");
    println!("  GET  /api/languages       - Target languages");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
