//! List the Gemini models available to the configured API key
//!
//! Run with: cargo run -p pdf-lingo --bin pdf-lingo-models

use pdf_lingo::{AppConfig, GeminiClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_lingo=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    let api_key = config.require_api_key()?.to_string();
    let client = GeminiClient::new(&config.llm, api_key)?;

    let models = client.list_models().await?;
    println!("{} models available:\n", models.len());

    for model in models {
        println!("{}", model.name);
        if let Some(display_name) = &model.display_name {
            println!("  Name: {}", display_name);
        }
        if let Some(description) = &model.description {
            println!("  Description: {}", description);
        }
        if let Some(limit) = model.input_token_limit {
            println!("  Input token limit: {}", limit);
        }
        if let Some(limit) = model.output_token_limit {
            println!("  Output token limit: {}", limit);
        }
        if !model.supported_generation_methods.is_empty() {
            println!(
                "  Methods: {}",
                model.supported_generation_methods.join(", ")
            );
        }
        println!();
    }

    Ok(())
}
