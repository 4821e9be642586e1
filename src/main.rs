// src/main.rs

use std::sync::Arc;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use oralex::audit::AuditLog;
use oralex::config::AppConfig;
use oralex::llm::{CompletionApi, OpenAiGateway};
use oralex::speech::SpeechClient;
use oralex::store::SqliteLogStore;
use oralex::web::{create_router, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();

    let level = config.log_level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting oral-exam backend");

    // Database pool + schema
    let pool = SqlitePoolOptions::new()
        .max_connections(config.sqlite_max_connections)
        .connect(&config.database_url)
        .await?;
    let store = SqliteLogStore::new(pool);
    store.run_migrations().await?;

    // Completion gateway: provider selection happens once, here.
    let gateway = Arc::new(OpenAiGateway::from_config(&config)?);
    info!(
        "Completion gateway ready: model {}, {} endpoint",
        gateway.model_id(),
        if config.has_managed_endpoint() { "managed" } else { "direct" }
    );

    let speech = SpeechClient::from_config(&config)?.map(Arc::new);
    if speech.is_none() {
        info!("No OPENAI_API_KEY set; STT/TTS endpoints disabled");
    }

    let audit = Arc::new(AuditLog::new(&config.audit_log_path));
    let state = AppState::new(gateway, Arc::new(store), audit, speech);

    let app = create_router(state);
    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on http://{bind_address}");

    axum::serve(listener, app).await?;
    Ok(())
}
