//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{ChatCompletionAdapter, DbAdapter, LlmJobMarketAdapter},
    config::Config,
    error::ApiError,
    web::{router, state::AppState, ApiDoc},
};
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderName, Method,
};
use axum::Router;
use learning_path_core::{
    GenerationSettings, JobMarketService, LearningPathPlanner, StructuredGenerator,
    TextCompletionProvider,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    info!(
        provider = %config.provider.kind,
        model = %config.provider.model,
        "Using model provider"
    );
    let completion: Arc<dyn TextCompletionProvider> = Arc::new(
        ChatCompletionAdapter::from_provider(&config.provider, config.max_tokens),
    );
    let job_market: Arc<dyn JobMarketService> = Arc::new(LlmJobMarketAdapter::new(
        completion.clone(),
        config.temperature,
    ));

    let generator = StructuredGenerator::new(
        completion,
        GenerationSettings {
            call_timeout: Some(config.model_timeout),
            ..GenerationSettings::default()
        },
    );
    let planner = Arc::new(LearningPathPlanner::new(
        generator,
        job_market.clone(),
        config.default_region.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        planner,
        repository: db_adapter,
        job_market,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT, HeaderName::from_static("x-user-id")]);

    // --- 5. Create the Web Router ---
    let app = Router::new()
        .merge(router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
