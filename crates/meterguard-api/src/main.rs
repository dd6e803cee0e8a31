use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use meterguard_antifraud::FraudEvaluator;
use meterguard_core::config::LayeredConfig;
use meterguard_geocode::Geocoder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meterguard_api::tasks::spawn_maintenance;
use meterguard_api::{create_router, ApiConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meterguard_api=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let api_config = ApiConfig::from_env();

    let config = LayeredConfig::load(api_config.config_path.as_deref())?;
    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        tracing::error!(
            "Remediation:\n\
            1. Check the METERGUARD_* environment variables\n\
            2. Check the file named by METERGUARD_CONFIG, if any"
        );
        return Err(e.into());
    }

    let geocoding = config.geocoding_config();
    let antifraud = config.antifraud_config();

    tracing::info!(
        port = api_config.port,
        google = geocoding.google_api_key.is_some(),
        max_allowed_distance = antifraud.max_allowed_distance,
        history_limit = antifraud.history_limit,
        "Starting MeterGuard API server"
    );
    if geocoding.google_api_key.is_none() {
        tracing::info!("No Google API key set, geocoding through Nominatim only");
    }

    let geocoder = Arc::new(Geocoder::from_config(&geocoding));
    let evaluator = Arc::new(FraudEvaluator::in_memory(geocoder, antifraud));
    let state = Arc::new(AppState::new(evaluator));

    let _maintenance = spawn_maintenance(state.clone(), &api_config);

    let cors = CorsLayer::new()
        .allow_origin(api_config.cors_origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = create_router(state).layer(cors).layer(TraceLayer::new_for_http());

    let addr = api_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("CORS enabled for {}", api_config.cors_origin);

    axum::serve(listener, app).await?;
    Ok(())
}
