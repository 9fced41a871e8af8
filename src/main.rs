use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use clap::Parser;
use movierec::{init_tracing, AppState, Config, RawId, RecError, RecommendationResponse};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Serve movie recommendations over HTTP", long_about = None)]
struct Args {
    /// Configuration file; built-in defaults are used when it does not exist.
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,
}

#[derive(Debug, Deserialize)]
struct RecommendationQuery {
    k: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    message: String,
}

impl<T> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: "Success".to_string(),
        }
    }

    fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message,
        }
    }
}

type ApiError = (StatusCode, Json<ApiResponse<()>>);

fn api_error(err: RecError) -> ApiError {
    let status = match &err {
        RecError::UnknownId { .. } => StatusCode::NOT_FOUND,
        RecError::InvalidK(_) => StatusCode::BAD_REQUEST,
        _ => {
            error!("Failed to get recommendations: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ApiResponse::error(err.to_string())))
}

async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HashMap<String, String>>> {
    let mut status = HashMap::new();
    status.insert("status".to_string(), "healthy".to_string());
    status.insert("service".to_string(), "movierec".to_string());
    status.insert("version".to_string(), env!("CARGO_PKG_VERSION").to_string());
    status.insert(
        "strategy".to_string(),
        state.ranking_service.strategy().to_string(),
    );
    status.insert(
        "default_k".to_string(),
        state.config.recommendation.default_k.to_string(),
    );

    Json(ApiResponse::success(status))
}

async fn get_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<RawId>,
    Query(params): Query<RecommendationQuery>,
) -> Result<Json<ApiResponse<RecommendationResponse>>, ApiError> {
    let service = &state.ranking_service;
    let result = match params.k {
        Some(k) => service.recommend_checked(user_id, k),
        None => service
            .recommend_default(user_id)
            .map(|recommendations| RecommendationResponse::new(user_id, recommendations)),
    };

    result
        .map(|response| Json(ApiResponse::success(response)))
        .map_err(api_error)
}

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/recommendations/:user_id", get(get_recommendations))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, using default configuration");
        Config::default()
    };
    info!("Starting MovieRec server with config: {:?}", config.server);

    let addr = config.server.socket_addr()?;
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.server.workers)
        .build_global()?;

    // Training runs to completion before the listener is bound.
    let (state, report) = tokio::task::spawn_blocking(move || AppState::new(config)).await??;
    info!(
        "Model ready: strategy {}, training rmse {:.4}, took {:?}",
        report.strategy, report.training_rmse, report.elapsed
    );

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use movierec::algorithms::Strategy;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app(strategy: Strategy) -> Router {
        let mut config = Config::default();
        config.model.strategy = strategy;
        config.model.seed = Some(7);
        let (state, _) = AppState::new(config).unwrap();
        create_router(state)
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found_for_embedding_network() {
        let (status, body) = get(app(Strategy::EmbeddingNetwork), "/recommendations/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_non_positive_k_is_bad_request() {
        let (status, body) = get(app(Strategy::Factorization), "/recommendations/1?k=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _) = get(app(Strategy::Factorization), "/recommendations/1?k=-2").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_user_gets_empty_list_for_factorization() {
        let (status, body) = get(app(Strategy::Factorization), "/recommendations/999").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["user_id"], 999);
        assert_eq!(body["data"]["recommendations"], Value::Array(Vec::new()));
    }

    #[tokio::test]
    async fn test_missing_k_falls_back_to_configured_default() {
        let (status, body) = get(app(Strategy::Factorization), "/recommendations/1").await;
        assert_eq!(status, StatusCode::OK);
        // The bundled sample has three movies, fewer than the default k.
        assert_eq!(body["data"]["recommendations"].as_array().unwrap().len(), 3);

        let (status, body) = get(app(Strategy::Factorization), "/recommendations/1?k=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["recommendations"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_health_reports_strategy() {
        let (status, body) = get(app(Strategy::EmbeddingNetwork), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["strategy"], "embedding_network");
    }
}
