//! HTTP API Server for Recommendations
//!
//! Form endpoints for looking up and creating users, plus the recommendation
//! endpoint the browser script polls. Pages themselves are static assets.

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect},
    routing::{get, post},
    Form, Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ApiConfig;
use crate::error::Error;
use crate::recommendation::interests::DropdownOptions;
use crate::recommendation::{
    InterestKind, InterestSelection, Message, Recommendation, RecommendationEngine,
    RecommendationSource, Strategy,
};

/// Shared application state
pub struct AppState {
    pub engine: RecommendationEngine,
}

/// Form body for the existing-user lookup
#[derive(Debug, Deserialize)]
pub struct SearchUserForm {
    pub user_id: Option<String>,
}

/// Strategy selection, from the query string or the form body
#[derive(Debug, Default, Deserialize)]
pub struct RecommendationsQuery {
    pub strategy: Option<String>,
    pub limit: Option<usize>,
}

/// Parsed new-user form.
///
/// The form repeats `genres`, `actors` and `directors` once per selected option.
#[derive(Debug, Default, PartialEq)]
pub struct NewUserForm {
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub interests: InterestSelection,
}

impl NewUserForm {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "user_id" => form.user_id = Some(value),
                "name" => form.name = Some(value),
                other => {
                    if let Some(kind) = InterestKind::ALL.into_iter().find(|k| k.field() == other) {
                        form.interests.get_mut(kind).push(value);
                    }
                }
            }
        }
        form
    }
}

#[derive(Debug, Serialize)]
pub struct StrategyInfo {
    pub name: Strategy,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub default_strategy: Strategy,
    pub strategies: Vec<StrategyInfo>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub graph: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UserFormResponse {
    pub options: DropdownOptions,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub user_id: i64,
    pub strategy: Strategy,
    pub strategy_label: String,
    pub source: RecommendationSource,
    pub recommendations: Vec<Recommendation>,
    pub messages: Vec<Message>,
}

/// Build the application router
pub fn router(state: Arc<AppState>, config: &ApiConfig) -> Router {
    let mut app = Router::new()
        .route("/", get(index))
        .route("/ping", get(ping))
        .route("/health", get(health_check))
        .route("/search_user", post(search_user))
        .route("/user", get(new_user_form).post(create_user))
        .route(
            "/recommendations/:user_id",
            get(get_recommendations).post(post_recommendations),
        )
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .with_state(state)
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    if config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Start the API server
pub async fn start_server(
    state: Arc<AppState>,
    config: &ApiConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = router(state, config);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting recommendation API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

async fn index(State(state): State<Arc<AppState>>) -> Json<IndexResponse> {
    Json(IndexResponse {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        default_strategy: state.engine.config().default_strategy,
        strategies: Strategy::ALL
            .into_iter()
            .map(|name| StrategyInfo {
                name,
                label: name.label(),
            })
            .collect(),
    })
}

async fn ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.engine.store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                version: env!("CARGO_PKG_VERSION"),
                graph: "up",
            }),
        ),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded",
                    version: env!("CARGO_PKG_VERSION"),
                    graph: "down",
                }),
            )
        }
    }
}

/// Look up an existing user and send the browser to their recommendations
async fn search_user(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SearchUserForm>,
) -> Result<Redirect, Error> {
    let user_id = parse_user_id(form.user_id.as_deref())?;

    if !state.engine.check_user_exists(user_id).await? {
        return Err(Error::UserNotFound { user_id });
    }

    info!("User {} found, redirecting to recommendations", user_id);
    Ok(Redirect::to(&format!("/recommendations/{}", user_id)))
}

/// Options for the new-user form
async fn new_user_form(State(state): State<Arc<AppState>>) -> Json<UserFormResponse> {
    let (options, messages) = state.engine.interests().dropdown_options().await;
    Json(UserFormResponse { options, messages })
}

/// Create a user from the form and continue with interest-based recommendations
async fn create_user(
    State(state): State<Arc<AppState>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Redirect, Error> {
    let form = NewUserForm::from_pairs(pairs);
    let user_id = parse_user_id(form.user_id.as_deref())?;
    let interests = state.engine.interests();

    interests.create_user(user_id, form.name.as_deref()).await?;
    let linked = interests.add_interests(user_id, &form.interests).await?;
    info!(
        "Created user {} with interests: genres={:?}, actors={:?}, directors={:?}",
        user_id, linked.genres, linked.actors, linked.directors
    );

    Ok(Redirect::to(&format!(
        "/recommendations/{}?strategy={}",
        user_id,
        Strategy::Interest
    )))
}

async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(query): Query<RecommendationsQuery>,
) -> Result<Json<RecommendationsResponse>, Error> {
    recommendations(&state, user_id, query).await
}

/// Form submissions take the strategy from the body, then the query string.
/// A missing or unreadable body leaves the query string in charge.
async fn post_recommendations(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(query): Query<RecommendationsQuery>,
    form: Option<Form<RecommendationsQuery>>,
) -> Result<Json<RecommendationsResponse>, Error> {
    let form = form.map(|Form(form)| form).unwrap_or_default();
    let merged = RecommendationsQuery {
        strategy: non_blank(form.strategy).or(non_blank(query.strategy)),
        limit: form.limit.or(query.limit),
    };
    recommendations(&state, user_id, merged).await
}

async fn recommendations(
    state: &AppState,
    user_id: i64,
    query: RecommendationsQuery,
) -> Result<Json<RecommendationsResponse>, Error> {
    let engine = &state.engine;
    let strategy = match non_blank(query.strategy) {
        Some(name) => name.parse::<Strategy>()?,
        None => engine.config().default_strategy,
    };
    let limit = engine.effective_limit(query.limit);

    let outcome = engine.recommend(user_id, strategy, limit).await.map_err(|e| {
        error!(
            "Error generating recommendations for user {} (strategy: {}): {}",
            user_id, strategy, e
        );
        e
    })?;

    Ok(Json(RecommendationsResponse {
        user_id: outcome.user_id,
        strategy: outcome.strategy,
        strategy_label: outcome.strategy.label(),
        source: outcome.source,
        recommendations: outcome.items,
        messages: outcome.messages,
    }))
}

/// A user id must be a positive integer
fn parse_user_id(raw: Option<&str>) -> Result<i64, Error> {
    raw.map(str::trim)
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| Error::bad_request("User ID is required"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
