//! HTTP Endpoints
//!
//! REST API for campaign analysis and segment activation, all under
//! `/api/v1`.

use std::time::Duration;

use axum::{
    extract::{Json, Path, Query, State},
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use aether_core::{
    CampaignAnalysis, CampaignIntent, FilterPreview, ManualFilters, SegmentMetadata,
    SegmentResponse,
};

use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(&state.settings.server.cors_origins);
    let timeout = Duration::from_secs(state.settings.server.timeout_seconds);

    Router::new()
        .route("/", get(index))
        // Health check
        .route("/api/v1/health", get(health_check))
        // Campaign analysis
        .route("/api/v1/campaigns/analyze", post(analyze_campaign))
        // Segment endpoints
        .route("/api/v1/segments/create", post(create_segment))
        .route(
            "/api/v1/segments/:segment_id/customers",
            get(get_segment_customers),
        )
        .route(
            "/api/v1/segments/:segment_id/metadata",
            get(get_segment_metadata),
        )
        .route(
            "/api/v1/segments/preview-filters",
            post(preview_filter_impact),
        )
        // Trigger recommendations
        .route("/api/v1/triggers/suggestions", post(get_trigger_suggestions))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - A `*` entry allows any origin (development only)
/// - No origins configured defaults to localhost:3000 for safety
/// - Otherwise, uses the configured origins
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    const METHODS: [Method; 3] = [Method::GET, Method::POST, Method::OPTIONS];
    const HEADERS: [header::HeaderName; 2] = [header::CONTENT_TYPE, header::AUTHORIZATION];

    if origins.iter().any(|origin| origin == "*") {
        tracing::warn!("CORS allows any origin (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    if origins.is_empty() {
        tracing::info!("No CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods(METHODS)
            .allow_headers(HEADERS);
    }

    // Parse configured origins
    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::error!("All configured CORS origins are invalid, falling back to localhost");
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods(METHODS)
            .allow_headers(HEADERS);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods(METHODS)
        .allow_headers(HEADERS)
        .allow_credentials(true)
}

/// Body for `/campaigns/analyze` and `/triggers/suggestions`
#[derive(Debug, Deserialize)]
struct CampaignObjectiveRequest {
    objective: String,
}

/// Body for `/segments/create`
#[derive(Debug, Deserialize)]
struct SegmentCreateRequest {
    campaign_objective: String,
    #[serde(default)]
    override_trigger: Option<String>,
    #[serde(default)]
    additional_filters: Option<ManualFilters>,
}

/// Body for `/segments/preview-filters`; takes the already-interpreted
/// intent so repeated previews skip re-interpretation
#[derive(Debug, Deserialize)]
struct FilterPreviewRequest {
    campaign_objective_object: CampaignIntent,
    #[serde(default)]
    new_filters: ManualFilters,
    #[serde(default)]
    selected_trigger: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomerListParams {
    limit: Option<usize>,
}

/// Service descriptor
async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "AetherSegment AI",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "AI-first customer data platform for objective-driven micro-segmentation",
        "endpoints": {
            "health": "GET /api/v1/health",
            "analyze_campaign": "POST /api/v1/campaigns/analyze",
            "create_segment": "POST /api/v1/segments/create",
            "get_customers": "GET /api/v1/segments/{segment_id}/customers",
            "get_metadata": "GET /api/v1/segments/{segment_id}/metadata",
            "trigger_suggestions": "POST /api/v1/triggers/suggestions",
            "preview_filters": "POST /api/v1/segments/preview-filters",
        },
    }))
}

/// Health check
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "AetherSegment AI",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Analyze a campaign objective into structured intent, a segment preview,
/// and ranked trigger suggestions
async fn analyze_campaign(
    State(state): State<AppState>,
    Json(request): Json<CampaignObjectiveRequest>,
) -> Result<Json<CampaignAnalysis>, ServerError> {
    let analysis = state
        .orchestrator
        .analyze_campaign(&request.objective)
        .await?;
    Ok(Json(analysis))
}

/// Create a full segment and cache it for follow-up reads
async fn create_segment(
    State(state): State<AppState>,
    Json(request): Json<SegmentCreateRequest>,
) -> Result<Json<SegmentResponse>, ServerError> {
    let response = state
        .orchestrator
        .create_segment(
            &request.campaign_objective,
            request.override_trigger.as_deref(),
            request.additional_filters.as_ref(),
        )
        .await?;
    Ok(Json(response))
}

/// Customer list of a cached segment, optionally capped via `?limit=`
async fn get_segment_customers(
    State(state): State<AppState>,
    Path(segment_id): Path<String>,
    Query(params): Query<CustomerListParams>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let customers = state
        .orchestrator
        .segment_customers(&segment_id, params.limit)?;

    Ok(Json(serde_json::json!({
        "segment_id": segment_id,
        "count": customers.len(),
        "customers": customers,
    })))
}

/// Metadata of a cached segment
async fn get_segment_metadata(
    State(state): State<AppState>,
    Path(segment_id): Path<String>,
) -> Result<Json<SegmentMetadata>, ServerError> {
    let metadata = state.orchestrator.segment_metadata(&segment_id)?;
    Ok(Json(metadata))
}

/// Ranked trigger recommendations for an objective
async fn get_trigger_suggestions(
    State(state): State<AppState>,
    Json(request): Json<CampaignObjectiveRequest>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let triggers = state
        .orchestrator
        .suggest_triggers(&request.objective)
        .await?;
    Ok(Json(serde_json::json!({ "triggers": triggers })))
}

/// Funnel impact of manual filters without creating a segment
async fn preview_filter_impact(
    State(state): State<AppState>,
    Json(request): Json<FilterPreviewRequest>,
) -> Result<Json<FilterPreview>, ServerError> {
    let preview = state
        .orchestrator
        .preview_filter_impact(
            &request.campaign_objective_object,
            &request.new_filters,
            request.selected_trigger.as_deref(),
        )
        .await?;
    Ok(Json(preview))
}
