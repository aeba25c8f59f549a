use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use shared_models::AppError;
use swarm_domain::{
    AppointmentRequest, CampaignResponse, ConfirmRequest, ConfirmResponse, CreateCampaignResponse,
    ProviderPreview, ProviderSearchRequest, ProviderSearchResponse,
};

use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "scheduling swarm is running" }))
        .route("/health", get(health))
        .route("/campaigns", post(create_campaign))
        .route("/campaigns/:id", get(get_campaign))
        .route("/campaigns/:id/confirm", post(confirm_slot))
        .route("/providers/search", get(search_providers))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Creates a campaign and spawns the manager to drive it to a terminal
/// status in the background. Returns immediately with the initial status
/// and the effective call mode so callers can decide how long to poll.
async fn create_campaign(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AppointmentRequest>,
) -> Result<(StatusCode, Json<CreateCampaignResponse>), AppError> {
    if request.date_range_end <= request.date_range_start {
        return Err(AppError::BadRequest(
            "date_range_end must be after date_range_start".to_string(),
        ));
    }
    if request.duration_min <= 0 {
        return Err(AppError::BadRequest(
            "duration_min must be positive".to_string(),
        ));
    }

    let effective_mode = swarm_manager::resolve_call_mode(request.call_mode, &state.config);
    let campaign = state.store.create_campaign(request).await;

    let manager = state.manager.clone();
    let campaign_id = campaign.campaign_id.clone();
    tokio::spawn(async move {
        manager.run_campaign(&campaign_id).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateCampaignResponse {
            campaign_id: campaign.campaign_id,
            status: campaign.status,
            call_mode: effective_mode.as_str().to_string(),
        }),
    ))
}

async fn get_campaign(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<String>,
) -> Result<Json<CampaignResponse>, AppError> {
    let campaign = state
        .store
        .get_campaign(&campaign_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("campaign {} not found", campaign_id)))?;
    Ok(Json(CampaignResponse::from(&campaign)))
}

async fn confirm_slot(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<String>,
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<ConfirmResponse>, AppError> {
    use swarm_manager::ConfirmError;

    state
        .manager
        .confirm_slot(&campaign_id, req)
        .await
        .map(Json)
        .map_err(|e| match e {
            ConfirmError::CampaignNotFound(id) => {
                AppError::NotFound(format!("campaign {} not found", id))
            }
            ConfirmError::SlotNotRanked => {
                AppError::BadRequest("requested slot is not among this campaign's ranked offers".to_string())
            }
            ConfirmError::SlotConflict => {
                AppError::Conflict("slot is no longer free".to_string())
            }
            ConfirmError::CalendarUnavailable => {
                AppError::CalendarUnavailable("calendar service unavailable".to_string())
            }
        })
}

async fn search_providers(
    State(state): State<Arc<AppState>>,
    Query(req): Query<ProviderSearchRequest>,
) -> Result<Json<ProviderSearchResponse>, AppError> {
    let directory = state.manager.directory();
    let distance = state.manager.distance();

    let mut providers = directory
        .search(&req.service, &req.location, req.lat, req.lng)
        .await
        .map_err(|e| AppError::ExternalService(e.to_string()))?;
    providers.truncate(req.max_providers.max(1));

    let mut previews = Vec::with_capacity(providers.len());
    for provider in providers {
        let minutes = distance.estimate_travel_minutes(&req.location, &provider).await;
        if req.max_travel_minutes > 0 && minutes > req.max_travel_minutes {
            continue;
        }
        previews.push(ProviderPreview::from_provider(provider, minutes));
    }
    previews.sort_by_key(|p| p.travel_minutes);

    Ok(Json(ProviderSearchResponse { providers: previews }))
}
