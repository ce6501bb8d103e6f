//! Roll ranking HTTP API
//!
//! Serves ranking queries from one lazily loaded [`RankingEngine`] and,
//! optionally, the statistics document itself as a static asset.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rollrank::{
    BestPerkChange, EngineLoader, FileStatsSource, HttpStatsSource, ItemHash, LoadError, PerkRank,
    RankingEngine, RatingTier, ReviewSummary, RollStatistics, StatsSource, TraitComboRank,
    TraitComboSummary, WeaponRankingData, WeaponRoll,
};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;

// =============================================================================
// Stats origin
// =============================================================================

/// Where the server reads its statistics document from
#[derive(Debug, Clone)]
pub enum StatsOrigin {
    Http(HttpStatsSource),
    File(FileStatsSource),
}

impl StatsSource for StatsOrigin {
    fn describe(&self) -> String {
        match self {
            Self::Http(source) => source.describe(),
            Self::File(source) => source.describe(),
        }
    }

    async fn fetch(&self) -> Result<RollStatistics, LoadError> {
        match self {
            Self::Http(source) => source.fetch().await,
            Self::File(source) => source.fetch().await,
        }
    }
}

// =============================================================================
// App State
// =============================================================================

pub struct AppState {
    pub loader: EngineLoader<StatsOrigin>,
}

impl AppState {
    async fn engine(&self) -> Arc<RankingEngine> {
        self.loader.get().await
    }
}

// =============================================================================
// Errors
// =============================================================================

/// JSON error body: `{"error": "..."}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn hash_param(value: &str, what: &str) -> Result<ItemHash, ApiError> {
    rollrank::parse_hash(value).ok_or_else(|| ApiError::bad_request(format!("Invalid {}: {}", what, value)))
}

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    loaded: bool,
}

#[derive(Deserialize)]
pub struct WeaponQuery {
    /// Comma separated perk hashes in column order
    perks: Option<String>,
    mw: Option<String>,
}

#[derive(Deserialize)]
pub struct ComboQuery {
    a: Option<String>,
    b: Option<String>,
}

#[derive(Deserialize)]
pub struct TopCombosQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    #[serde(flatten)]
    summary: ReviewSummary,
    pve_rating: RatingTier,
    pvp_rating: RatingTier,
    overall_rating: RatingTier,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppraisalResponse {
    ranking: WeaponRankingData,
    best_perks: Vec<BestPerkChange>,
}

// =============================================================================
// Handlers
// =============================================================================

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        loaded: state.loader.is_loaded(),
    })
}

async fn weapon_data(
    State(state): State<Arc<AppState>>,
    AxumPath(weapon): AxumPath<String>,
    Query(query): Query<WeaponQuery>,
) -> ApiResult<WeaponRankingData> {
    let weapon = hash_param(&weapon, "weapon hash")?;
    let perks = query
        .perks
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| hash_param(s, "perk hash"))
        .collect::<Result<Vec<_>, _>>()?;
    let mw = query
        .mw
        .as_deref()
        .map(|s| hash_param(s, "masterwork hash"))
        .transpose()?;

    let engine = state.engine().await;
    if !engine.has_data_for_weapon(weapon) {
        return Err(ApiError::not_found(format!("No ranking data for weapon {}", weapon)));
    }

    Ok(Json(engine.get_weapon_data(weapon, &perks, mw)))
}

async fn perk_rank(
    State(state): State<Arc<AppState>>,
    AxumPath((weapon, perk)): AxumPath<(String, String)>,
) -> ApiResult<PerkRank> {
    let weapon = hash_param(&weapon, "weapon hash")?;
    let perk = hash_param(&perk, "perk hash")?;

    state
        .engine()
        .await
        .get_perk_rank(weapon, perk)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No ranking for perk {} on weapon {}", perk, weapon)))
}

async fn masterwork_rank(
    State(state): State<Arc<AppState>>,
    AxumPath((weapon, perk)): AxumPath<(String, String)>,
) -> ApiResult<PerkRank> {
    let weapon = hash_param(&weapon, "weapon hash")?;
    let perk = hash_param(&perk, "masterwork hash")?;

    state
        .engine()
        .await
        .get_mw_rank(weapon, perk)
        .map(Json)
        .ok_or_else(|| {
            ApiError::not_found(format!("No ranking for masterwork {} on weapon {}", perk, weapon))
        })
}

async fn combo_rank(
    State(state): State<Arc<AppState>>,
    AxumPath(weapon): AxumPath<String>,
    Query(query): Query<ComboQuery>,
) -> ApiResult<TraitComboRank> {
    let weapon = hash_param(&weapon, "weapon hash")?;
    let (Some(a), Some(b)) = (query.a, query.b) else {
        return Err(ApiError::bad_request("Both a and b perk hashes are required"));
    };
    let (a, b) = (hash_param(&a, "perk hash")?, hash_param(&b, "perk hash")?);

    state
        .engine()
        .await
        .get_trait_combo_rank(weapon, a, b)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No ranking for combo {} + {}", a, b)))
}

async fn top_combos(
    State(state): State<Arc<AppState>>,
    AxumPath(weapon): AxumPath<String>,
    Query(query): Query<TopCombosQuery>,
) -> ApiResult<Vec<TraitComboSummary>> {
    let weapon = hash_param(&weapon, "weapon hash")?;
    let limit = query
        .limit
        .unwrap_or(rollrank::engine::DEFAULT_TOP_COMBOS)
        .min(100);

    Ok(Json(state.engine().await.top_trait_combos(weapon, limit)))
}

async fn review(
    State(state): State<Arc<AppState>>,
    AxumPath(weapon): AxumPath<String>,
) -> ApiResult<ReviewResponse> {
    let weapon = hash_param(&weapon, "weapon hash")?;
    let summary = state
        .engine()
        .await
        .get_review_summary(weapon)
        .ok_or_else(|| ApiError::not_found(format!("No reviews for weapon {}", weapon)))?;

    Ok(Json(ReviewResponse {
        pve_rating: RatingTier::from_average(summary.pve_average),
        pvp_rating: RatingTier::from_average(summary.pvp_average),
        overall_rating: RatingTier::from_average(summary.overall_average),
        summary,
    }))
}

async fn appraise(
    State(state): State<Arc<AppState>>,
    Json(roll): Json<WeaponRoll>,
) -> ApiResult<AppraisalResponse> {
    let engine = state.engine().await;
    if !engine.has_data_for_weapon(roll.item_hash) {
        return Err(ApiError::not_found(format!(
            "No ranking data for weapon {}",
            roll.item_hash
        )));
    }

    Ok(Json(AppraisalResponse {
        ranking: engine.appraise(&roll),
        best_perks: engine.best_perks(&roll),
    }))
}

// =============================================================================
// Router
// =============================================================================

/// Path the statistics asset is served under
pub const ASSETS_ROUTE: &str = "/backend/light";

/// API routes, plus the static assets directory when given
pub fn router(state: Arc<AppState>, assets: Option<&Path>) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/weapons/{hash}", get(weapon_data))
        .route("/weapons/{hash}/perks/{perk}", get(perk_rank))
        .route("/weapons/{hash}/masterwork/{perk}", get(masterwork_rank))
        .route("/weapons/{hash}/combo", get(combo_rank))
        .route("/weapons/{hash}/top-combos", get(top_combos))
        .route("/weapons/{hash}/review", get(review))
        .route("/appraise", post(appraise))
        .with_state(state);

    match assets {
        Some(dir) => api.nest_service(ASSETS_ROUTE, ServeDir::new(dir).precompressed_br()),
        None => api,
    }
}
