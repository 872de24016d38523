//! Trust tier endpoint

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use flowlend_types::TrustTier;

use crate::state::AppState;

/// Trust tier for a score under the configured policy
#[derive(Debug, Serialize, Deserialize)]
pub struct TrustTierResponse {
    pub score: u32,
    pub tier: TrustTier,
}

/// GET /api/v1/trust/:score - Derive the tier for a trust score
pub async fn trust_tier(
    State(state): State<AppState>,
    Path(score): Path<u32>,
) -> Json<TrustTierResponse> {
    Json(TrustTierResponse {
        score,
        tier: state.tiers.tier_for(score),
    })
}
