use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{post, put};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::catalog;
use crate::error::AppError;
use crate::models::pricing::{DistanceTier, PricingRule, TripType, VehicleCategory};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pricing-rules", post(create_rule).get(list_rules))
        .route("/pricing-rules/:id", put(update_rule).delete(delete_rule))
}

#[derive(Deserialize)]
pub struct PricingRuleRequest {
    pub category: VehicleCategory,
    pub vehicle_type: String,
    pub vehicle_model: String,
    pub trip_type: TripType,
    #[serde(default)]
    pub fixed_price: f64,
    #[serde(default)]
    pub distance_tiers: Vec<DistanceTier>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_default: bool,
}

fn default_true() -> bool {
    true
}

impl PricingRuleRequest {
    fn into_rule(self, id: Uuid) -> PricingRule {
        let now = Utc::now();
        PricingRule {
            id,
            category: self.category,
            vehicle_type: self.vehicle_type,
            vehicle_model: self.vehicle_model,
            trip_type: self.trip_type,
            fixed_price: self.fixed_price,
            distance_tiers: self.distance_tiers,
            is_active: self.is_active,
            is_default: self.is_default,
            created_at: now,
            updated_at: now,
        }
    }
}

async fn create_rule(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PricingRuleRequest>,
) -> Result<Json<PricingRule>, AppError> {
    let rule = catalog::create(&state, payload.into_rule(Uuid::new_v4()))?;
    state
        .metrics
        .active_pricing_rules
        .set(state.pricing_rules.len() as i64);

    Ok(Json(rule))
}

async fn list_rules(State(state): State<Arc<AppState>>) -> Json<Vec<PricingRule>> {
    let rules = state
        .pricing_rules
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    Json(rules)
}

async fn update_rule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PricingRuleRequest>,
) -> Result<Json<PricingRule>, AppError> {
    let rule = catalog::update(&state, id, payload.into_rule(id))?;
    Ok(Json(rule))
}

async fn delete_rule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    catalog::delete(&state, id)?;
    state
        .metrics
        .active_pricing_rules
        .set(state.pricing_rules.len() as i64);

    Ok(Json(serde_json::json!({ "deleted": id })))
}
