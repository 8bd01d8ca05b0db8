use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::pricing::{PricingRule, RuleKey, VehicleCategory};
use crate::state::AppState;

/// Finds the active rule for a lookup key. Falls back to the category's
/// default rule when no exact match exists.
pub fn find_active(state: &AppState, key: &RuleKey) -> Result<PricingRule, AppError> {
    let exact = state
        .pricing_rules
        .iter()
        .find(|entry| entry.value().is_active && entry.value().key() == *key)
        .map(|entry| entry.value().clone());

    if let Some(rule) = exact {
        return Ok(rule);
    }

    state
        .pricing_rules
        .iter()
        .find(|entry| {
            let rule = entry.value();
            rule.is_active
                && rule.is_default
                && rule.category == key.category
                && rule.trip_type == key.trip_type
        })
        .map(|entry| entry.value().clone())
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "no active pricing rule for {}/{}",
                key.vehicle_type, key.vehicle_model
            ))
        })
}

pub fn create(state: &AppState, rule: PricingRule) -> Result<PricingRule, AppError> {
    validate(&rule)?;

    let key = rule.key();
    let duplicate = state
        .pricing_rules
        .iter()
        .any(|entry| entry.value().key() == key);
    if duplicate {
        return Err(AppError::Conflict(format!(
            "a pricing rule already exists for {}/{}",
            key.vehicle_type, key.vehicle_model
        )));
    }

    if rule.is_default && has_other_default(state, rule.category, rule.id) {
        return Err(AppError::Validation(format!(
            "category already has a default rule; clear it before setting {}",
            rule.id
        )));
    }

    state.pricing_rules.insert(rule.id, rule.clone());
    info!(rule_id = %rule.id, "pricing rule created");
    Ok(rule)
}

pub fn update(state: &AppState, id: Uuid, mut rule: PricingRule) -> Result<PricingRule, AppError> {
    rule.id = id;
    validate(&rule)?;

    let key = rule.key();
    let clash = state
        .pricing_rules
        .iter()
        .any(|entry| entry.value().id != id && entry.value().key() == key);
    if clash {
        return Err(AppError::Conflict(format!(
            "a pricing rule already exists for {}/{}",
            key.vehicle_type, key.vehicle_model
        )));
    }

    if rule.is_default && has_other_default(state, rule.category, id) {
        return Err(AppError::Validation(
            "category already has a default rule".to_string(),
        ));
    }

    let mut existing = state
        .pricing_rules
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("pricing rule {id} not found")))?;

    rule.created_at = existing.created_at;
    rule.updated_at = Utc::now();
    *existing = rule.clone();

    info!(rule_id = %id, "pricing rule updated");
    Ok(rule)
}

/// Removes a rule from the catalog. Bookings priced under it keep their
/// frozen snapshot; nothing re-reads the rule after creation.
pub fn delete(state: &AppState, id: Uuid) -> Result<(), AppError> {
    state
        .pricing_rules
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("pricing rule {id} not found")))?;

    info!(rule_id = %id, "pricing rule deleted");
    Ok(())
}

fn has_other_default(state: &AppState, category: VehicleCategory, id: Uuid) -> bool {
    state.pricing_rules.iter().any(|entry| {
        let rule = entry.value();
        rule.id != id && rule.is_default && rule.category == category
    })
}

fn validate(rule: &PricingRule) -> Result<(), AppError> {
    if rule.vehicle_type.trim().is_empty() || rule.vehicle_model.trim().is_empty() {
        return Err(AppError::Validation(
            "vehicle type and model cannot be empty".to_string(),
        ));
    }

    match rule.category {
        VehicleCategory::Auto => {
            if rule.fixed_price <= 0.0 {
                return Err(AppError::Validation(
                    "auto pricing requires a positive fixed price".to_string(),
                ));
            }
        }
        _ => {
            if rule.distance_tiers.is_empty() {
                return Err(AppError::Validation(
                    "tiered pricing requires at least one distance tier".to_string(),
                ));
            }

            let ascending = rule
                .distance_tiers
                .windows(2)
                .all(|pair| pair[0].threshold_km < pair[1].threshold_km);
            if !ascending {
                return Err(AppError::Validation(
                    "distance tiers must have strictly ascending thresholds".to_string(),
                ));
            }

            if rule.distance_tiers.iter().any(|tier| tier.rate_per_km < 0.0) {
                return Err(AppError::Validation(
                    "tier rates cannot be negative".to_string(),
                ));
            }

            if !rule.distance_tiers.iter().any(|tier| tier.rate_per_km > 0.0) {
                return Err(AppError::Validation(
                    "at least one tier rate must be positive".to_string(),
                ));
            }
        }
    }

    Ok(())
}
