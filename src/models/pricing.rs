use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VehicleCategory {
    Auto,
    Car,
    Bus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TripType {
    OneWay,
    Return,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Petrol,
    Diesel,
    Cng,
}

/// One row of the tiered-rate table: the rate applies to the whole trip
/// when the trip distance is at or below `threshold_km`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DistanceTier {
    pub threshold_km: f64,
    pub rate_per_km: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingRule {
    pub id: Uuid,
    pub category: VehicleCategory,
    pub vehicle_type: String,
    pub vehicle_model: String,
    pub trip_type: TripType,
    /// Flat fare, only meaningful for the auto category.
    pub fixed_price: f64,
    /// Ascending tier table, only meaningful for non-auto categories.
    pub distance_tiers: Vec<DistanceTier>,
    pub is_active: bool,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Composite lookup key for a pricing rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RuleKey {
    pub category: VehicleCategory,
    pub vehicle_type: String,
    pub vehicle_model: String,
    pub trip_type: TripType,
}

impl PricingRule {
    pub fn key(&self) -> RuleKey {
        RuleKey {
            category: self.category,
            vehicle_type: self.vehicle_type.clone(),
            vehicle_model: self.vehicle_model.clone(),
            trip_type: self.trip_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareBreakdown {
    pub base_fare: f64,
    /// Itemized for display; not part of `total_amount`.
    pub fuel_surcharge: f64,
    /// Itemized for display; not part of `total_amount`.
    pub night_surcharge: f64,
    pub gst_amount: f64,
    pub total_amount: f64,
    pub rate_per_km: f64,
    pub distance_tier_used: Option<String>,
}
