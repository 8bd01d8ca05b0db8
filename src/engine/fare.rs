use chrono::{DateTime, Duration, Timelike, Utc};

use crate::error::AppError;
use crate::models::pricing::{DistanceTier, FareBreakdown, FuelType, PricingRule, VehicleCategory};

/// GST is levied on the base fare only, never on surcharges.
const GST_RATE: f64 = 0.05;

/// Flat surcharge per simulated trip hour falling in the night window.
const NIGHT_RATE_PER_HOUR: f64 = 50.0;

/// Average speed used to convert distance into simulated trip hours.
const AVERAGE_SPEED_KMH: f64 = 40.0;

/// Night window is [22:00, 06:00) local to the scheduled timestamp.
const NIGHT_START_HOUR: u32 = 22;
const NIGHT_END_HOUR: u32 = 6;

pub fn compute(
    rule: &PricingRule,
    distance_km: f64,
    scheduled_at: DateTime<Utc>,
    fuel_type: FuelType,
) -> Result<FareBreakdown, AppError> {
    if distance_km <= 0.0 {
        return Err(AppError::Validation(format!(
            "distance must be positive, got {distance_km} km"
        )));
    }

    let (base_fare, rate_per_km, distance_tier_used) = match rule.category {
        VehicleCategory::Auto => (rule.fixed_price, 0.0, None),
        _ => {
            let tier = select_tier(rule, distance_km)?;
            (
                tier.rate_per_km * distance_km,
                tier.rate_per_km,
                Some(format!("{:.0}km", tier.threshold_km)),
            )
        }
    };

    let fuel_surcharge = fuel_surcharge(distance_km, fuel_type);
    let night_surcharge = night_surcharge(distance_km, scheduled_at);
    let gst_amount = (base_fare * GST_RATE).round();

    Ok(FareBreakdown {
        base_fare,
        fuel_surcharge,
        night_surcharge,
        gst_amount,
        // Surcharges are itemized for display but excluded from the total;
        // changing this needs product sign-off, not a code fix.
        total_amount: base_fare + gst_amount,
        rate_per_km,
        distance_tier_used,
    })
}

/// Picks the first tier whose threshold covers the distance; a 50 km trip
/// lands in the 50 km band, not the 100 km one. Trips past the last
/// threshold use the last band's rate for the whole distance.
fn select_tier(rule: &PricingRule, distance_km: f64) -> Result<&DistanceTier, AppError> {
    let tiers = &rule.distance_tiers;

    if tiers.is_empty() {
        return Err(AppError::Validation(format!(
            "pricing rule {} has no distance tiers",
            rule.id
        )));
    }

    let selected = tiers
        .iter()
        .find(|tier| tier.threshold_km >= distance_km)
        .unwrap_or_else(|| &tiers[tiers.len() - 1]);

    Ok(selected)
}

fn fuel_surcharge(distance_km: f64, fuel_type: FuelType) -> f64 {
    let (efficiency_km_per_unit, unit_cost) = match fuel_type {
        FuelType::Petrol => (15.0, 105.0),
        FuelType::Diesel => (18.0, 92.0),
        FuelType::Cng => (22.0, 78.0),
    };

    (distance_km / efficiency_km_per_unit) * unit_cost
}

fn night_surcharge(distance_km: f64, scheduled_at: DateTime<Utc>) -> f64 {
    let trip_hours = (distance_km / AVERAGE_SPEED_KMH).ceil().max(1.0) as i64;

    let night_hours = (0..trip_hours)
        .filter(|offset| {
            let hour = (scheduled_at + Duration::hours(*offset)).hour();
            hour >= NIGHT_START_HOUR || hour < NIGHT_END_HOUR
        })
        .count() as f64;

    night_hours * NIGHT_RATE_PER_HOUR
}
