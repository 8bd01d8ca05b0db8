use serde::{Deserialize, Serialize};

use crate::models::booking::PaymentMethod;

/// Share of the fare collected online up front when paying online.
const ADVANCE_SHARE: f64 = 0.20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSplit {
    pub advance_amount: f64,
    pub driver_collected_amount: f64,
    pub is_partial_payment: bool,
}

/// Splits a fare between the online advance and the cash the driver
/// collects at trip end. Rounding happens once, on the advance; the
/// remainder is derived by subtraction so the two legs always sum back
/// to the total.
pub fn split(total_amount: f64, method: PaymentMethod) -> PaymentSplit {
    match method {
        PaymentMethod::Cash => PaymentSplit {
            advance_amount: 0.0,
            driver_collected_amount: total_amount,
            is_partial_payment: false,
        },
        PaymentMethod::Online => {
            let advance_amount = (total_amount * ADVANCE_SHARE).round();
            let driver_collected_amount = total_amount - advance_amount;

            PaymentSplit {
                advance_amount,
                driver_collected_amount,
                is_partial_payment: driver_collected_amount > 0.0,
            }
        }
    }
}
