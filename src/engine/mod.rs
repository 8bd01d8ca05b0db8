pub mod fare;
pub mod lifecycle;
pub mod payment;
