//! Domain services: distance calculation with local fallback, and delivery pricing.

pub mod distance;
pub mod pricing;

pub use distance::{BackendDistance, DistanceBackend, DistanceResult, DistanceService};
pub use pricing::{calculate_delivery_price, PricingError, PricingTiers};
