use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Kilometers covered by the flat tiers; anything beyond is billed per km.
pub const FLAT_TIER_LIMIT_KM: f64 = 6.0;

/// Tiered delivery price schedule, amounts in FCFA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "range_0_1km": 375,
    "range_1_5km": 500,
    "range_5_6km": 600,
    "additional_per_km": 100
}))]
pub struct PricingTiers {
    /// Price for distances up to and including 1 km
    #[validate(custom = "validate_amount")]
    pub range_0_1km: Decimal,
    /// Price for distances above 1 km up to and including 5 km
    #[validate(custom = "validate_amount")]
    pub range_1_5km: Decimal,
    /// Price for distances above 5 km up to and including 6 km
    #[validate(custom = "validate_amount")]
    pub range_5_6km: Decimal,
    /// Surcharge for every started kilometer above 6 km
    #[validate(custom = "validate_amount")]
    pub additional_per_km: Decimal,
}

impl Default for PricingTiers {
    fn default() -> Self {
        Self {
            range_0_1km: dec!(375),
            range_1_5km: dec!(500),
            range_5_6km: dec!(600),
            additional_per_km: dec!(100),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    #[error("distance must be a finite number of kilometers, got {0}")]
    InvalidDistance(f64),
    #[error("price for {0} km exceeds the representable amount")]
    Overflow(f64),
}

fn validate_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("pricing amounts must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Price of a delivery over `distance_km`, using `tiers` or the default schedule.
///
/// Tier upper bounds are inclusive: exactly 1 km is billed at `range_0_1km`,
/// exactly 5 km at `range_1_5km`. Above 6 km every started kilometer adds
/// `additional_per_km`, so 6.2 km pays for one extra kilometer.
pub fn calculate_delivery_price(
    distance_km: f64,
    tiers: Option<&PricingTiers>,
) -> Result<Decimal, PricingError> {
    if distance_km.is_nan() {
        return Err(PricingError::InvalidDistance(distance_km));
    }

    let defaults;
    let pricing = match tiers {
        Some(tiers) => tiers,
        None => {
            defaults = PricingTiers::default();
            &defaults
        }
    };

    if distance_km <= 1.0 {
        Ok(pricing.range_0_1km)
    } else if distance_km <= 5.0 {
        Ok(pricing.range_1_5km)
    } else if distance_km <= FLAT_TIER_LIMIT_KM {
        Ok(pricing.range_5_6km)
    } else {
        Decimal::from_f64_retain((distance_km - FLAT_TIER_LIMIT_KM).ceil())
            .and_then(|additional_km| additional_km.checked_mul(pricing.additional_per_km))
            .and_then(|surcharge| surcharge.checked_add(pricing.range_5_6km))
            .ok_or(PricingError::Overflow(distance_km))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, dec!(375))]
    #[case(0.4, dec!(375))]
    #[case(1.0, dec!(375))]
    #[case(1.0001, dec!(500))]
    #[case(5.0, dec!(500))]
    #[case(5.0001, dec!(600))]
    #[case(6.0, dec!(600))]
    #[case(6.2, dec!(700))]
    #[case(7.0, dec!(700))]
    #[case(8.0, dec!(800))]
    #[case(12.01, dec!(1300))]
    fn default_schedule_boundaries(#[case] distance: f64, #[case] expected: Decimal) {
        assert_eq!(calculate_delivery_price(distance, None), Ok(expected));
    }

    #[test]
    fn custom_tiers_are_used() {
        let tiers = PricingTiers {
            range_0_1km: dec!(250),
            range_1_5km: dec!(400),
            range_5_6km: dec!(550),
            additional_per_km: dec!(75.5),
        };
        assert_eq!(calculate_delivery_price(0.5, Some(&tiers)), Ok(dec!(250)));
        assert_eq!(calculate_delivery_price(3.0, Some(&tiers)), Ok(dec!(400)));
        assert_eq!(calculate_delivery_price(9.5, Some(&tiers)), Ok(dec!(852)));
    }

    #[test]
    fn unrepresentable_prices_are_errors() {
        assert_eq!(
            calculate_delivery_price(1e30, None),
            Err(PricingError::Overflow(1e30))
        );
        assert_eq!(
            calculate_delivery_price(f64::INFINITY, None),
            Err(PricingError::Overflow(f64::INFINITY))
        );
        assert!(matches!(
            calculate_delivery_price(f64::NAN, None),
            Err(PricingError::InvalidDistance(_))
        ));
        assert_eq!(calculate_delivery_price(10_006.0, None), Ok(dec!(1_000_600)));
    }

    #[test]
    fn negative_amounts_fail_validation() {
        let tiers = PricingTiers {
            additional_per_km: dec!(-1),
            ..PricingTiers::default()
        };
        let errors = tiers.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("additional_per_km"));
        assert!(PricingTiers::default().validate().is_ok());
    }

    #[test]
    fn tiers_deserialize_from_numbers() {
        let tiers: PricingTiers = serde_json::from_value(json!({
            "range_0_1km": 375,
            "range_1_5km": 500,
            "range_5_6km": 600,
            "additional_per_km": 100
        }))
        .unwrap();
        assert_eq!(tiers, PricingTiers::default());
    }
}
