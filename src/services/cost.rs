use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Fuel cost of driving `distance_km`, rounded to cents.
///
/// A zero, missing or non-finite fuel economy is replaced by 1 km/l. That keeps
/// the division defined but yields a cost with no real-world meaning; callers
/// that care should validate the profile first.
///
/// `None` when the figures do not fit in a [`Decimal`].
pub fn estimate_fuel_cost(
    distance_km: f64,
    fuel_economy_km_per_liter: Option<f64>,
    fuel_price_per_liter: Decimal,
) -> Option<Decimal> {
    let economy = fuel_economy_km_per_liter
        .filter(|economy| economy.is_finite() && *economy != 0.0)
        .and_then(Decimal::from_f64)
        .filter(|economy| !economy.is_zero())
        .unwrap_or(Decimal::ONE);
    let distance = Decimal::from_f64(distance_km)?;

    let cost = distance
        .checked_div(economy)?
        .checked_mul(fuel_price_per_liter)?;
    Some(cost.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}
