use rust_decimal::Decimal;
use rust_decimal::prelude::*;

const TICK_BASE: f64 = 1.0001;

/// Returns the raw price ratio at a tick.
/// P = 1.0001 ^ tick
pub fn tick_to_price(tick: i32) -> Result<Decimal, &'static str> {
    Decimal::from_f64(TICK_BASE.powi(tick)).ok_or("Overflow converting price")
}

/// Returns the human-readable price of token A in token B at a tick,
/// adjusting the raw ratio by the tokens' decimals.
pub fn tick_to_display_price(
    tick: i32,
    decimals_a: u8,
    decimals_b: u8,
) -> Result<Decimal, &'static str> {
    let shift = i32::from(decimals_a) - i32::from(decimals_b);
    let adjusted = TICK_BASE.powi(tick) * 10f64.powi(shift);
    Decimal::from_f64(adjusted).ok_or("Overflow converting price")
}

/// Returns the tick closest to a raw price ratio.
/// tick = log_1.0001(P)
pub fn price_to_tick(price: Decimal) -> Result<i32, &'static str> {
    if price <= Decimal::ZERO {
        return Err("Price must be positive");
    }
    let price_f64 = price.to_f64().ok_or("Overflow converting price")?;
    Ok(price_f64.log(TICK_BASE).round() as i32)
}
