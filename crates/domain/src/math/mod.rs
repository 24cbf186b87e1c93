//! Tick math and range analysis.

/// Conversions between tick index and price.
pub mod price_tick;
/// Bucket and range arithmetic over snapshots.
pub mod tick_range;
