//! Pure tier resolution over a tenant's tier table.
//!
//! All functions take the tenant's active tiers sorted ascending by
//! `min_points` (the order `TierRepository::list_active` returns them in)
//! and never touch the database, so the ledger can call them inside its
//! row-lock scope.

use nuqta_common::models::tier::Tier;

/// The highest tier whose `min_points <= current_points`. When no tier
/// qualifies, falls back to the lowest-ordered tier even if its threshold is
/// nonzero; tenants are expected to define a zero-threshold base tier.
/// Returns `None` only when the tier table is empty.
pub fn resolve_tier(tiers: &[Tier], current_points: i64) -> Option<&Tier> {
    tiers
        .iter()
        .rev()
        .find(|t| t.min_points <= current_points)
        .or_else(|| tiers.first())
}

/// The cheapest tier still above `current_points`, or `None` at max tier.
pub fn next_tier(tiers: &[Tier], current_points: i64) -> Option<&Tier> {
    tiers.iter().find(|t| t.min_points > current_points)
}

/// Points still needed to reach the next tier; 0 at max tier.
pub fn points_to_next(tiers: &[Tier], current_points: i64) -> i64 {
    match next_tier(tiers, current_points) {
        Some(t) => (t.min_points - current_points).max(0),
        None => 0,
    }
}

/// Progress towards the next tier as a percentage, capped at 100.
/// Reports 0 when already at the max tier.
pub fn progress_percent(tiers: &[Tier], current_points: i64) -> f64 {
    let Some(next) = next_tier(tiers, current_points) else {
        return 0.0;
    };
    let current_min = resolve_tier(tiers, current_points)
        .map(|t| t.min_points)
        .unwrap_or(0);
    let span = next.min_points - current_min;
    if span <= 0 {
        return 0.0;
    }
    let pct = (current_points - current_min) as f64 / span as f64 * 100.0;
    pct.clamp(0.0, 100.0)
}
