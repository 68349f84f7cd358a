use crate::models::{OptionRecord, Payload, RiskProfile, ScoredRecord, ScoringMode};
use serde_json::Value;
use std::cmp::Ordering;

/// Turn a snapshot payload into records, dropping entries that are not objects.
/// Order is preserved.
pub fn normalize_rows(payload: &Payload) -> Vec<OptionRecord> {
    payload
        .rows()
        .iter()
        .filter_map(|row| match row {
            Value::Object(map) => Some(OptionRecord::new(map.clone())),
            _ => None,
        })
        .collect()
}

/// Score one record, or `None` when its known option type is on the other side.
pub fn score_record(record: &OptionRecord, mode: ScoringMode) -> Option<f64> {
    let (side, profile) = match mode {
        ScoringMode::Legacy => return Some(finite_or_zero(legacy_score(record))),
        ScoringMode::Profile { side, profile } => (side, profile),
    };

    if record.option_type().excludes(side) {
        return None;
    }

    let volume = record.volume();
    let iv = record.implied_volatility();
    let premium = record.fair_market_value();
    let oi = record.open_interest();
    let bid = record.bid();
    let ask = record.ask();
    let delta = record.delta();
    let gamma = record.gamma();

    // Mid falls back to fmv unless both sides of the quote are live
    let quoted = bid > 0.0 && ask > 0.0;
    let mid = if quoted { (bid + ask) / 2.0 } else { premium };

    let spread_to_mid = if quoted && mid > 0.0 {
        (ask - bid).abs() / mid
    } else {
        0.0
    };

    // Liquidity + activity
    let base_score = volume * mid + oi * 10.0;

    let score = match profile {
        RiskProfile::Conservative => {
            base_score + oi * 10.0 - (delta.abs() - 0.2).abs() * 500.0 - spread_to_mid * 1000.0
        }
        RiskProfile::Aggressive => {
            base_score + delta.abs() * 2000.0 + iv * 10.0 + gamma * 100.0
        }
        RiskProfile::Balanced => {
            base_score + delta.abs() * 1000.0 + iv * 5.0 - spread_to_mid * 300.0
        }
    };

    Some(finite_or_zero(score))
}

/// Overflowing inputs can yield inf or NaN; keep the ordering total.
fn finite_or_zero(score: f64) -> f64 {
    if score.is_finite() { score } else { 0.0 }
}

fn legacy_score(record: &OptionRecord) -> f64 {
    record.volume() * record.fair_market_value()
        + record.open_interest() * 10.0
        + record.implied_volatility()
}

/// Score every record, dropping the ones on the wrong side.
pub fn score_records(records: Vec<OptionRecord>, mode: ScoringMode) -> Vec<ScoredRecord> {
    records
        .into_iter()
        .filter_map(|record| {
            score_record(&record, mode).map(|score| ScoredRecord { score, record })
        })
        .collect()
}

/// Highest scores first, at most `k`. Equal scores keep their input order.
pub fn select_top(mut scored: Vec<ScoredRecord>, k: i64) -> Vec<OptionRecord> {
    if k <= 0 {
        return Vec::new();
    }

    // sort_by is stable
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    scored
        .into_iter()
        .take(usize::try_from(k).unwrap_or(usize::MAX))
        .map(|s| s.record)
        .collect()
}

/// Normalize, score and select in one pass.
pub fn rank_signals(payload: &Payload, mode: ScoringMode, k: i64) -> Vec<OptionRecord> {
    select_top(score_records(normalize_rows(payload), mode), k)
}
