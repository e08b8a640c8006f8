//! Aggregation - merge partial findings into one scored result
//!
//! ```text
//! findings ──► flatten offenses ──► dedup (date, location) ──► score
//!                                         first seen wins
//! ```
//!
//! `score = min(100, round((10 + 25n) × (1 + max(0, P − 1) × 0.15)))`
//! where `n` is the deduplicated offense count and `P` the number of
//! distinct pillars among hit sources.

use std::collections::{BTreeSet, HashSet};

use guardscreen_core::{AggregateResult, CheckStatus, IdentityConfidence, Pillar, SourceFinding};
use guardscreen_probes::ProbeOutcome;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::{EngineError, EngineResult};

const BASE_SCORE: u64 = 10;
const PER_OFFENSE: u64 = 25;
const MAX_SCORE: u8 = 100;

/// From this many offenses on the base alone exceeds the ceiling
const OFFENSE_CAP: usize = 4;

/// Aggregate plus the status it implies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    pub result: AggregateResult,
    pub status: CheckStatus,
}

/// Risk score for `unique_offenses` offenses across `distinct_pillars` hit pillars
pub fn risk_score(unique_offenses: usize, distinct_pillars: usize) -> u8 {
    let n = unique_offenses.min(OFFENSE_CAP) as u64;
    let base = Decimal::from(BASE_SCORE + PER_OFFENSE * n);

    let extra_pillars = distinct_pillars.saturating_sub(1).min(Pillar::ALL.len()) as u64;
    let multiplier = Decimal::ONE + Decimal::from(extra_pillars) * dec!(0.15);

    let raw = (base * multiplier).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    raw.min(Decimal::from(MAX_SCORE))
        .to_u8()
        .unwrap_or(MAX_SCORE)
}

/// Aggregate the findings of the probes that succeeded
pub fn aggregate_findings(findings: &[SourceFinding], confidence_level: u8) -> Aggregation {
    let mut seen = HashSet::new();
    let offenses: Vec<_> = findings
        .iter()
        .flat_map(|f| f.offenses.iter())
        .filter(|o| seen.insert(o.dedup_key()))
        .cloned()
        .collect();

    let hit_pillars: BTreeSet<Pillar> = findings
        .iter()
        .filter(|f| f.is_hit())
        .map(|f| f.pillar)
        .collect();

    let identity_confidence = if findings.iter().any(|f| f.identity_match) {
        IdentityConfidence::matched(confidence_level)
    } else {
        IdentityConfidence::unmatched()
    };

    let result = AggregateResult {
        risk_score: risk_score(offenses.len(), hit_pillars.len()),
        identity_confidence,
        offenses,
        sources: findings.iter().map(|f| f.source.clone()).collect(),
        error: None,
    };
    let status = CheckStatus::from_result(&result);

    Aggregation { result, status }
}

/// Aggregate a fan-out. Fails only when no probe succeeded.
pub fn aggregate(outcomes: &[ProbeOutcome], confidence_level: u8) -> EngineResult<Aggregation> {
    let findings: Vec<SourceFinding> = outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().ok().cloned())
        .collect();

    if findings.is_empty() {
        return Err(EngineError::AllSourcesFailed {
            attempted: outcomes.len(),
        });
    }

    Ok(aggregate_findings(&findings, confidence_level))
}
