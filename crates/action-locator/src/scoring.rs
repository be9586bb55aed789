//! Candidate scoring.
//!
//! Score = rendered area + the bonus of every matching rule. Pure; no page access.

use action_primitives::CandidateFeatures;

use crate::types::{Ranked, ScoreRules};

/// Score one candidate, or `None` when the rules disqualify it.
pub fn score(candidate: &CandidateFeatures, rules: &ScoreRules) -> Option<f64> {
    if rules.skip_disabled && candidate.disabled {
        return None;
    }
    if rules
        .exclude_text
        .iter()
        .any(|fragment| candidate.text.contains(fragment.as_str()))
    {
        return None;
    }
    if !rules.required.iter().all(|matcher| matcher.matches(candidate)) {
        return None;
    }

    let mut earned = false;
    let mut total = candidate.rect.area();
    for (matcher, weight) in &rules.bonuses {
        if matcher.matches(candidate) {
            earned = true;
            total += weight;
        }
    }
    if rules.require_bonus && !earned {
        return None;
    }
    Some(total)
}

/// Scores, de-duplicates by handle and keeps the best `top_k`, highest first.
///
/// Ties keep probe order, so earlier selectors win.
pub fn rank(candidates: Vec<CandidateFeatures>, rules: &ScoreRules, top_k: usize) -> Vec<Ranked> {
    let mut ranked: Vec<Ranked> = Vec::with_capacity(candidates.len());
    for features in candidates {
        if ranked
            .iter()
            .any(|seen| seen.features.handle == features.handle)
        {
            continue;
        }
        if let Some(score) = score(&features, rules) {
            ranked.push(Ranked { features, score });
        }
    }
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(top_k);
    ranked
}
