//! Candidate scoring for the beam search.
//!
//! step score = 0.40·content_fit + 0.20·tone_match + 0.20·aesthetic_flow
//!            + 0.10·performance + 0.10·accessibility
//!
//! The final re-score adds up to 50 points for core-kind coverage and charges
//! 100 per HARD and 10 per SOFT violation.

use serde::{Deserialize, Serialize};

use crate::assembler::constraints::{is_hard, is_soft};
use crate::assembler::tone::tone_match;
use crate::models::catalog::{BlockKind, BlockTemplate, A11Y_CONTRAST, A11Y_KEYBOARD, TAG_SINGLE_HEADING};
use crate::models::content::Tone;
use crate::models::layout::Layout;

/// Kinds whose presence earns the coverage bonus.
pub const CORE_KINDS: [BlockKind; 3] = [BlockKind::Hero, BlockKind::Features, BlockKind::Cta];

const COVERAGE_BONUS: f64 = 50.0;
const HARD_PENALTY: f64 = 100.0;
const SOFT_PENALTY: f64 = 10.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub content_fit: f64,
    pub tone_match: f64,
    pub aesthetic_flow: f64,
    pub performance: f64,
    pub accessibility: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            content_fit: 0.40,
            tone_match: 0.20,
            aesthetic_flow: 0.20,
            performance: 0.10,
            accessibility: 0.10,
        }
    }
}

/// Per-component scores for one candidate, each in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub content_fit: f64,
    pub tone_match: f64,
    pub aesthetic_flow: f64,
    pub performance: f64,
    pub accessibility: f64,
}

impl ScoreBreakdown {
    pub fn combined(&self, weights: &ScoringWeights) -> f64 {
        weights.content_fit * self.content_fit
            + weights.tone_match * self.tone_match
            + weights.aesthetic_flow * self.aesthetic_flow
            + weights.performance * self.performance
            + weights.accessibility * self.accessibility
    }
}

/// Scores appending `candidate` after the templates already `placed`.
pub fn score_candidate(
    placed: &[&BlockTemplate],
    candidate: &BlockTemplate,
    content_fit: f64,
    tone: Tone,
) -> ScoreBreakdown {
    ScoreBreakdown {
        content_fit,
        tone_match: tone_match(&candidate.variant, tone),
        aesthetic_flow: aesthetic_flow(placed, candidate),
        performance: performance(placed, candidate),
        accessibility: accessibility(placed, candidate),
    }
}

/// 1.0 first in layout; 0.3 heaviest-after-heaviest; 0.5 repeated variant;
/// otherwise 1.0 when the weight variance lies in [1, 3], else 0.5.
pub fn aesthetic_flow(placed: &[&BlockTemplate], candidate: &BlockTemplate) -> f64 {
    let Some(prev) = placed.last() else {
        return 1.0;
    };
    if prev.weight.is_max() && candidate.weight.is_max() {
        return 0.3;
    }
    if prev.variant == candidate.variant {
        return 0.5;
    }

    let weights: Vec<f64> = placed
        .iter()
        .map(|t| t.weight.value() as f64)
        .chain(std::iter::once(candidate.weight.value() as f64))
        .collect();
    let variance = variance(&weights);
    if !(1.0..=3.0).contains(&variance) {
        0.5
    } else {
        1.0
    }
}

/// 1.0, minus 0.3 when more than half the blocks animate, minus 0.2 when more
/// than 60% need client scripting. Floored at 0.
pub fn performance(placed: &[&BlockTemplate], candidate: &BlockTemplate) -> f64 {
    let total = (placed.len() + 1) as f64;
    let animated = placed.iter().filter(|t| t.animated).count() + usize::from(candidate.animated);
    let scripted = placed.iter().filter(|t| t.requires_script).count()
        + usize::from(candidate.requires_script);

    let mut score = 1.0;
    if animated as f64 / total > 0.5 {
        score -= 0.3;
    }
    if scripted as f64 / total > 0.6 {
        score -= 0.2;
    }
    f64::max(score, 0.0)
}

/// 0.7 while no single-heading block is placed and the candidate is not a hero;
/// otherwise 1.0 with both contrast and keyboard tags, else 0.6.
pub fn accessibility(placed: &[&BlockTemplate], candidate: &BlockTemplate) -> f64 {
    let heading_placed = placed.iter().any(|t| t.has_hard(TAG_SINGLE_HEADING));
    if !heading_placed && candidate.kind != BlockKind::Hero {
        return 0.7;
    }
    if candidate.has_a11y(A11Y_CONTRAST) && candidate.has_a11y(A11Y_KEYBOARD) {
        1.0
    } else {
        0.6
    }
}

/// Cumulative beam score plus coverage bonus, minus violation penalties.
pub fn final_score(cumulative: f64, layout: &Layout, violations: &[String]) -> f64 {
    let covered = CORE_KINDS
        .iter()
        .filter(|k| layout.contains_kind(**k))
        .count();
    let coverage = covered as f64 / CORE_KINDS.len() as f64;
    let hard = violations.iter().filter(|v| is_hard(v)).count() as f64;
    let soft = violations.iter().filter(|v| is_soft(v)).count() as f64;

    cumulative + COVERAGE_BONUS * coverage - HARD_PENALTY * hard - SOFT_PENALTY * soft
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}
