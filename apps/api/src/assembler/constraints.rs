//! Constraint checks — tags a candidate placement with the rules it breaks.
//!
//! # Rules
//! - HARD `single-h1`: at most one block per page carries the tag.
//! - HARD `image-alt-required`: hero media and image slots must carry alt text.
//! - SOFT `no-adjacent-heavy`: heavy block directly after another heavy block.
//! - SOFT `prefer-after-hero`: placed before any hero.
//! - SOFT `one-per-page`: a second block of the same kind.
//! - SOFT `missing-slot:<key>`: a required slot with no content at all.
//!
//! A child beam with any HARD tag is discarded; SOFT tags only cost score.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assembler::slots::{image_has_alt, SlotMapping};
use crate::models::catalog::{
    BlockKind, BlockTemplate, SlotType, TAG_IMAGE_ALT, TAG_NO_ADJACENT_HEAVY, TAG_ONE_PER_PAGE,
    TAG_PREFER_AFTER_HERO, TAG_SINGLE_HEADING,
};

const HARD_PREFIX: &str = "HARD:";
const SOFT_PREFIX: &str = "SOFT:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Violation {
    Hard(String),
    Soft(String),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Hard(rule) => write!(f, "{HARD_PREFIX}{rule}"),
            Violation::Soft(rule) => write!(f, "{SOFT_PREFIX}{rule}"),
        }
    }
}

pub fn is_hard(tag: &str) -> bool {
    tag.starts_with(HARD_PREFIX)
}

pub fn is_soft(tag: &str) -> bool {
    tag.starts_with(SOFT_PREFIX)
}

/// Returns the violation tags introduced by appending `candidate` after `placed`.
pub fn candidate_violations(
    placed: &[&BlockTemplate],
    candidate: &BlockTemplate,
    mapping: &SlotMapping,
) -> Vec<String> {
    let mut violations = Vec::new();

    if candidate.has_hard(TAG_SINGLE_HEADING)
        && placed.iter().any(|t| t.has_hard(TAG_SINGLE_HEADING))
    {
        violations.push(Violation::Hard(TAG_SINGLE_HEADING.to_string()));
    }

    if candidate.has_hard(TAG_IMAGE_ALT) {
        if mapping.media.as_ref().is_some_and(|m| !m.has_alt()) {
            violations.push(Violation::Hard(format!("{TAG_IMAGE_ALT}:media")));
        }
        for slot in candidate
            .slots
            .iter()
            .filter(|s| s.slot_type == SlotType::Image)
        {
            if let Some(value) = mapping.content.get(&slot.key) {
                if !value.is_null() && !image_has_alt(value) && !all_items_have_alt(value) {
                    violations.push(Violation::Hard(format!("{TAG_IMAGE_ALT}:{}", slot.key)));
                }
            }
        }
    }

    if candidate.has_soft(TAG_NO_ADJACENT_HEAVY)
        && candidate.weight.is_heavy()
        && placed.last().is_some_and(|prev| prev.weight.is_heavy())
    {
        violations.push(Violation::Soft(TAG_NO_ADJACENT_HEAVY.to_string()));
    }

    if candidate.has_soft(TAG_PREFER_AFTER_HERO) && !placed.iter().any(|t| t.kind == BlockKind::Hero)
    {
        violations.push(Violation::Soft(TAG_PREFER_AFTER_HERO.to_string()));
    }

    if candidate.has_soft(TAG_ONE_PER_PAGE) && placed.iter().any(|t| t.kind == candidate.kind) {
        violations.push(Violation::Soft(TAG_ONE_PER_PAGE.to_string()));
    }

    for key in &mapping.missing_required {
        violations.push(Violation::Soft(format!("missing-slot:{key}")));
    }

    violations.iter().map(Violation::to_string).collect()
}

/// Arrays of images pass when every element carries alt text.
fn all_items_have_alt(value: &Value) -> bool {
    value
        .as_array()
        .map(|items| !items.is_empty() && items.iter().all(image_has_alt))
        .unwrap_or(false)
}
