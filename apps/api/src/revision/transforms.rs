//! Transform Engine — pure `Layout → Layout` functions.
//!
//! CRITICAL: a transform never mutates its input. `apply` clones the layout,
//! edits the clone and renumbers positions before returning it. Transforms
//! never fail: out-of-range indices are clamped, unknown ids are no-ops.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::assembler::tone::tone_profile;
use crate::catalog::Catalog;
use crate::models::catalog::{BlockKind, BlockTemplate};
use crate::models::content::Tone;
use crate::models::layout::{BlockInstance, Layout};

/// Hero bullet entries kept by `tighten-above-fold`.
const ABOVE_FOLD_BULLETS: usize = 2;
/// Index a cta is moved to when it should sit above the fold.
const ABOVE_FOLD_INDEX: usize = 1;

const HEADLINE_KEY: &str = "headline";
const BULLETS_KEY: &str = "bullets";
/// Text fields that receive trust language, in order of preference.
const TRUST_TEXT_KEYS: &[&str] = &["subheadline", "description", "heading", "headline"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Transform {
    DramatizeHero,
    IncreaseContrast,
    AddSocialProof,
    TightenAboveFold,
    SwapVariant {
        id: String,
        variant: String,
    },
    Reorder {
        from: usize,
        to: usize,
    },
    UpdateContent {
        id: String,
        patch: Map<String, Value>,
    },
    ApplyTonePreset {
        tone: Tone,
    },
    OptimizeForConversion,
    AddUrgencyBanner {
        #[serde(default)]
        text: Option<String>,
    },
}

impl Transform {
    /// The wire `op` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Transform::DramatizeHero => "dramatize-hero",
            Transform::IncreaseContrast => "increase-contrast",
            Transform::AddSocialProof => "add-social-proof",
            Transform::TightenAboveFold => "tighten-above-fold",
            Transform::SwapVariant { .. } => "swap-variant",
            Transform::Reorder { .. } => "reorder",
            Transform::UpdateContent { .. } => "update-content",
            Transform::ApplyTonePreset { .. } => "apply-tone-preset",
            Transform::OptimizeForConversion => "optimize-for-conversion",
            Transform::AddUrgencyBanner { .. } => "add-urgency-banner",
        }
    }

    /// Applies the transform to a copy of `layout`.
    pub fn apply(&self, layout: &Layout, catalog: &Catalog) -> Layout {
        let mut next = layout.clone();
        match self {
            Transform::DramatizeHero => dramatize_hero(&mut next),
            Transform::IncreaseContrast => increase_contrast(&mut next),
            Transform::AddSocialProof => add_social_proof(&mut next, catalog),
            Transform::TightenAboveFold => tighten_above_fold(&mut next),
            Transform::SwapVariant { id, variant } => swap_variant(&mut next, id, variant, catalog),
            Transform::Reorder { from, to } => move_block(&mut next, *from, *to),
            Transform::UpdateContent { id, patch } => update_content(&mut next, id, patch),
            Transform::ApplyTonePreset { tone } => {
                for block in &mut next.sections {
                    block.tone = *tone;
                }
            }
            Transform::OptimizeForConversion => optimize_for_conversion(&mut next, catalog),
            Transform::AddUrgencyBanner { text } => {
                add_urgency_banner(&mut next, text.as_deref(), catalog)
            }
        }
        next.renumber();
        next
    }
}

/// Folds `transforms` over `layout` in order.
pub fn apply_all(layout: &Layout, transforms: &[Transform], catalog: &Catalog) -> Layout {
    transforms
        .iter()
        .fold(layout.clone(), |current, t| t.apply(&current, catalog))
}

// ────────────────────────────────────────────────────────────────────────────
// Base registry
// ────────────────────────────────────────────────────────────────────────────

fn dramatize_hero(layout: &mut Layout) {
    let clause = tone_profile(Tone::MOST_ASSERTIVE).emphatic_clause;
    for block in layout
        .sections
        .iter_mut()
        .filter(|b| b.kind == BlockKind::Hero)
    {
        block.tone = Tone::MOST_ASSERTIVE;
        if let Some(Value::String(headline)) = block.content.get_mut(HEADLINE_KEY) {
            if !headline.trim().is_empty() && !headline.ends_with(clause) {
                headline.push(' ');
                headline.push_str(clause);
            }
        }
    }
}

fn increase_contrast(layout: &mut Layout) {
    for block in &mut layout.sections {
        if block.kind == BlockKind::Cta {
            block.tone = Tone::MOST_ASSERTIVE;
        } else if block.tone == Tone::Minimal {
            block.tone = block.tone.promoted();
        }
    }
}

/// Inserts a testimonials block before the first cta when the catalog has one
/// and the layout has none; otherwise appends trust language to hero/features.
fn add_social_proof(layout: &mut Layout, catalog: &Catalog) {
    if !layout.contains_kind(BlockKind::Testimonials) {
        if let Some(template) = catalog.first_of_kind(BlockKind::Testimonials) {
            let block = synthesize(layout, template, layout_tone(layout));
            let at = layout
                .index_of_kind(BlockKind::Cta)
                .unwrap_or(layout.sections.len());
            layout.sections.insert(at, block);
            return;
        }
    }

    for block in layout
        .sections
        .iter_mut()
        .filter(|b| matches!(b.kind, BlockKind::Hero | BlockKind::Features))
    {
        let phrase = tone_profile(block.tone).trust_phrase;
        append_trust_phrase(block, phrase);
    }
}

fn append_trust_phrase(block: &mut BlockInstance, phrase: &str) {
    let key = TRUST_TEXT_KEYS
        .iter()
        .copied()
        .find(|k| block.text(k).is_some());

    if let Some(Value::String(text)) = key.and_then(|k| block.content.get_mut(k)) {
        if !text.contains(phrase) {
            if !text.trim().is_empty() {
                text.push(' ');
            }
            text.push_str(phrase);
        }
        return;
    }
    block
        .content
        .insert(TRUST_TEXT_KEYS[0].to_string(), Value::String(phrase.to_string()));
}

fn tighten_above_fold(layout: &mut Layout) {
    for block in layout
        .sections
        .iter_mut()
        .filter(|b| b.kind == BlockKind::Hero)
    {
        if let Some(Value::Array(bullets)) = block.content.get_mut(BULLETS_KEY) {
            bullets.truncate(ABOVE_FOLD_BULLETS);
        }
    }
    if let Some(idx) = layout.index_of_kind(BlockKind::Cta) {
        if idx > ABOVE_FOLD_INDEX {
            move_block(layout, idx, ABOVE_FOLD_INDEX);
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Parameterized transforms
// ────────────────────────────────────────────────────────────────────────────

fn swap_variant(layout: &mut Layout, id: &str, variant: &str, catalog: &Catalog) {
    let Some(block) = layout.sections.iter_mut().find(|b| b.id == id) else {
        return;
    };
    match catalog.find_variant(block.kind, variant) {
        Some(template) => {
            block.template_id = template.id.clone();
            block.variant = template.variant.clone();
            block.weight = template.weight;
        }
        None => warn!(
            block = id,
            kind = %block.kind,
            variant,
            "swap-variant: catalog has no such variant, layout unchanged"
        ),
    }
}

/// Moves the block at `from` to `to`. Both indices are clamped into range.
fn move_block(layout: &mut Layout, from: usize, to: usize) {
    let len = layout.sections.len();
    if len == 0 {
        return;
    }
    let from = from.min(len - 1);
    let to = to.min(len - 1);
    if from == to {
        return;
    }
    let block = layout.sections.remove(from);
    layout.sections.insert(to, block);
    layout.renumber();
}

/// Shallow merge: top-level keys of `patch` overwrite the block's content.
fn update_content(layout: &mut Layout, id: &str, patch: &Map<String, Value>) {
    if let Some(block) = layout.sections.iter_mut().find(|b| b.id == id) {
        for (key, value) in patch {
            block.content.insert(key.clone(), value.clone());
        }
    }
}

fn optimize_for_conversion(layout: &mut Layout, catalog: &Catalog) {
    if !layout.contains_kind(BlockKind::Cta) {
        match catalog.first_of_kind(BlockKind::Cta) {
            Some(template) => {
                let block = synthesize(layout, template, Tone::MOST_ASSERTIVE);
                layout.sections.push(block);
            }
            None => warn!("optimize-for-conversion: catalog has no cta template"),
        }
    }
    if let Some(idx) = layout.index_of_kind(BlockKind::Cta) {
        move_block(layout, idx, ABOVE_FOLD_INDEX);
    }
    dramatize_hero(layout);
}

/// Prepends a high-emphasis cta. Prefers a banner variant.
fn add_urgency_banner(layout: &mut Layout, text: Option<&str>, catalog: &Catalog) {
    let template = catalog
        .by_kind(BlockKind::Cta)
        .map(|(_, t)| t)
        .find(|t| t.variant.to_lowercase().contains("banner"))
        .or_else(|| catalog.first_of_kind(BlockKind::Cta));
    let Some(template) = template else {
        warn!("add-urgency-banner: catalog has no cta template");
        return;
    };

    let headline = text
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(tone_profile(Tone::MOST_ASSERTIVE).urgency_copy);
    let mut block = synthesize(layout, template, Tone::MOST_ASSERTIVE);
    block
        .content
        .insert(HEADLINE_KEY.to_string(), Value::String(headline.to_string()));
    layout.sections.insert(0, block);
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

/// Builds a new block from a template's default content with a fresh id.
fn synthesize(layout: &Layout, template: &BlockTemplate, tone: Tone) -> BlockInstance {
    BlockInstance::from_template(
        layout.fresh_id(template.kind),
        template,
        tone,
        template.default_content.clone(),
    )
}

/// Tone of the first block, or the default tone for an empty layout.
fn layout_tone(layout: &Layout) -> Tone {
    layout
        .sections
        .first()
        .map(|b| b.tone)
        .unwrap_or_default()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
