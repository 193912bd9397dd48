//! Layout diffing and heuristic impact estimation.
//!
//! Blocks are matched across the two layouts by id. The impact numbers are
//! rough heuristics in [0, 1], meant for a "what will this do" preview.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::catalog::BlockKind;
use crate::models::layout::{BlockInstance, Layout};

/// Index below which a block counts as above the fold.
const FOLD_INDEX: usize = 1;
/// Heavy blocks tolerated before aesthetics start to suffer.
const HEAVY_ALLOWANCE: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiffEntry {
    Moved {
        id: String,
        kind: BlockKind,
        from: usize,
        to: usize,
    },
    Added {
        id: String,
        kind: BlockKind,
        position: usize,
    },
    Removed {
        id: String,
        kind: BlockKind,
        position: usize,
    },
    Changed {
        id: String,
        kind: BlockKind,
        fields: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactEstimate {
    pub aesthetics: f64,
    pub performance: f64,
    pub conversion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformAnalysis {
    pub summary: Vec<String>,
    pub diff: Vec<DiffEntry>,
    pub est_impact: ImpactEstimate,
}

/// Structural diff between two layouts. Entries for blocks present in `after`
/// come in `after` order; removals follow in `before` order.
pub fn diff_layouts(before: &Layout, after: &Layout) -> Vec<DiffEntry> {
    let previous: HashMap<&str, (usize, &BlockInstance)> = before
        .sections
        .iter()
        .enumerate()
        .map(|(i, b)| (b.id.as_str(), (i, b)))
        .collect();
    let current_ids: BTreeSet<&str> = after.sections.iter().map(|b| b.id.as_str()).collect();

    let mut diff = Vec::new();
    for (to, block) in after.sections.iter().enumerate() {
        match previous.get(block.id.as_str()) {
            None => diff.push(DiffEntry::Added {
                id: block.id.clone(),
                kind: block.kind,
                position: to,
            }),
            Some((from, old)) => {
                if *from != to {
                    diff.push(DiffEntry::Moved {
                        id: block.id.clone(),
                        kind: block.kind,
                        from: *from,
                        to,
                    });
                }
                let fields = changed_fields(old, block);
                if !fields.is_empty() {
                    diff.push(DiffEntry::Changed {
                        id: block.id.clone(),
                        kind: block.kind,
                        fields,
                    });
                }
            }
        }
    }

    for (position, block) in before.sections.iter().enumerate() {
        if !current_ids.contains(block.id.as_str()) {
            diff.push(DiffEntry::Removed {
                id: block.id.clone(),
                kind: block.kind,
                position,
            });
        }
    }
    diff
}

fn changed_fields(old: &BlockInstance, new: &BlockInstance) -> Vec<String> {
    let mut fields = Vec::new();
    if old.tone != new.tone {
        fields.push("tone".to_string());
    }
    if old.variant != new.variant || old.template_id != new.template_id {
        fields.push("variant".to_string());
    }
    let keys: BTreeSet<&String> = old.content.keys().chain(new.content.keys()).collect();
    for key in keys {
        if old.content.get(key) != new.content.get(key) {
            fields.push(format!("content.{key}"));
        }
    }
    if old.media != new.media {
        fields.push("media".to_string());
    }
    if old.actions != new.actions {
        fields.push("actions".to_string());
    }
    fields
}

/// Summarizes what changed between `before` and `after` and estimates the
/// effect on aesthetics, performance and conversion.
pub fn analyze_transform(before: &Layout, after: &Layout) -> TransformAnalysis {
    let diff = diff_layouts(before, after);

    let mut moved = 0usize;
    let mut tone_changes = 0usize;
    let mut variant_changes = 0usize;
    let mut content_changes = BTreeSet::new();
    let mut added = Vec::new();
    let mut removed = Vec::new();
    for entry in &diff {
        match entry {
            DiffEntry::Moved { .. } => moved += 1,
            DiffEntry::Added { kind, .. } => added.push(*kind),
            DiffEntry::Removed { kind, .. } => removed.push(*kind),
            DiffEntry::Changed { kind, fields, .. } => {
                if fields.iter().any(|f| f == "tone") {
                    tone_changes += 1;
                }
                if fields.iter().any(|f| f == "variant") {
                    variant_changes += 1;
                }
                if fields.iter().any(|f| f.starts_with("content.")) {
                    content_changes.insert(*kind);
                }
            }
        }
    }

    let mut summary = Vec::new();
    for kind in &added {
        summary.push(format!("Added {kind} section"));
    }
    for kind in &removed {
        summary.push(format!("Removed {kind} section"));
    }
    if moved > 0 {
        summary.push(format!("Section order changed ({moved} moved)"));
    }
    if tone_changes > 0 {
        summary.push(format!("Tone adjusted on {tone_changes} section(s)"));
    }
    if variant_changes > 0 {
        summary.push(format!("Variant swapped on {variant_changes} section(s)"));
    }
    if !content_changes.is_empty() {
        let kinds: Vec<&str> = content_changes.iter().map(BlockKind::as_str).collect();
        summary.push(format!("Content updated in {}", kinds.join(", ")));
    }
    let cta_was_above_fold = cta_above_fold(before);
    let cta_is_above_fold = cta_above_fold(after);
    if cta_is_above_fold && !cta_was_above_fold {
        summary.push("Call to action is now above the fold".to_string());
    }
    if summary.is_empty() {
        summary.push("No changes".to_string());
    }

    let heavy = after.sections.iter().filter(|b| b.weight.is_heavy()).count();
    let reordered = if moved > 0 { 1.0 } else { 0.0 };

    let aesthetics = 0.5 + 0.1 * (tone_changes + variant_changes) as f64 + 0.05 * reordered
        - 0.1 * heavy.saturating_sub(HEAVY_ALLOWANCE) as f64;
    let performance = 1.0 - 0.1 * heavy as f64 - 0.05 * added.len() as f64;
    let mut conversion = 0.4 + 0.1 * reordered + 0.05 * tone_changes as f64;
    if cta_is_above_fold {
        conversion += 0.3;
    }

    TransformAnalysis {
        summary,
        diff,
        est_impact: ImpactEstimate {
            aesthetics: unit(aesthetics),
            performance: unit(performance),
            conversion: unit(conversion),
        },
    }
}

fn cta_above_fold(layout: &Layout) -> bool {
    layout
        .index_of_kind(BlockKind::Cta)
        .is_some_and(|i| i <= FOLD_INDEX)
}

fn unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
