//! Layout Assembler — constraint-pruned beam search over catalog templates.
//!
//! # Algorithm
//! 1. Plan the ordered list of kinds (`planner::plan_sections`).
//! 2. For each kind, expand every beam with every template of that kind.
//! 3. Children carrying any HARD violation are discarded.
//! 4. The top `beam_width` children by score survive; ties go to the child whose
//!    template path comes first in catalog declaration order.
//! 5. Survivors are re-scored (coverage bonus, violation penalties) and sorted;
//!    the best is the primary layout, the next two are alternates.
//!
//! Candidate expansion within a step runs on the rayon pool. Children are
//! collected in generation order and ranked with a total order, so the result
//! is identical to a sequential run.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::assembler::constraints::{candidate_violations, is_hard};
use crate::assembler::planner::plan_sections;
use crate::assembler::scoring::{final_score, score_candidate, ScoringWeights};
use crate::assembler::slots::map_slots;
use crate::catalog::Catalog;
use crate::models::catalog::{BlockKind, BlockTemplate};
use crate::models::content::{ContentGraph, StyleTokens, Tone};
use crate::models::layout::{BlockInstance, Layout};

pub const DEFAULT_BEAM_WIDTH: usize = 5;
pub const DEFAULT_MAX_DEPTH: usize = 7;
const ALTERNATE_COUNT: usize = 2;

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Fatal search failures. Never retried; the caller receives no layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("No template in the catalog for required kind '{0}'")]
    MissingKind(BlockKind),

    #[error("Search exhausted at kind '{0}': every candidate violates a hard constraint")]
    SearchExhausted(BlockKind),
}

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyConfig {
    pub beam_width: usize,
    pub max_depth: usize,
    #[serde(default)]
    pub weights: ScoringWeights,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            beam_width: DEFAULT_BEAM_WIDTH,
            max_depth: DEFAULT_MAX_DEPTH,
            weights: ScoringWeights::default(),
        }
    }
}

/// A partially or fully built layout carried through one generation.
#[derive(Debug, Clone)]
struct Beam {
    layout: Layout,
    score: f64,
    satisfied: BTreeSet<String>,
    violations: Vec<String>,
    /// Catalog index of each placed template, in layout order.
    path: Vec<usize>,
}

impl Beam {
    fn empty() -> Self {
        Beam {
            layout: Layout::default(),
            score: 0.0,
            satisfied: BTreeSet::new(),
            violations: Vec::new(),
            path: Vec::new(),
        }
    }
}

/// Score and violations of one surviving candidate, reported alongside layouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateReport {
    pub score: f64,
    pub template_ids: Vec<String>,
    pub satisfied_content: Vec<String>,
    pub violations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyResult {
    pub primary: Layout,
    pub alternates: Vec<Layout>,
    /// One report per returned layout, primary first.
    pub candidates: Vec<CandidateReport>,
    pub plan: Vec<BlockKind>,
    pub tone: Tone,
    pub style: StyleTokens,
}

// ────────────────────────────────────────────────────────────────────────────
// Assembler
// ────────────────────────────────────────────────────────────────────────────

pub struct Assembler<'a> {
    catalog: &'a Catalog,
    config: AssemblyConfig,
}

impl<'a> Assembler<'a> {
    pub fn new(catalog: &'a Catalog, config: AssemblyConfig) -> Self {
        Self { catalog, config }
    }

    /// Searches for the best layout covering `required_kinds`.
    pub fn search(
        &self,
        content: &ContentGraph,
        style: &StyleTokens,
        tone: Tone,
        required_kinds: &[BlockKind],
    ) -> Result<AssemblyResult, AssemblyError> {
        let plan = plan_sections(required_kinds, content, self.catalog, self.config.max_depth);
        let beam_width = self.config.beam_width.max(1);
        debug!(?plan, beam_width, %tone, "Starting layout search");

        let mut frontier = vec![Beam::empty()];

        for &kind in &plan {
            let candidates: Vec<(usize, &BlockTemplate)> = self.catalog.by_kind(kind).collect();
            if candidates.is_empty() {
                return Err(AssemblyError::MissingKind(kind));
            }

            let jobs: Vec<(&Beam, usize, &BlockTemplate)> = frontier
                .iter()
                .flat_map(|beam| candidates.iter().map(move |&(idx, t)| (beam, idx, t)))
                .collect();

            let mut children: Vec<Beam> = jobs
                .par_iter()
                .filter_map(|&(beam, idx, template)| {
                    self.expand(beam, idx, template, content, tone)
                })
                .collect();

            debug!(
                %kind,
                expanded = jobs.len(),
                survivors = children.len(),
                "Beam step complete"
            );

            if children.is_empty() {
                return Err(AssemblyError::SearchExhausted(kind));
            }

            children.sort_by(|a, b| rank(a.score, &a.path, b.score, &b.path));
            children.truncate(beam_width);
            frontier = children;
        }

        let mut finished: Vec<(f64, Beam)> = frontier
            .into_iter()
            .map(|beam| {
                let total = final_score(beam.score, &beam.layout, &beam.violations);
                (total, beam)
            })
            .collect();
        finished.sort_by(|(sa, a), (sb, b)| rank(*sa, &a.path, *sb, &b.path));
        finished.truncate(1 + ALTERNATE_COUNT);

        let candidates: Vec<CandidateReport> = finished
            .iter()
            .map(|(score, beam)| CandidateReport {
                score: *score,
                template_ids: beam
                    .path
                    .iter()
                    .map(|&i| self.catalog.templates()[i].id.clone())
                    .collect(),
                satisfied_content: beam.satisfied.iter().cloned().collect(),
                violations: beam.violations.clone(),
            })
            .collect();

        let mut layouts = finished.into_iter().map(|(_, beam)| beam.layout);
        // The plan loop either returned an error or left at least one beam.
        let primary = layouts.next().unwrap_or_default();
        let alternates: Vec<Layout> = layouts.collect();

        info!(
            sections = primary.len(),
            alternates = alternates.len(),
            score = candidates.first().map(|c| c.score).unwrap_or_default(),
            "Layout search complete"
        );

        Ok(AssemblyResult {
            primary,
            alternates,
            candidates,
            plan,
            tone,
            style: style.clone(),
        })
    }

    /// Appends `template` to a copy of `beam`. Returns `None` when the child
    /// carries a HARD violation.
    fn expand(
        &self,
        beam: &Beam,
        catalog_index: usize,
        template: &BlockTemplate,
        content: &ContentGraph,
        tone: Tone,
    ) -> Option<Beam> {
        let placed: Vec<&BlockTemplate> = beam
            .path
            .iter()
            .map(|&i| &self.catalog.templates()[i])
            .collect();

        let mapping = map_slots(template, content);
        let new_violations = candidate_violations(&placed, template, &mapping);
        if new_violations.iter().any(|v| is_hard(v)) {
            return None;
        }

        let breakdown = score_candidate(&placed, template, mapping.content_fit, tone);

        let mut child = beam.clone();
        let id = child.layout.fresh_id(template.kind);
        let mut instance = BlockInstance::from_template(id, template, tone, mapping.content);
        instance.media = mapping.media;
        instance.actions = mapping.actions;
        instance.position = child.layout.len();
        child.layout.sections.push(instance);

        child.score += breakdown.combined(&self.config.weights);
        child.satisfied.extend(mapping.satisfied_keys);
        child.violations.extend(new_violations);
        child.path.push(catalog_index);
        Some(child)
    }
}

/// Higher score first; equal scores go to the earlier catalog path.
fn rank(score_a: f64, path_a: &[usize], score_b: f64, path_b: &[usize]) -> Ordering {
    score_b.total_cmp(&score_a).then_with(|| path_a.cmp(path_b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::planner::DEFAULT_REQUIRED_KINDS;
    use crate::models::catalog::TAG_SINGLE_HEADING;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn scenario_content() -> ContentGraph {
        ContentGraph::from(json!({
            "hero": {"headline": "Welcome"},
            "features": {"items": ["A", "B", "C"]},
            "cta": {"headline": "Go"}
        }))
    }

    fn search(catalog: &Catalog, content: &ContentGraph, tone: Tone) -> AssemblyResult {
        Assembler::new(catalog, AssemblyConfig::default())
            .search(content, &StyleTokens::default(), tone, &DEFAULT_REQUIRED_KINDS)
            .unwrap()
    }

    fn hard_count(report: &CandidateReport) -> usize {
        report.violations.iter().filter(|v| is_hard(v)).count()
    }

    #[test]
    fn test_scenario_bold_hero_first_cta_last_before_footer() {
        let catalog = Catalog::builtin().unwrap();
        let result = search(&catalog, &scenario_content(), Tone::Bold);

        let primary = &result.primary;
        assert_eq!(primary.sections[0].kind, BlockKind::Hero);
        let last_non_footer = primary
            .sections
            .iter()
            .rev()
            .find(|b| b.kind != BlockKind::Footer)
            .unwrap();
        assert_eq!(last_non_footer.kind, BlockKind::Cta);
        assert_eq!(hard_count(&result.candidates[0]), 0);
    }

    #[test]
    fn test_positions_dense_in_all_returned_layouts() {
        let catalog = Catalog::builtin().unwrap();
        let result = search(&catalog, &scenario_content(), Tone::Professional);
        assert!(result.primary.positions_are_dense());
        assert!(result.alternates.iter().all(Layout::positions_are_dense));
    }

    #[test]
    fn test_returns_up_to_two_alternates_sorted_by_score() {
        let catalog = Catalog::builtin().unwrap();
        let result = search(&catalog, &scenario_content(), Tone::Bold);
        assert_eq!(result.alternates.len(), 2);
        assert_eq!(result.candidates.len(), 3);
        assert!(result.candidates[0].score >= result.candidates[1].score);
        assert!(result.candidates[1].score >= result.candidates[2].score);
    }

    #[test]
    fn test_at_most_one_single_heading_block() {
        let catalog = Catalog::builtin().unwrap();
        // Asking for two heroes: the second would break the single-heading rule.
        let err = Assembler::new(&catalog, AssemblyConfig::default())
            .search(
                &scenario_content(),
                &StyleTokens::default(),
                Tone::Bold,
                &[BlockKind::Hero, BlockKind::Hero, BlockKind::Cta],
            )
            .unwrap_err();
        assert_eq!(err, AssemblyError::SearchExhausted(BlockKind::Hero));

        let result = search(&catalog, &scenario_content(), Tone::Bold);
        for layout in std::iter::once(&result.primary).chain(result.alternates.iter()) {
            let headings = layout
                .sections
                .iter()
                .filter(|b| {
                    catalog
                        .get(&b.template_id)
                        .map(|t| t.has_hard(TAG_SINGLE_HEADING))
                        .unwrap_or(false)
                })
                .count();
            assert!(headings <= 1);
        }
    }

    #[test]
    fn test_missing_features_kind_is_named() {
        let catalog = Catalog::from_json(
            r#"{"templates": [
                {"id": "h", "kind": "hero", "variant": "split-bold"},
                {"id": "c", "kind": "cta", "variant": "banner-bold"}
            ]}"#,
        )
        .unwrap();
        let content = ContentGraph::from(json!({
            "hero": {"headline": "Welcome"},
            "cta": {"headline": "Go"}
        }));
        let err = Assembler::new(&catalog, AssemblyConfig::default())
            .search(&content, &StyleTokens::default(), Tone::Bold, &DEFAULT_REQUIRED_KINDS)
            .unwrap_err();
        assert_eq!(err, AssemblyError::MissingKind(BlockKind::Features));
        assert!(err.to_string().contains("features"));
    }

    #[test]
    fn test_exhausted_when_every_hero_needs_alt_text() {
        let catalog = Catalog::from_json(
            r#"{"templates": [
                {"id": "h", "kind": "hero", "variant": "split-bold",
                 "hard_constraints": ["image-alt-required"]},
                {"id": "c", "kind": "cta", "variant": "banner-bold"}
            ]}"#,
        )
        .unwrap();
        let content = ContentGraph::from(json!({"hero": {"headline": "Hi", "media": "a.png"}}));
        let err = Assembler::new(&catalog, AssemblyConfig::default())
            .search(&content, &StyleTokens::default(), Tone::Bold, &[BlockKind::Hero])
            .unwrap_err();
        assert_eq!(err, AssemblyError::SearchExhausted(BlockKind::Hero));
    }

    #[test]
    fn test_media_without_alt_prunes_to_untagged_hero() {
        let catalog = Catalog::builtin().unwrap();
        let content = ContentGraph::from(json!({
            "hero": {"headline": "Welcome", "media": "hero.png"},
            "features": {"items": ["A", "B", "C"]},
            "cta": {"headline": "Go"}
        }));
        let result = search(&catalog, &content, Tone::Bold);
        assert_eq!(result.primary.sections[0].template_id, "hero-centered-minimal");
        assert!(result.primary.sections[0].media.is_some());
    }

    #[test]
    fn test_ties_break_by_catalog_order() {
        // Two indistinguishable templates: the first declared must win.
        let catalog = Catalog::from_json(
            r#"{"templates": [
                {"id": "first", "kind": "hero", "variant": "alpha"},
                {"id": "second", "kind": "hero", "variant": "beta"}
            ]}"#,
        )
        .unwrap();
        let result = Assembler::new(&catalog, AssemblyConfig::default())
            .search(
                &ContentGraph::default(),
                &StyleTokens::default(),
                Tone::Minimal,
                &[BlockKind::Hero],
            )
            .unwrap();
        assert_eq!(result.primary.sections[0].template_id, "first");
        assert_eq!(result.alternates[0].sections[0].template_id, "second");
    }

    #[test]
    fn test_search_is_deterministic() {
        let catalog = Catalog::builtin().unwrap();
        let a = search(&catalog, &scenario_content(), Tone::Friendly);
        let b = search(&catalog, &scenario_content(), Tone::Friendly);
        assert_eq!(a.primary, b.primary);
        assert_eq!(a.alternates, b.alternates);
        assert_eq!(a.candidates, b.candidates);
    }

    #[test]
    fn test_cta_actions_attached() {
        let catalog = Catalog::builtin().unwrap();
        let content = ContentGraph::from(json!({
            "hero": {"headline": "Welcome"},
            "features": {"items": ["A", "B", "C"]},
            "cta": {"headline": "Go", "primaryAction": {"label": "Start", "href": "/start"}}
        }));
        let result = search(&catalog, &content, Tone::Bold);
        let cta = result.primary.first_of_kind(BlockKind::Cta).unwrap();
        assert_eq!(cta.actions.len(), 1);
        assert_eq!(cta.actions[0].label, "Start");
    }

    #[test]
    fn test_about_content_is_placed_after_hero() {
        let catalog = Catalog::builtin().unwrap();
        let content = ContentGraph::from(json!({
            "hero": {"headline": "Welcome"},
            "about": {"body": "We have been building tools since 2009."},
            "features": {"items": ["A", "B", "C"]},
            "cta": {"headline": "Go"}
        }));
        let result = search(&catalog, &content, Tone::Friendly);
        assert_eq!(result.primary.sections[1].kind, BlockKind::About);
        assert_eq!(
            result.plan,
            vec![
                BlockKind::Hero,
                BlockKind::About,
                BlockKind::Features,
                BlockKind::Cta,
                BlockKind::Footer
            ]
        );
    }

    #[test]
    fn test_tone_biases_variant_choice() {
        let catalog = Catalog::builtin().unwrap();
        let bold = search(&catalog, &scenario_content(), Tone::Bold);
        let minimal = search(&catalog, &scenario_content(), Tone::Minimal);
        assert_eq!(bold.primary.sections[0].variant, "split-bold");
        assert_eq!(minimal.primary.sections[0].variant, "centered-minimal");
    }

    #[test]
    fn test_style_tokens_echoed() {
        let catalog = Catalog::builtin().unwrap();
        let mut style = StyleTokens::default();
        style.colors.insert("primary".to_string(), "#0044ff".to_string());
        let result = Assembler::new(&catalog, AssemblyConfig::default())
            .search(&scenario_content(), &style, Tone::Bold, &DEFAULT_REQUIRED_KINDS)
            .unwrap();
        assert_eq!(result.style, style);
    }

    #[test]
    fn test_rank_orders_by_score_then_path() {
        assert_eq!(rank(2.0, &[1], 1.0, &[0]), Ordering::Less);
        assert_eq!(rank(1.0, &[0, 2], 1.0, &[1, 0]), Ordering::Less);
        assert_eq!(rank(1.0, &[1], 1.0, &[1]), Ordering::Equal);
    }
}
