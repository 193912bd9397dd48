//! Section planner — decides which block kinds the search places, in order.

use crate::catalog::Catalog;
use crate::models::catalog::BlockKind;
use crate::models::content::ContentGraph;

/// Kinds requested when the caller does not name any.
pub const DEFAULT_REQUIRED_KINDS: [BlockKind; 3] =
    [BlockKind::Hero, BlockKind::Features, BlockKind::Cta];

/// Builds the ordered list of kinds to place.
///
/// 1. Start from `required` as given.
/// 2. Insert `about` right after position 0 when the content has about-content.
/// 3. Insert `testimonials` after that when the content has testimonials.
/// 4. Append `footer` if absent.
/// 5. Truncate to `max_depth`.
///
/// Kinds added in steps 2–4 are skipped when the catalog offers no template for
/// them; required kinds are kept so the search can report them as missing.
pub fn plan_sections(
    required: &[BlockKind],
    content: &ContentGraph,
    catalog: &Catalog,
    max_depth: usize,
) -> Vec<BlockKind> {
    let mut plan = required.to_vec();
    let mut insert_at = plan.len().min(1);

    for optional in [BlockKind::About, BlockKind::Testimonials] {
        if content.has(optional) && !plan.contains(&optional) && catalog.has_kind(optional) {
            plan.insert(insert_at, optional);
            insert_at += 1;
        }
    }

    if !plan.contains(&BlockKind::Footer) && catalog.has_kind(BlockKind::Footer) {
        plan.push(BlockKind::Footer);
    }

    plan.truncate(max_depth);
    plan
}
