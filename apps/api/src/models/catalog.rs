use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ────────────────────────────────────────────────────────────────────────────
// Constraint and accessibility tags
// ────────────────────────────────────────────────────────────────────────────

/// Hard: at most one block carrying this tag may appear on a page.
pub const TAG_SINGLE_HEADING: &str = "single-h1";
/// Hard: hero media and image slots must carry alt text.
pub const TAG_IMAGE_ALT: &str = "image-alt-required";
/// Soft: penalize two heavy blocks back to back.
pub const TAG_NO_ADJACENT_HEAVY: &str = "no-adjacent-heavy";
/// Soft: penalize placement before any hero block.
pub const TAG_PREFER_AFTER_HERO: &str = "prefer-after-hero";
/// Soft: penalize a second block of the same kind.
pub const TAG_ONE_PER_PAGE: &str = "one-per-page";

pub const A11Y_CONTRAST: &str = "contrast";
pub const A11Y_KEYBOARD: &str = "keyboard-nav";

// ────────────────────────────────────────────────────────────────────────────
// Enums
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Hero,
    Features,
    About,
    Testimonials,
    Pricing,
    Stats,
    Faq,
    Gallery,
    Cta,
    Footer,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Hero => "hero",
            BlockKind::Features => "features",
            BlockKind::About => "about",
            BlockKind::Testimonials => "testimonials",
            BlockKind::Pricing => "pricing",
            BlockKind::Stats => "stats",
            BlockKind::Faq => "faq",
            BlockKind::Gallery => "gallery",
            BlockKind::Cta => "cta",
            BlockKind::Footer => "footer",
        }
    }

    /// Lenient parse used by the command interpreter: accepts singular forms
    /// and a few common synonyms.
    pub fn parse(word: &str) -> Option<BlockKind> {
        let word = word.trim().to_lowercase();
        let kind = match word.as_str() {
            "hero" | "header" | "banner" => BlockKind::Hero,
            "features" | "feature" => BlockKind::Features,
            "about" => BlockKind::About,
            "testimonials" | "testimonial" | "reviews" | "quotes" => BlockKind::Testimonials,
            "pricing" | "prices" | "plans" => BlockKind::Pricing,
            "stats" | "numbers" | "metrics" => BlockKind::Stats,
            "faq" | "faqs" => BlockKind::Faq,
            "gallery" => BlockKind::Gallery,
            "cta" | "call-to-action" | "button" => BlockKind::Cta,
            "footer" => BlockKind::Footer,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual weight tier of a block. Numeric weights run 1 (xs) to 5 (xl).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualWeight {
    Xs,
    Sm,
    #[default]
    Md,
    Lg,
    Xl,
}

impl VisualWeight {
    pub fn value(&self) -> u8 {
        match self {
            VisualWeight::Xs => 1,
            VisualWeight::Sm => 2,
            VisualWeight::Md => 3,
            VisualWeight::Lg => 4,
            VisualWeight::Xl => 5,
        }
    }

    /// The heaviest tier.
    pub fn is_max(&self) -> bool {
        matches!(self, VisualWeight::Xl)
    }

    /// Lg or Xl. Counted by the impact heuristics.
    pub fn is_heavy(&self) -> bool {
        matches!(self, VisualWeight::Lg | VisualWeight::Xl)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotType {
    Text,
    TextList,
    Image,
    Video,
    Icon,
    QuoteList,
    StatList,
}

// ────────────────────────────────────────────────────────────────────────────
// Template data
// ────────────────────────────────────────────────────────────────────────────

/// A named, typed content requirement declared by a template.
///
/// For text slots `min_len`/`max_len` bound the character count; for list
/// slots they bound the number of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSpec {
    pub key: String,
    #[serde(rename = "type")]
    pub slot_type: SlotType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub min_len: Option<usize>,
    #[serde(default)]
    pub max_len: Option<usize>,
    /// Regex that text values must match.
    #[serde(default)]
    pub pattern: Option<String>,
    /// `pattern`, compiled when the catalog loads.
    #[serde(skip)]
    pub compiled: Option<SlotPattern>,
}

impl SlotSpec {
    pub fn compile_pattern(&mut self) -> Result<(), regex::Error> {
        self.compiled = self
            .pattern
            .as_deref()
            .map(Regex::new)
            .transpose()?
            .map(SlotPattern);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SlotPattern(Regex);

impl SlotPattern {
    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl PartialEq for SlotPattern {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

/// A catalog entry. Immutable once the catalog is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockTemplate {
    pub id: String,
    pub kind: BlockKind,
    pub variant: String,
    #[serde(default)]
    pub slots: Vec<SlotSpec>,
    #[serde(default)]
    pub hard_constraints: Vec<String>,
    #[serde(default)]
    pub soft_constraints: Vec<String>,
    #[serde(default)]
    pub a11y_tags: Vec<String>,
    #[serde(default)]
    pub weight: VisualWeight,
    #[serde(default)]
    pub animated: bool,
    #[serde(default)]
    pub requires_script: bool,
    /// Content copied into blocks that transforms synthesize from this template.
    #[serde(default)]
    pub default_content: Map<String, Value>,
}

impl BlockTemplate {
    pub fn has_hard(&self, tag: &str) -> bool {
        self.hard_constraints.iter().any(|t| t == tag)
    }

    pub fn has_soft(&self, tag: &str) -> bool {
        self.soft_constraints.iter().any(|t| t == tag)
    }

    pub fn has_a11y(&self, tag: &str) -> bool {
        self.a11y_tags.iter().any(|t| t == tag)
    }

    pub fn required_slots(&self) -> impl Iterator<Item = &SlotSpec> {
        self.slots.iter().filter(|s| s.required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_accepts_synonyms() {
        assert_eq!(BlockKind::parse("Testimonial"), Some(BlockKind::Testimonials));
        assert_eq!(BlockKind::parse("call-to-action"), Some(BlockKind::Cta));
        assert_eq!(BlockKind::parse("section"), None);
    }

    #[test]
    fn test_kind_serde_is_snake_case() {
        let json = serde_json::to_string(&BlockKind::Cta).unwrap();
        assert_eq!(json, r#""cta""#);
        let kind: BlockKind = serde_json::from_str(r#""testimonials""#).unwrap();
        assert_eq!(kind, BlockKind::Testimonials);
    }

    #[test]
    fn test_weight_values_run_one_to_five() {
        assert_eq!(VisualWeight::Xs.value(), 1);
        assert_eq!(VisualWeight::Xl.value(), 5);
        assert!(VisualWeight::Xl.is_max());
        assert!(VisualWeight::Lg.is_heavy());
        assert!(!VisualWeight::Md.is_heavy());
    }

    #[test]
    fn test_slot_type_serde_is_kebab_case() {
        let slot: SlotSpec =
            serde_json::from_str(r#"{"key": "bullets", "type": "text-list", "required": true}"#)
                .unwrap();
        assert_eq!(slot.slot_type, SlotType::TextList);
        assert!(slot.required);
        assert!(slot.pattern.is_none());
    }
}
