//! Command Interpreter — maps free-text edit commands onto transforms.
//!
//! Each phrase rule pairs a regex with a builder that resolves targets against
//! the current layout. Rules run in declaration order and every rule that
//! matches contributes, so "add social proof and tighten the fold" yields two
//! transforms. Keyword rules only look at text outside quotes and before the
//! colon of an `update <kind> <field>:` or `add urgency banner:` command;
//! rules that capture free text look at the raw command.
//!
//! Interpretation never fails. Unrecognized text and unresolvable targets
//! surface as warnings.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::OnceLock;
use tracing::warn;

use crate::models::catalog::BlockKind;
use crate::models::content::Tone;
use crate::models::layout::Layout;
use crate::revision::transforms::Transform;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    pub transforms: Vec<Transform>,
    /// Names of the phrase rules that produced a transform.
    pub intents: Vec<String>,
    pub warnings: Vec<String>,
}

/// Which view of the command a rule is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchScope {
    /// Quoted passages and free-text tails blanked out.
    Unquoted,
    Raw,
}

type Builder = fn(&Captures<'_>, &Layout) -> Result<Transform, String>;

struct PhraseRule {
    intent: &'static str,
    pattern: Regex,
    scope: MatchScope,
    build: Builder,
}

pub struct CommandInterpreter {
    rules: Vec<PhraseRule>,
    quoted: Regex,
    /// Command prefix whose colon introduces user copy.
    free_text: Regex,
}

impl Default for CommandInterpreter {
    fn default() -> Self {
        let rules = standard_rules()
            .into_iter()
            .map(|spec| PhraseRule {
                intent: spec.intent,
                pattern: Regex::new(spec.pattern).expect("phrase rule patterns are valid"),
                scope: spec.scope,
                build: spec.build,
            })
            .collect();
        CommandInterpreter {
            rules,
            quoted: Regex::new(r#""[^"]*"|“[^”]*”"#).expect("quote pattern is valid"),
            free_text: Regex::new(
                r"(?i)(\b(?:update\s+(?:the\s+)?[a-z-]+\s+[a-z_][a-z0-9_]*|add\s+(?:an?\s+)?urgency\s+banner)\s*:).*$",
            )
            .expect("free-text pattern is valid"),
        }
    }
}

impl CommandInterpreter {
    /// The shared interpreter with the standard phrase rules.
    pub fn standard() -> &'static CommandInterpreter {
        static STANDARD: OnceLock<CommandInterpreter> = OnceLock::new();
        STANDARD.get_or_init(CommandInterpreter::default)
    }

    pub fn interpret(&self, text: &str, layout: &Layout) -> Interpretation {
        let mut out = Interpretation::default();
        let raw = text.trim();
        if raw.is_empty() {
            out.warnings.push("Command is empty".to_string());
            return out;
        }
        let unquoted = self.quoted.replace_all(raw, " ");
        let unquoted = self.free_text.replace(&unquoted, "$1").into_owned();

        let mut recognized = false;
        for rule in &self.rules {
            let haystack = match rule.scope {
                MatchScope::Unquoted => unquoted.as_str(),
                MatchScope::Raw => raw,
            };
            let Some(caps) = rule.pattern.captures(haystack) else {
                continue;
            };
            recognized = true;
            match (rule.build)(&caps, layout) {
                Ok(transform) => {
                    out.transforms.push(transform);
                    out.intents.push(rule.intent.to_string());
                }
                Err(warning) => out.warnings.push(warning),
            }
        }

        if !recognized {
            warn!(command = raw, "No phrase rule matched");
            out.warnings.push(format!(
                "Could not understand \"{raw}\". Try \"make the hero more dramatic\" or \"move section 2 to 1\"."
            ));
        }
        out
    }
}

/// Interprets `text` with the standard rules.
pub fn interpret_command(text: &str, layout: &Layout) -> Interpretation {
    CommandInterpreter::standard().interpret(text, layout)
}

// ────────────────────────────────────────────────────────────────────────────
// Phrase rules
// ────────────────────────────────────────────────────────────────────────────

struct RuleSpec {
    intent: &'static str,
    pattern: &'static str,
    scope: MatchScope,
    build: Builder,
}

fn rule(intent: &'static str, pattern: &'static str, scope: MatchScope, build: Builder) -> RuleSpec {
    RuleSpec {
        intent,
        pattern,
        scope,
        build,
    }
}

fn standard_rules() -> Vec<RuleSpec> {
    use MatchScope::{Raw, Unquoted};
    vec![
        rule(
            "dramatize-hero",
            r"(?i)\bdramati(?:c|ze|se)\b|\bmake\s+(?:the\s+)?hero\s+(?:pop|bolder|louder|stand\s+out)\b",
            Unquoted,
            build_dramatize,
        ),
        rule(
            "increase-contrast",
            r"(?i)\b(?:increase|more|boost|higher|raise)\s+(?:the\s+)?contrast\b|\bhigh[-\s]contrast\b",
            Unquoted,
            |_, _| Ok(Transform::IncreaseContrast),
        ),
        rule(
            "add-social-proof",
            r"(?i)\bsocial\s+proof\b|\badd\s+(?:some\s+)?(?:testimonials?|reviews|trust)\b|\bmore\s+trust(?:worthy)?\b",
            Unquoted,
            |_, _| Ok(Transform::AddSocialProof),
        ),
        rule(
            "tighten-above-fold",
            r"(?i)\btighten\b.*\b(?:fold|top|hero)\b|\b(?:declutter|simplify)\s+(?:the\s+)?(?:top|hero|above\s+the\s+fold)\b",
            Unquoted,
            |_, _| Ok(Transform::TightenAboveFold),
        ),
        rule(
            "apply-tone-preset",
            r"(?i)\b(?:apply|use|switch\s+to)\s+(?:the\s+|a\s+)?(?:theme|tone)\s+([a-z]+)\b|\b(?:apply|use|switch\s+to)\s+(?:the\s+|a\s+|an\s+)?([a-z]+)\s+(?:theme|tone)\b",
            Unquoted,
            build_tone_preset,
        ),
        rule(
            "optimize-for-conversion",
            r"(?i)\boptimi[sz]e\b.*\bconversions?\b",
            Unquoted,
            |_, _| Ok(Transform::OptimizeForConversion),
        ),
        rule(
            "add-urgency-banner",
            r"(?i)\badd\s+(?:an?\s+)?urgency\s+banner\b(?:\s*:\s*(.+))?",
            Raw,
            build_urgency_banner,
        ),
        rule(
            "swap-variant",
            r#"(?i)\bswap\s+(?:the\s+)?([a-z-]+)\s+(?:to|with|for)\s+(?:the\s+)?["']?([a-z0-9][a-z0-9_-]*)"#,
            Raw,
            build_swap_variant,
        ),
        rule(
            "reorder",
            r"(?i)\bmove\s+section\s+(\d+)\s+to\s+(?:position\s+)?(\d+)\b",
            Unquoted,
            build_positional_reorder,
        ),
        rule(
            "reorder",
            r"(?i)\bmove\s+(?:the\s+)?([a-z-]+)\s+(to|before|after|above|below)\s+(?:the\s+)?([a-z-]+)\b",
            Unquoted,
            build_relative_reorder,
        ),
        rule(
            "update-content",
            r#"(?i)\bset\s+(?:the\s+)?headline\s+to\s+["“'](.+?)["”']"#,
            Raw,
            build_set_headline,
        ),
        rule(
            "update-content",
            r"(?i)\bupdate\s+(?:the\s+)?([a-z-]+)\s+([a-z_][a-z0-9_]*)\s*:\s*(.+)$",
            Raw,
            build_update_field,
        ),
    ]
}

fn build_dramatize(_: &Captures<'_>, layout: &Layout) -> Result<Transform, String> {
    if layout.contains_kind(BlockKind::Hero) {
        Ok(Transform::DramatizeHero)
    } else {
        Err("There is no hero section to dramatize".to_string())
    }
}

fn build_tone_preset(caps: &Captures<'_>, _: &Layout) -> Result<Transform, String> {
    let word = caps
        .get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str())
        .unwrap_or_default();
    word.parse::<Tone>()
        .map(|tone| Transform::ApplyTonePreset { tone })
        .map_err(|_| {
            let known: Vec<&str> = Tone::ALL.iter().map(Tone::as_str).collect();
            format!("Unknown tone '{word}'. Known tones: {}", known.join(", "))
        })
}

fn build_urgency_banner(caps: &Captures<'_>, _: &Layout) -> Result<Transform, String> {
    let text = caps
        .get(1)
        .map(|m| strip_quotes(m.as_str()).to_string())
        .filter(|t| !t.is_empty());
    Ok(Transform::AddUrgencyBanner { text })
}

fn build_swap_variant(caps: &Captures<'_>, layout: &Layout) -> Result<Transform, String> {
    let kind = resolve_kind(&caps[1])?;
    let block = layout
        .first_of_kind(kind)
        .ok_or_else(|| format!("There is no {kind} section to swap"))?;
    Ok(Transform::SwapVariant {
        id: block.id.clone(),
        variant: caps[2].to_lowercase(),
    })
}

/// `move section N to M`, 1-based.
fn build_positional_reorder(caps: &Captures<'_>, layout: &Layout) -> Result<Transform, String> {
    if layout.is_empty() {
        return Err("The layout has no sections to move".to_string());
    }
    let from = parse_ordinal(&caps[1])?;
    let to = parse_ordinal(&caps[2])?;
    Ok(Transform::Reorder { from, to })
}

/// `move <kind> to|before|after|above|below <kind|top|bottom>`.
fn build_relative_reorder(caps: &Captures<'_>, layout: &Layout) -> Result<Transform, String> {
    let kind = resolve_kind(&caps[1])?;
    let from = layout
        .index_of_kind(kind)
        .ok_or_else(|| format!("There is no {kind} section to move"))?;
    let relation = caps[2].to_lowercase();
    let target = caps[3].to_lowercase();
    let last = layout.len().saturating_sub(1);

    let to = match target.as_str() {
        "top" | "start" | "beginning" | "first" => 0,
        "bottom" | "end" | "last" => last,
        word => {
            let target_kind = resolve_kind(word)?;
            let anchor = layout
                .index_of_kind(target_kind)
                .ok_or_else(|| format!("There is no {target_kind} section to move next to"))?;
            match relation.as_str() {
                "before" | "above" if from < anchor => anchor - 1,
                "after" | "below" if from > anchor => anchor + 1,
                _ => anchor,
            }
        }
    };
    Ok(Transform::Reorder { from, to })
}

/// Targets the first hero, or the first section when there is no hero.
fn build_set_headline(caps: &Captures<'_>, layout: &Layout) -> Result<Transform, String> {
    let block = layout
        .first_of_kind(BlockKind::Hero)
        .or_else(|| layout.sections.first())
        .ok_or_else(|| "The layout has no section to take a headline".to_string())?;
    let mut patch = Map::new();
    patch.insert("headline".to_string(), Value::String(caps[1].to_string()));
    Ok(Transform::UpdateContent {
        id: block.id.clone(),
        patch,
    })
}

fn build_update_field(caps: &Captures<'_>, layout: &Layout) -> Result<Transform, String> {
    let kind = resolve_kind(&caps[1])?;
    let block = layout
        .first_of_kind(kind)
        .ok_or_else(|| format!("There is no {kind} section to update"))?;
    let value = strip_quotes(&caps[3]);
    if value.is_empty() {
        return Err(format!("No value given for {kind} {}", &caps[2]));
    }
    let mut patch = Map::new();
    patch.insert(caps[2].to_string(), Value::String(value.to_string()));
    Ok(Transform::UpdateContent {
        id: block.id.clone(),
        patch,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn resolve_kind(word: &str) -> Result<BlockKind, String> {
    BlockKind::parse(word).ok_or_else(|| format!("Unknown section type '{word}'"))
}

/// 1-based ordinal to 0-based index. `0` is treated as the first section.
fn parse_ordinal(digits: &str) -> Result<usize, String> {
    digits
        .parse::<usize>()
        .map(|n| n.saturating_sub(1))
        .map_err(|_| format!("Section number '{digits}' is out of range"))
}

fn strip_quotes(text: &str) -> &str {
    text.trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '“' | '”'))
        .trim()
}
