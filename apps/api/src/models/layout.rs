use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::catalog::{BlockKind, BlockTemplate, VisualWeight};
use crate::models::content::Tone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionRole {
    Primary,
    Secondary,
}

/// A button or link attached to a block (cta blocks only, in practice).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub role: ActionRole,
    pub label: String,
    #[serde(default)]
    pub href: Option<String>,
}

impl Action {
    /// Accepts either a bare label string or `{label|text, href|url}`.
    pub fn from_value(role: ActionRole, value: &Value) -> Option<Action> {
        match value {
            Value::String(label) if !label.trim().is_empty() => Some(Action {
                role,
                label: label.clone(),
                href: None,
            }),
            Value::Object(map) => {
                let label = str_field(map, &["label", "text"])?;
                let href = str_field(map, &["href", "url"]);
                Some(Action { role, label, href })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// Media attached to a hero block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub kind: MediaKind,
    pub src: String,
    #[serde(default)]
    pub alt: Option<String>,
}

impl Media {
    /// Accepts either a bare source string (an image without alt text) or
    /// `{src|url, alt?, type|kind?}`.
    pub fn from_value(value: &Value) -> Option<Media> {
        match value {
            Value::String(src) if !src.trim().is_empty() => Some(Media {
                kind: MediaKind::Image,
                src: src.clone(),
                alt: None,
            }),
            Value::Object(map) => {
                let src = str_field(map, &["src", "url"])?;
                let kind = match str_field(map, &["type", "kind"]).as_deref() {
                    Some("video") => MediaKind::Video,
                    _ => MediaKind::Image,
                };
                let alt = str_field(map, &["alt"]);
                Some(Media { kind, src, alt })
            }
            _ => None,
        }
    }

    pub fn has_alt(&self) -> bool {
        self.alt.as_deref().map(|a| !a.trim().is_empty()).unwrap_or(false)
    }
}

fn str_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| map.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
        .map(str::to_string)
}

// ────────────────────────────────────────────────────────────────────────────
// Block instance
// ────────────────────────────────────────────────────────────────────────────

/// One placed block.
///
/// `kind`, `variant` and `weight` are copied from the template at placement
/// time so that diffing and impact estimation need no catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockInstance {
    pub id: String,
    pub template_id: String,
    pub kind: BlockKind,
    pub variant: String,
    pub tone: Tone,
    #[serde(default)]
    pub weight: VisualWeight,
    #[serde(default)]
    pub content: Map<String, Value>,
    #[serde(default)]
    pub media: Option<Media>,
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Always equal to the block's index in its layout.
    #[serde(default)]
    pub position: usize,
}

impl BlockInstance {
    pub fn from_template(
        id: String,
        template: &BlockTemplate,
        tone: Tone,
        content: Map<String, Value>,
    ) -> Self {
        BlockInstance {
            id,
            template_id: template.id.clone(),
            kind: template.kind,
            variant: template.variant.clone(),
            tone,
            weight: template.weight,
            content,
            media: None,
            actions: Vec::new(),
            position: 0,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.content.get(key).and_then(Value::as_str)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Layout
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub sections: Vec<BlockInstance>,
}

impl Layout {
    pub fn new(sections: Vec<BlockInstance>) -> Self {
        let mut layout = Layout { sections };
        layout.renumber();
        layout
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Re-derives `position` from array order.
    pub fn renumber(&mut self) {
        for (i, block) in self.sections.iter_mut().enumerate() {
            block.position = i;
        }
    }

    pub fn index_of_kind(&self, kind: BlockKind) -> Option<usize> {
        self.sections.iter().position(|b| b.kind == kind)
    }

    pub fn index_of_id(&self, id: &str) -> Option<usize> {
        self.sections.iter().position(|b| b.id == id)
    }

    pub fn first_of_kind(&self, kind: BlockKind) -> Option<&BlockInstance> {
        self.sections.iter().find(|b| b.kind == kind)
    }

    pub fn contains_kind(&self, kind: BlockKind) -> bool {
        self.index_of_kind(kind).is_some()
    }

    /// Smallest `<kind>-<n>` id not already used in this layout.
    pub fn fresh_id(&self, kind: BlockKind) -> String {
        (0..)
            .map(|n| format!("{kind}-{n}"))
            .find(|candidate| self.index_of_id(candidate).is_none())
            .unwrap_or_else(|| format!("{kind}-{}", self.sections.len()))
    }

    /// Rejects blank and duplicate block ids.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for (i, block) in self.sections.iter().enumerate() {
            if block.id.trim().is_empty() {
                return Err(format!("Block at index {i} has an empty id"));
            }
            if !seen.insert(block.id.as_str()) {
                return Err(format!("Duplicate block id '{}'", block.id));
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn positions_are_dense(&self) -> bool {
        self.sections.iter().enumerate().all(|(i, b)| b.position == i)
    }
}
