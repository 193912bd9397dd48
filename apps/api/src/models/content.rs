use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::catalog::BlockKind;

/// Stylistic target of a page. Variants are declared in increasing intensity;
/// `Bold` is the most assertive tone.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Minimal,
    Elegant,
    Friendly,
    #[default]
    Professional,
    Bold,
}

impl Tone {
    pub const ALL: [Tone; 5] = [
        Tone::Minimal,
        Tone::Elegant,
        Tone::Friendly,
        Tone::Professional,
        Tone::Bold,
    ];

    pub const MOST_ASSERTIVE: Tone = Tone::Bold;

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Minimal => "minimal",
            Tone::Elegant => "elegant",
            Tone::Friendly => "friendly",
            Tone::Professional => "professional",
            Tone::Bold => "bold",
        }
    }

    /// One step up the intensity ladder. Saturates at `Bold`.
    pub fn promoted(&self) -> Tone {
        match self {
            Tone::Minimal => Tone::Elegant,
            Tone::Elegant => Tone::Friendly,
            Tone::Friendly => Tone::Professional,
            Tone::Professional | Tone::Bold => Tone::Bold,
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Tone::ALL
            .into_iter()
            .find(|t| t.as_str() == lowered)
            .ok_or_else(|| format!("unknown tone '{s}'"))
    }
}

/// Structured page content keyed by block kind. The payload for each kind is
/// arbitrary JSON; the assembler only reads objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentGraph(pub BTreeMap<String, Value>);

impl ContentGraph {
    pub fn get(&self, kind: BlockKind) -> Option<&Map<String, Value>> {
        self.0.get(kind.as_str()).and_then(Value::as_object)
    }

    /// True when the graph carries a non-empty payload for `kind`.
    pub fn has(&self, kind: BlockKind) -> bool {
        self.get(kind).map(|m| !m.is_empty()).unwrap_or(false)
    }
}

impl From<Value> for ContentGraph {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => ContentGraph(map.into_iter().collect()),
            _ => ContentGraph::default(),
        }
    }
}

/// Color, typography and spacing tokens. Passed through to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleTokens {
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
    #[serde(default)]
    pub typography: BTreeMap<String, String>,
    #[serde(default)]
    pub spacing: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tone_ladder_saturates_at_bold() {
        assert_eq!(Tone::Minimal.promoted(), Tone::Elegant);
        assert_eq!(Tone::Professional.promoted(), Tone::Bold);
        assert_eq!(Tone::Bold.promoted(), Tone::Bold);
    }

    #[test]
    fn test_tone_from_str_is_case_insensitive() {
        assert_eq!("BOLD".parse::<Tone>(), Ok(Tone::Bold));
        assert!("sparkly".parse::<Tone>().is_err());
    }

    #[test]
    fn test_content_graph_ignores_non_object_payloads() {
        let graph = ContentGraph::from(json!({
            "hero": {"headline": "Welcome"},
            "cta": "not an object",
            "about": {}
        }));
        assert!(graph.has(BlockKind::Hero));
        assert!(!graph.has(BlockKind::Cta));
        assert!(!graph.has(BlockKind::About));
        assert!(!graph.has(BlockKind::Features));
    }
}
