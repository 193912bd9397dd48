//! Slot mapping — resolves Content Graph fields onto a template's slots and
//! checks each value against the slot's type contract.

use serde_json::{Map, Value};

use crate::models::catalog::{BlockKind, BlockTemplate, SlotSpec, SlotType};
use crate::models::content::ContentGraph;
use crate::models::layout::{Action, ActionRole, Media};

/// Generic list key accepted for a slot named `features`.
const FEATURES_SLOT: &str = "features";
const ITEMS_ALIAS: &str = "items";

const PRIMARY_ACTION_KEYS: &[&str] = &["primaryAction", "primary_action"];
const SECONDARY_ACTION_KEYS: &[&str] = &["secondaryAction", "secondary_action"];
const MEDIA_KEY: &str = "media";

/// Content resolved for one candidate template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotMapping {
    pub content: Map<String, Value>,
    pub media: Option<Media>,
    pub actions: Vec<Action>,
    /// Required slots with no value at all.
    pub missing_required: Vec<String>,
    /// `<kind>.<slot>` for every required slot whose value satisfies its contract.
    pub satisfied_keys: Vec<String>,
    /// Satisfied required slots / required slots; 1.0 when nothing is required.
    pub content_fit: f64,
}

/// Maps the content for `template.kind` onto the template's slots.
pub fn map_slots(template: &BlockTemplate, content: &ContentGraph) -> SlotMapping {
    let empty = Map::new();
    let source = content.get(template.kind).unwrap_or(&empty);

    let mut mapping = SlotMapping::default();
    let mut satisfied = 0usize;

    for slot in &template.slots {
        if let Some(v) = lookup(source, &slot.key) {
            mapping.content.insert(slot.key.clone(), v.clone());
        }
    }

    let required = template.required_slots().count();
    for slot in template.required_slots() {
        match lookup(source, &slot.key) {
            None => mapping.missing_required.push(slot.key.clone()),
            Some(v) if slot_satisfied(slot, v) => {
                satisfied += 1;
                mapping
                    .satisfied_keys
                    .push(format!("{}.{}", template.kind, slot.key));
            }
            Some(_) => {}
        }
    }

    mapping.content_fit = if required == 0 {
        1.0
    } else {
        satisfied as f64 / required as f64
    };

    match template.kind {
        BlockKind::Hero => {
            mapping.media = source.get(MEDIA_KEY).and_then(Media::from_value);
        }
        BlockKind::Cta => {
            let roles = [
                (ActionRole::Primary, PRIMARY_ACTION_KEYS),
                (ActionRole::Secondary, SECONDARY_ACTION_KEYS),
            ];
            for (role, keys) in roles {
                let action = keys
                    .iter()
                    .find_map(|k| source.get(*k))
                    .and_then(|v| Action::from_value(role, v));
                mapping.actions.extend(action);
            }
        }
        _ => {}
    }

    mapping
}

/// Exact key match, with `items` standing in for a missing `features` slot.
fn lookup<'a>(source: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    source.get(key).or_else(|| {
        if key == FEATURES_SLOT {
            source.get(ITEMS_ALIAS)
        } else {
            None
        }
    })
}

/// Checks one value against its slot's type contract.
pub fn slot_satisfied(slot: &SlotSpec, value: &Value) -> bool {
    match slot.slot_type {
        SlotType::Text => match value.as_str() {
            Some(text) => text_satisfied(slot, text),
            None => false,
        },
        SlotType::TextList => match value.as_array() {
            Some(items) => within_bounds(slot, items.len()),
            None => false,
        },
        SlotType::Image
        | SlotType::Video
        | SlotType::Icon
        | SlotType::QuoteList
        | SlotType::StatList => is_present(value),
    }
}

fn text_satisfied(slot: &SlotSpec, text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    if !within_bounds(slot, text.chars().count()) {
        return false;
    }
    slot.compiled
        .as_ref()
        .map_or(true, |pattern| pattern.is_match(text))
}

/// Length check; a missing lower bound still demands at least one unit.
fn within_bounds(slot: &SlotSpec, len: usize) -> bool {
    let min = slot.min_len.unwrap_or(1);
    let max = slot.max_len.unwrap_or(usize::MAX);
    len >= min && len <= max
}

/// Non-empty presence.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// True when an image value carries non-empty alt text (`{src, alt}` objects).
pub fn image_has_alt(value: &Value) -> bool {
    value
        .get("alt")
        .and_then(Value::as_str)
        .map(|alt| !alt.trim().is_empty())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::VisualWeight;
    use serde_json::json;

    fn slot(key: &str, slot_type: SlotType, required: bool) -> SlotSpec {
        SlotSpec {
            key: key.to_string(),
            slot_type,
            required,
            min_len: None,
            max_len: None,
            pattern: None,
            compiled: None,
        }
    }

    fn template(kind: BlockKind, slots: Vec<SlotSpec>) -> BlockTemplate {
        BlockTemplate {
            id: format!("{kind}-test"),
            kind,
            variant: "test".to_string(),
            slots,
            hard_constraints: vec![],
            soft_constraints: vec![],
            a11y_tags: vec![],
            weight: VisualWeight::Md,
            animated: false,
            requires_script: false,
            default_content: Map::new(),
        }
    }

    #[test]
    fn test_items_alias_satisfies_features_slot() {
        let t = template(
            BlockKind::Features,
            vec![slot("features", SlotType::TextList, true)],
        );
        let content = ContentGraph::from(json!({"features": {"items": ["A", "B", "C"]}}));
        let mapping = map_slots(&t, &content);
        assert_eq!(mapping.content_fit, 1.0);
        assert_eq!(mapping.content.get("features"), Some(&json!(["A", "B", "C"])));
        assert_eq!(mapping.satisfied_keys, vec!["features.features".to_string()]);
    }

    #[test]
    fn test_no_required_slots_fit_is_one() {
        let t = template(BlockKind::Footer, vec![slot("links", SlotType::TextList, false)]);
        let mapping = map_slots(&t, &ContentGraph::default());
        assert_eq!(mapping.content_fit, 1.0);
        assert!(mapping.missing_required.is_empty());
    }

    #[test]
    fn test_partial_fit_and_missing_required() {
        let t = template(
            BlockKind::Hero,
            vec![
                slot("headline", SlotType::Text, true),
                slot("image", SlotType::Image, true),
            ],
        );
        let content = ContentGraph::from(json!({"hero": {"headline": "Welcome"}}));
        let mapping = map_slots(&t, &content);
        assert_eq!(mapping.content_fit, 0.5);
        assert_eq!(mapping.missing_required, vec!["image".to_string()]);
    }

    #[test]
    fn test_text_bounds_and_pattern() {
        let mut s = slot("headline", SlotType::Text, true);
        s.min_len = Some(3);
        s.max_len = Some(10);
        assert!(slot_satisfied(&s, &json!("Welcome")));
        assert!(!slot_satisfied(&s, &json!("Go")));
        assert!(!slot_satisfied(&s, &json!("Far too long a headline")));
        assert!(!slot_satisfied(&s, &json!(["Welcome"])));

        s.pattern = Some("^[A-Z]".to_string());
        s.compile_pattern().unwrap();
        assert!(!slot_satisfied(&s, &json!("welcome")));
        assert!(slot_satisfied(&s, &json!("Welcome")));
    }

    #[test]
    fn test_text_list_bounds_count_items() {
        let mut s = slot("features", SlotType::TextList, true);
        s.min_len = Some(3);
        assert!(slot_satisfied(&s, &json!(["A", "B", "C"])));
        assert!(!slot_satisfied(&s, &json!(["A", "B"])));
        assert!(!slot_satisfied(&s, &json!([])));
    }

    #[test]
    fn test_presence_slots() {
        let s = slot("quotes", SlotType::QuoteList, true);
        assert!(slot_satisfied(&s, &json!([{"quote": "Nice"}])));
        assert!(!slot_satisfied(&s, &json!([])));
        let img = slot("image", SlotType::Image, true);
        assert!(slot_satisfied(&img, &json!("hero.png")));
        assert!(!slot_satisfied(&img, &json!("  ")));
        assert!(!slot_satisfied(&img, &Value::Null));
    }

    #[test]
    fn test_cta_actions_and_hero_media_attached() {
        let cta = template(BlockKind::Cta, vec![slot("headline", SlotType::Text, true)]);
        let content = ContentGraph::from(json!({
            "cta": {
                "headline": "Go",
                "primaryAction": {"label": "Start", "href": "/start"},
                "secondary_action": "Learn more"
            },
            "hero": {"headline": "Hi", "media": {"src": "a.png", "alt": "A"}}
        }));
        let mapping = map_slots(&cta, &content);
        assert_eq!(mapping.actions.len(), 2);
        assert_eq!(mapping.actions[0].role, ActionRole::Primary);
        assert_eq!(mapping.actions[1].label, "Learn more");
        assert!(mapping.media.is_none());

        let hero = template(BlockKind::Hero, vec![slot("headline", SlotType::Text, true)]);
        let mapping = map_slots(&hero, &content);
        assert!(mapping.media.as_ref().map(Media::has_alt).unwrap_or(false));
        assert!(mapping.actions.is_empty());
    }

    #[test]
    fn test_image_has_alt() {
        assert!(image_has_alt(&json!({"src": "a.png", "alt": "Team photo"})));
        assert!(!image_has_alt(&json!({"src": "a.png"})));
        assert!(!image_has_alt(&json!("a.png")));
    }
}
