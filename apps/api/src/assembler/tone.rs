//! Tone tables — maps each tone to the variant keywords that signal it and the
//! copy fragments transforms use when they rewrite text in that tone.
//!
//! Every table is an exhaustive `match` on `Tone`: adding a tone without
//! filling in its row is a compile error.

use crate::models::content::Tone;

/// Score given when a variant carries none of the requested tone's keywords.
pub const TONE_MATCH_FLOOR: f64 = 0.6;

/// Keywords and copy calibrated to a specific tone.
#[derive(Debug, Clone)]
pub struct ToneProfile {
    /// Substrings of a template variant name that signal this tone.
    pub keywords: &'static [&'static str],
    /// Clause appended to a headline when it is pushed to this tone.
    pub emphatic_clause: &'static str,
    /// Sentence appended to hero/features text when adding social proof.
    pub trust_phrase: &'static str,
    /// Default headline of an urgency banner.
    pub urgency_copy: &'static str,
}

/// Returns the profile for `tone`.
pub fn tone_profile(tone: Tone) -> ToneProfile {
    match tone {
        Tone::Minimal => ToneProfile {
            keywords: &["minimal", "clean", "simple", "centered"],
            emphatic_clause: "Nothing more.",
            trust_phrase: "Trusted by thousands.",
            urgency_copy: "Available for a limited time.",
        },
        Tone::Elegant => ToneProfile {
            keywords: &["elegant", "editorial", "serif", "classic"],
            emphatic_clause: "Made to last.",
            trust_phrase: "Chosen by discerning teams worldwide.",
            urgency_copy: "A limited collection, while it lasts.",
        },
        Tone::Friendly => ToneProfile {
            keywords: &["friendly", "playful", "rounded", "story"],
            emphatic_clause: "You're going to love it!",
            trust_phrase: "Loved by thousands of happy customers.",
            urgency_copy: "Don't miss out, the offer ends soon!",
        },
        Tone::Professional => ToneProfile {
            keywords: &["professional", "corporate", "grid", "columns", "tiers", "wall"],
            emphatic_clause: "Proven at scale.",
            trust_phrase: "Trusted by industry-leading teams.",
            urgency_copy: "Offer ends soon. Secure your plan today.",
        },
        Tone::Bold => ToneProfile {
            keywords: &["bold", "split", "banner", "cards", "carousel", "band"],
            emphatic_clause: "Starting today.",
            trust_phrase: "Thousands already made the switch.",
            urgency_copy: "Last chance. Act now!",
        },
    }
}

/// 1.0 if `variant` contains one of `tone`'s keywords, otherwise the floor.
pub fn tone_match(variant: &str, tone: Tone) -> f64 {
    let variant = variant.to_lowercase();
    if tone_profile(tone)
        .keywords
        .iter()
        .any(|k| variant.contains(k))
    {
        1.0
    } else {
        TONE_MATCH_FLOOR
    }
}
