//! Splits a raw model reply into its reasoning trace and action expression.
//!
//! The model is asked for `<think>…</think><answer>…</answer>` but does not
//! always comply, so the bare command markers are checked first.

const FINISH_MARKER: &str = "finish(message=";
const DO_MARKER: &str = "do(action=";
const ANSWER_OPEN: &str = "<answer>";
const ANSWER_CLOSE: &str = "</answer>";
const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Segmented {
    pub reasoning: String,
    pub action: String,
}

/// First match wins: `finish(message=`, then `do(action=`, then `<answer>`,
/// otherwise the whole text is taken as the action.
pub fn segment(raw: &str) -> Segmented {
    for marker in [FINISH_MARKER, DO_MARKER] {
        if let Some((before, after)) = raw.split_once(marker) {
            return Segmented {
                reasoning: before.trim().to_string(),
                action: format!("{marker}{after}"),
            };
        }
    }

    if let Some((before, after)) = raw.split_once(ANSWER_OPEN) {
        return Segmented {
            reasoning: before
                .replace(THINK_OPEN, "")
                .replace(THINK_CLOSE, "")
                .trim()
                .to_string(),
            action: after.replace(ANSWER_CLOSE, "").trim().to_string(),
        };
    }

    Segmented {
        reasoning: String::new(),
        action: raw.to_string(),
    }
}

/// Serialization used for assistant turns; `segment` recovers the action from it.
pub fn assistant_turn_text(reasoning: &str, action: &str) -> String {
    format!("{THINK_OPEN}{reasoning}{THINK_CLOSE}{ANSWER_OPEN}{action}{ANSWER_CLOSE}")
}
