//! Parser for the model-facing command grammar:
//!
//! ```text
//! do(action="Tap", element=[500,320])
//! do(action="Type", text="hello, world")
//! finish(message="done")
//! ```
//!
//! `parse` is a pure function and never fails: anything it cannot turn into a
//! complete action becomes [`Action::Unknown`].
use crate::agent_engine::state::Action;

const DO_PREFIX: &str = "do(";
const FINISH_PREFIX: &str = "finish(";
const MESSAGE_KEY: &str = "message=";

/// Largest coordinate on the normalized grid.
pub const MAX_COORD: u16 = 999;

/// Default for `Wait` when the duration is missing or has no usable unit.
pub const DEFAULT_WAIT_MS: u64 = 1000;

pub fn parse(expression: &str) -> Action {
    let cleaned = expression.trim();
    if cleaned.starts_with(DO_PREFIX) {
        parse_do(cleaned)
    } else if cleaned.starts_with(FINISH_PREFIX) {
        parse_finish(cleaned)
    } else {
        tracing::debug!(expression = %cleaned, "not a do(...) or finish(...) expression");
        Action::Unknown
    }
}

fn parse_finish(text: &str) -> Action {
    let Some((_, rest)) = text.split_once(MESSAGE_KEY) else {
        return Action::Unknown;
    };
    let body = before_last_paren(rest);
    Action::Finish {
        message: strip_quotes(body).to_string(),
    }
}

fn parse_do(text: &str) -> Action {
    let inner = &text[DO_PREFIX.len()..];
    let params = Params::scan(before_last_paren(inner));

    let Some(name) = params.get("action") else {
        return Action::Unknown;
    };

    let action = match name {
        "Launch" => params.get("app").map(|app| Action::Launch {
            app: app.to_string(),
        }),
        "Tap" => point(params.get("element")).map(|(x, y)| Action::Tap {
            x,
            y,
            warn_message: params.get("message").map(str::to_string),
        }),
        "Type" | "Type_Name" => params.get("text").map(|t| Action::Type {
            text: t.to_string(),
        }),
        "Swipe" => match (point(params.get("start")), point(params.get("end"))) {
            (Some((x1, y1)), Some((x2, y2))) => Some(Action::Swipe { x1, y1, x2, y2 }),
            _ => None,
        },
        "Long Press" => point(params.get("element")).map(|(x, y)| Action::LongPress { x, y }),
        "Double Tap" => point(params.get("element")).map(|(x, y)| Action::DoubleTap { x, y }),
        "Back" => Some(Action::Back),
        "Home" => Some(Action::Home),
        "Wait" => Some(Action::Wait {
            duration_ms: params.get("duration").map_or(DEFAULT_WAIT_MS, parse_duration_ms),
        }),
        "Take_over" => Some(Action::TakeOver {
            message: params.get("message").map(str::to_string),
        }),
        other => {
            tracing::debug!(action = %other, "unrecognized action name");
            None
        }
    };

    action.unwrap_or_else(|| {
        tracing::debug!(action = %name, "missing or invalid parameters");
        Action::Unknown
    })
}

/// Everything before the last `)`, or the whole input when there is none.
fn before_last_paren(s: &str) -> &str {
    match s.rfind(')') {
        Some(idx) => &s[..idx],
        None => s,
    }
}

/// Removes at most one leading and one trailing quote character.
fn strip_quotes(s: &str) -> &str {
    let s = s.strip_prefix(['"', '\'']).unwrap_or(s);
    s.strip_suffix(['"', '\'']).unwrap_or(s)
}

/// Ordered key → raw value pairs from a `do(...)` argument list.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Params(Vec<(String, String)>);

impl Params {
    /// Single left-to-right scan tracking quote state, array state and the
    /// current key/value accumulator. Quotes are dropped; brackets are kept.
    pub(crate) fn scan(content: &str) -> Self {
        let mut pairs: Vec<(String, String)> = Vec::new();
        let mut key = String::new();
        let mut value = String::new();
        let mut in_quote = false;
        let mut in_array = false;

        for ch in content.chars() {
            match ch {
                '=' if !in_quote && !in_array => {
                    key = value.trim().to_string();
                    value.clear();
                }
                '"' | '\'' => in_quote = !in_quote,
                '[' if !in_quote => {
                    in_array = true;
                    value.push(ch);
                }
                ']' if !in_quote => {
                    in_array = false;
                    value.push(ch);
                }
                ',' if !in_quote && !in_array => {
                    if !key.is_empty() {
                        pairs.push((std::mem::take(&mut key), value.trim().to_string()));
                        value.clear();
                    }
                }
                _ => value.push(ch),
            }
        }

        if !key.is_empty() {
            pairs.push((key, value.trim().to_string()));
        }

        Params(pairs)
    }

    /// Later occurrences of a key win.
    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// `[a,b,...]` → integers. Any token that is not an integer voids the whole array.
pub(crate) fn parse_array(raw: &str) -> Option<Vec<i64>> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);
    inner
        .split(',')
        .map(|tok| tok.trim().parse::<i64>().ok())
        .collect()
}

fn point(raw: Option<&str>) -> Option<(u16, u16)> {
    let values = parse_array(raw?)?;
    let x = coord(*values.first()?)?;
    let y = coord(*values.get(1)?)?;
    Some((x, y))
}

fn coord(v: i64) -> Option<u16> {
    u16::try_from(v).ok().filter(|c| *c <= MAX_COORD)
}

/// Lossy duration heuristic kept for compatibility with the prompt format:
/// "N seconds" → N*1000, "N ms" → N, anything else → 1000. Digits are
/// concatenated, so "1.5 seconds" reads as 15 seconds.
pub fn parse_duration_ms(raw: &str) -> u64 {
    let lower = raw.to_lowercase();
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let number = digits.parse::<u64>().ok();

    if lower.contains("second") {
        number.map_or(DEFAULT_WAIT_MS, |n| n.saturating_mul(1000))
    } else if lower.contains("ms") {
        number.unwrap_or(DEFAULT_WAIT_MS)
    } else {
        DEFAULT_WAIT_MS
    }
}
