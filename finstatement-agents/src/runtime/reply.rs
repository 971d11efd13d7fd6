use super::error::AgentError;
use serde::de::DeserializeOwned;

/// Coerce a raw model reply into `T`.
///
/// Models sometimes wrap JSON in a Markdown code fence even when asked for
/// bare JSON, so a single surrounding fence is stripped before parsing.
/// Anything else (prose, missing or extra keys, wrong types) is rejected.
pub fn parse_structured_reply<T: DeserializeOwned>(raw: &str) -> Result<T, AgentError> {
    let body = strip_code_fence(raw.trim());

    if body.is_empty() {
        return Err(AgentError::InvalidReply {
            reason: "reply is empty".to_string(),
            raw: raw.to_string(),
        });
    }

    serde_json::from_str(body).map_err(|e| AgentError::InvalidReply {
        reason: e.to_string(),
        raw: raw.to_string(),
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return text;
    };

    // Drop the info string ("json") on the opening fence line
    match rest.find('\n') {
        Some(newline) => rest[newline + 1..].trim(),
        None => rest
            .trim_start_matches(|c: char| c.is_ascii_alphabetic())
            .trim(),
    }
}
