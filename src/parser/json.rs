use crate::error::ParserError;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

/// Deserialize the first JSON object found in model output
pub fn parse_object<T: DeserializeOwned>(raw: &str) -> Result<T, ParserError> {
    let json_str = extract_json(raw).ok_or(ParserError::NoJson)?;
    Ok(serde_json::from_str(&json_str)?)
}

fn code_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"```(?:json)?\s*\n?([\s\S]*?)\n?```").expect("code block regex is valid")
    })
}

/// Extract JSON object from a string that might contain markdown code blocks
pub fn extract_json(s: &str) -> Option<String> {
    // First try: the whole string is valid JSON
    if s.trim().starts_with('{')
        && serde_json::from_str::<serde_json::Value>(s.trim()).is_ok()
    {
        return Some(s.trim().to_string());
    }

    // Second try: extract from markdown code block
    for cap in code_block_re().captures_iter(s) {
        let potential_json = cap.get(1)?.as_str().trim();
        if serde_json::from_str::<serde_json::Value>(potential_json).is_ok() {
            return Some(potential_json.to_string());
        }
    }

    // Third try: find JSON object pattern
    let brace_start = s.find('{')?;
    let mut depth = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut end = brace_start;

    for (i, c) in s[brace_start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = brace_start + i + 1;
                    break;
                }
            }
            _ => {}
        }
    }

    if depth == 0 && end > brace_start {
        let potential_json = &s[brace_start..end];
        if serde_json::from_str::<serde_json::Value>(potential_json).is_ok() {
            return Some(potential_json.to_string());
        }
    }

    None
}
