mod json;

use json::parse_object;

use crate::error::ParserError;
use crate::paper::{Outline, PaperDetails};
use serde::Deserialize;

/// Parse the topic/title/question object returned by the input parser prompt
pub fn parse_details(raw: &str) -> Result<PaperDetails, ParserError> {
    parse_object::<PaperDetails>(raw)
}

/// Parse a `{"bulletpoints": [...]}` object. Order is kept; length is not checked.
pub fn parse_outline(raw: &str) -> Result<Outline, ParserError> {
    #[derive(Deserialize)]
    struct OutlineWrapper {
        #[serde(alias = "bullet_points", alias = "bulletPoints")]
        bulletpoints: Vec<String>,
    }

    let wrapper: OutlineWrapper = parse_object(raw)?;
    if wrapper.bulletpoints.is_empty() {
        return Err(ParserError::EmptyOutline);
    }
    Ok(Outline(wrapper.bulletpoints))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_details() {
        let raw = r#"{"topic": "Influencer Marketing", "title": "Wirkung von Influencern", "question": "Wie wirkt Influencer Marketing?"}"#;
        let details = parse_details(raw).unwrap();
        assert_eq!(details.topic, "Influencer Marketing");
        assert_eq!(details.title, "Wirkung von Influencern");
        assert_eq!(details.question, "Wie wirkt Influencer Marketing?");
    }

    #[test]
    fn test_parse_details_in_code_fence() {
        let raw = "```json\n{\"topic\": \"a\", \"title\": \"b\", \"question\": \"c\"}\n```";
        assert_eq!(parse_details(raw).unwrap().title, "b");
    }

    #[test]
    fn test_parse_details_rejects_malformed() {
        for raw in [
            "",
            "not json",
            r#"{"topic": "a", "title": "b"}"#,
            r#"{"topic": 1, "title": "b", "question": "c"}"#,
            r#"{"topic": "a", "title": "b", "question": "c""#,
        ] {
            assert!(parse_details(raw).is_err(), "accepted {:?}", raw);
        }
    }

    #[test]
    fn test_parse_outline_keeps_order() {
        let raw = r#"{"bulletpoints": ["Definition", "Geschichte", "Kritik"]}"#;
        let outline = parse_outline(raw).unwrap();
        assert_eq!(outline.0, vec!["Definition", "Geschichte", "Kritik"]);
    }

    #[test]
    fn test_parse_outline_accepts_short_list() {
        let raw = r#"{"bulletpoints": ["Nur einer"]}"#;
        assert_eq!(parse_outline(raw).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_outline_empty() {
        assert!(matches!(
            parse_outline(r#"{"bulletpoints": []}"#),
            Err(ParserError::EmptyOutline)
        ));
        assert!(parse_outline(r#"{"points": ["a"]}"#).is_err());
    }
}
