//! Pull structured data out of free-form model replies

use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::LanguageDetection;

/// Parse the text between the first `{` and the last `}` as JSON
///
/// Models often wrap JSON in prose or code fences; everything outside the
/// outermost braces is ignored.
pub fn extract_json_object(response: &str) -> Result<Value> {
    let start = response
        .find('{')
        .ok_or_else(|| Error::llm("No JSON object in model response"))?;
    let end = response
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| Error::llm("Unterminated JSON object in model response"))?;

    Ok(serde_json::from_str(&response[start..=end])?)
}

/// Read `detected_language` / `confidence` from a JSON object
pub fn detection_from_value(value: &Value) -> LanguageDetection {
    LanguageDetection {
        detected_language: value
            .get("detected_language")
            .and_then(Value::as_str)
            .map(str::to_string),
        confidence: value.get("confidence").and_then(confidence_from_value),
    }
}

/// Parse a language-detection reply
pub fn parse_language_detection(response: &str) -> Result<LanguageDetection> {
    let value = extract_json_object(response)?;
    Ok(detection_from_value(&value))
}

fn confidence_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_code_fence() {
        let reply = "Here you go:\n```json\n{\"doc_type\": \"invoice\", \"metadata\": {\"confidence\": 0.9}}\n```\n";
        let value = extract_json_object(reply).unwrap();
        assert_eq!(value["doc_type"], "invoice");
        assert_eq!(value["metadata"]["confidence"], 0.9);
    }

    #[test]
    fn test_extract_failures() {
        assert!(extract_json_object("no braces here").is_err());
        assert!(extract_json_object("} backwards {").is_err());
        assert!(extract_json_object("{ not: json }").is_err());
    }

    #[test]
    fn test_detection_numeric_confidence() {
        let detection =
            parse_language_detection("{\"detected_language\": \"Japanese (ja)\", \"confidence\": 0.97}")
                .unwrap();
        assert_eq!(detection.detected_language.as_deref(), Some("Japanese (ja)"));
        assert_eq!(detection.confidence, Some(0.97));
    }

    #[test]
    fn test_detection_string_confidence_and_missing_fields() {
        let detection = parse_language_detection("{\"confidence\": \"0.5\"}").unwrap();
        assert_eq!(detection.detected_language, None);
        assert_eq!(detection.confidence, Some(0.5));

        let detection = parse_language_detection("{\"confidence\": \"high\"}").unwrap();
        assert_eq!(detection.confidence, None);
    }
}
