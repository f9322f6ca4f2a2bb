//! Run input parsing and validation.
//!
//! Accepted keys:
//!
//! | Key | Shape | Default |
//! |---|---|---|
//! | `mandatoryKeywords` | list of strings (or comma-separated string) | required |
//! | `optionalKeywords` | list of strings | empty |
//! | `searchTerms` | list, or `{ "mandatory": [...], "optional": [...] }` | alias |
//! | `location` | string | required |
//! | `workType` | `REMOTE`, `HYBRID`, `ON_SITE`, `ANY` | `ANY` |
//! | `maxJobs` | positive integer | 100 |

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::types::search::{SearchSpec, WorkType, DEFAULT_TARGET};

/// Validate a raw run input record into a search spec.
///
/// Runs before any browsing: a failure here means the run aborts with no
/// output.
pub fn parse_run_input(input: &Value) -> Result<SearchSpec, ValidationError> {
    let record = input
        .as_object()
        .ok_or_else(|| ValidationError::Malformed("run input must be a JSON object".into()))?;

    let (mandatory, optional) = keywords(record)?;
    let location = match present(record, "location") {
        None => String::new(),
        Some(Value::String(location)) => location.clone(),
        Some(other) => {
            return Err(ValidationError::Malformed(format!(
                "location must be a string, got {other}"
            )))
        }
    };

    let spec = SearchSpec::new(mandatory, location)?
        .with_optional_keywords(optional)
        .with_work_type(work_type(record)?);
    spec.with_target(target(record)?)
}

/// A key's value, treating `null` as absent.
fn present<'a>(record: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    record.get(key).filter(|value| !value.is_null())
}

fn keywords(record: &Map<String, Value>) -> Result<(Vec<String>, Vec<String>), ValidationError> {
    let mut mandatory = match present(record, "mandatoryKeywords") {
        Some(value) => string_list("mandatoryKeywords", value)?,
        None => Vec::new(),
    };
    let mut optional = match present(record, "optionalKeywords") {
        Some(value) => string_list("optionalKeywords", value)?,
        None => Vec::new(),
    };

    match present(record, "searchTerms") {
        Some(Value::Object(terms)) => {
            if mandatory.is_empty() {
                if let Some(value) = present(terms, "mandatory") {
                    mandatory = string_list("searchTerms.mandatory", value)?;
                }
            }
            if optional.is_empty() {
                if let Some(value) = present(terms, "optional") {
                    optional = string_list("searchTerms.optional", value)?;
                }
            }
        }
        Some(value) if mandatory.is_empty() => mandatory = string_list("searchTerms", value)?,
        _ => {}
    }

    Ok((mandatory, optional))
}

fn string_list(key: &str, value: &Value) -> Result<Vec<String>, ValidationError> {
    match value {
        Value::String(text) => Ok(text.split(',').map(str::to_string).collect()),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(term) => Ok(term.clone()),
                other => Err(ValidationError::Malformed(format!(
                    "{key} must contain only strings, got {other}"
                ))),
            })
            .collect(),
        other => Err(ValidationError::Malformed(format!(
            "{key} must be a list of strings, got {other}"
        ))),
    }
}

fn work_type(record: &Map<String, Value>) -> Result<WorkType, ValidationError> {
    match present(record, "workType") {
        None => Ok(WorkType::Any),
        Some(Value::String(label)) => label.parse(),
        Some(other) => Err(ValidationError::InvalidWorkType(other.to_string())),
    }
}

fn target(record: &Map<String, Value>) -> Result<u32, ValidationError> {
    let value = match present(record, "maxJobs") {
        None => return Ok(DEFAULT_TARGET),
        Some(value) => value,
    };

    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    };

    parsed
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| ValidationError::InvalidMaxResults(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_input() {
        let spec = parse_run_input(&json!({
            "mandatoryKeywords": ["rust", " backend "],
            "optionalKeywords": ["tokio"],
            "location": "Berlin",
            "workType": "HYBRID",
            "maxJobs": 40
        }))
        .unwrap();

        assert_eq!(spec.mandatory_keywords, ["rust", "backend"]);
        assert_eq!(spec.optional_keywords, ["tokio"]);
        assert_eq!(spec.location, "Berlin");
        assert_eq!(spec.work_type, WorkType::Hybrid);
        assert_eq!(spec.target, 40);
    }

    #[test]
    fn test_defaults() {
        let spec = parse_run_input(&json!({
            "mandatoryKeywords": ["rust"],
            "location": "Berlin"
        }))
        .unwrap();
        assert_eq!(spec.work_type, WorkType::Any);
        assert_eq!(spec.target, DEFAULT_TARGET);
        assert!(spec.optional_keywords.is_empty());
    }

    #[test]
    fn test_missing_required_fields() {
        assert_eq!(
            parse_run_input(&json!({"location": "Berlin"})),
            Err(ValidationError::MissingKeywords)
        );
        assert_eq!(
            parse_run_input(&json!({"mandatoryKeywords": ["  "], "location": "Berlin"})),
            Err(ValidationError::MissingKeywords)
        );
        assert_eq!(
            parse_run_input(&json!({"mandatoryKeywords": ["rust"]})),
            Err(ValidationError::MissingLocation)
        );
        assert_eq!(
            parse_run_input(&json!({"mandatoryKeywords": ["rust"], "location": " "})),
            Err(ValidationError::MissingLocation)
        );
    }

    #[test]
    fn test_search_terms_alias() {
        let listed = parse_run_input(&json!({
            "searchTerms": ["rust", "golang"],
            "location": "Remote"
        }))
        .unwrap();
        assert_eq!(listed.mandatory_keywords, ["rust", "golang"]);

        let grouped = parse_run_input(&json!({
            "searchTerms": {"mandatory": ["rust"], "optional": ["wasm"]},
            "location": "Remote"
        }))
        .unwrap();
        assert_eq!(grouped.mandatory_keywords, ["rust"]);
        assert_eq!(grouped.optional_keywords, ["wasm"]);
    }

    #[test]
    fn test_invalid_values() {
        let base = |key: &str, value: Value| {
            let mut input = json!({"mandatoryKeywords": ["rust"], "location": "Berlin"});
            input[key] = value;
            parse_run_input(&input)
        };

        assert!(matches!(
            base("workType", json!("FLOATING")),
            Err(ValidationError::InvalidWorkType(_))
        ));
        assert!(matches!(
            base("maxJobs", json!(0)),
            Err(ValidationError::InvalidMaxResults(_))
        ));
        assert!(matches!(
            base("maxJobs", json!(-5)),
            Err(ValidationError::InvalidMaxResults(_))
        ));
        assert!(matches!(
            base("maxJobs", json!(2.5)),
            Err(ValidationError::InvalidMaxResults(_))
        ));
        assert_eq!(base("maxJobs", json!("25")).unwrap().target, 25);
        assert!(matches!(
            base("mandatoryKeywords", json!([1, 2])),
            Err(ValidationError::Malformed(_))
        ));
        assert!(matches!(
            parse_run_input(&json!(["rust"])),
            Err(ValidationError::Malformed(_))
        ));
    }

    #[test]
    fn test_null_means_default() {
        let spec = parse_run_input(&json!({
            "mandatoryKeywords": ["rust"],
            "location": "Berlin",
            "workType": null,
            "maxJobs": null
        }))
        .unwrap();
        assert_eq!(spec.work_type, WorkType::Any);
        assert_eq!(spec.target, DEFAULT_TARGET);
    }
}
