//! Search specification types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Default number of results requested when the input omits it.
pub const DEFAULT_TARGET: u32 = 100;

/// Remote/hybrid/on-site filter, including the "no filter" case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkType {
    Remote,
    Hybrid,
    OnSite,
    #[default]
    Any,
}

impl WorkType {
    /// Textual label used in run input and normalized records.
    pub fn label(&self) -> &'static str {
        match self {
            WorkType::Remote => "REMOTE",
            WorkType::Hybrid => "HYBRID",
            WorkType::OnSite => "ON_SITE",
            WorkType::Any => "ANY",
        }
    }

    /// Search filter code. `None` means the filter is omitted.
    pub fn filter_code(&self) -> Option<&'static str> {
        match self {
            WorkType::Remote => Some("2"),
            WorkType::Hybrid => Some("3"),
            WorkType::OnSite => Some("1"),
            WorkType::Any => None,
        }
    }
}

impl fmt::Display for WorkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WorkType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match key.as_str() {
            "REMOTE" => Ok(WorkType::Remote),
            "HYBRID" => Ok(WorkType::Hybrid),
            "ON_SITE" | "ONSITE" => Ok(WorkType::OnSite),
            "ANY" | "" => Ok(WorkType::Any),
            _ => Err(ValidationError::InvalidWorkType(s.to_string())),
        }
    }
}

/// What to search for. Only constructed through validation, so the
/// mandatory keyword list and location are never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSpec {
    pub mandatory_keywords: Vec<String>,
    #[serde(default)]
    pub optional_keywords: Vec<String>,
    pub location: String,
    #[serde(default)]
    pub work_type: WorkType,
    #[serde(rename = "maxJobs")]
    pub target: u32,
}

impl SearchSpec {
    /// Build a validated spec. Keywords are trimmed and blanks dropped.
    pub fn new(
        mandatory_keywords: impl IntoIterator<Item = impl Into<String>>,
        location: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let mandatory_keywords = clean_terms(mandatory_keywords);
        if mandatory_keywords.is_empty() {
            return Err(ValidationError::MissingKeywords);
        }

        let location = location.into().trim().to_string();
        if location.is_empty() {
            return Err(ValidationError::MissingLocation);
        }

        Ok(Self {
            mandatory_keywords,
            optional_keywords: Vec::new(),
            location,
            work_type: WorkType::Any,
            target: DEFAULT_TARGET,
        })
    }

    /// Set the optional (disjunctive) keywords.
    pub fn with_optional_keywords(
        mut self,
        keywords: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.optional_keywords = clean_terms(keywords);
        self
    }

    /// Set the work-type filter.
    pub fn with_work_type(mut self, work_type: WorkType) -> Self {
        self.work_type = work_type;
        self
    }

    /// Set the target result count. Zero is rejected.
    pub fn with_target(mut self, target: u32) -> Result<Self, ValidationError> {
        if target == 0 {
            return Err(ValidationError::InvalidMaxResults(target.to_string()));
        }
        self.target = target;
        Ok(self)
    }
}

fn clean_terms(terms: impl IntoIterator<Item = impl Into<String>>) -> Vec<String> {
    terms
        .into_iter()
        .map(|t| t.into().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_type_codes() {
        assert_eq!(WorkType::Remote.filter_code(), Some("2"));
        assert_eq!(WorkType::Hybrid.filter_code(), Some("3"));
        assert_eq!(WorkType::OnSite.filter_code(), Some("1"));
        assert_eq!(WorkType::Any.filter_code(), None);
    }

    #[test]
    fn test_work_type_parses_labels_loosely() {
        assert_eq!("remote".parse::<WorkType>().unwrap(), WorkType::Remote);
        assert_eq!("On-site".parse::<WorkType>().unwrap(), WorkType::OnSite);
        assert_eq!("ON_SITE".parse::<WorkType>().unwrap(), WorkType::OnSite);
        assert!("office".parse::<WorkType>().is_err());
    }

    #[test]
    fn test_spec_rejects_blank_keywords_and_location() {
        assert_eq!(
            SearchSpec::new(["  ", ""], "Berlin").unwrap_err(),
            ValidationError::MissingKeywords
        );
        assert_eq!(
            SearchSpec::new(["rust"], "   ").unwrap_err(),
            ValidationError::MissingLocation
        );
    }

    #[test]
    fn test_spec_defaults() {
        let spec = SearchSpec::new(["rust"], "Berlin").unwrap();
        assert_eq!(spec.target, DEFAULT_TARGET);
        assert_eq!(spec.work_type, WorkType::Any);
        assert!(spec.optional_keywords.is_empty());
        assert!(spec.clone().with_target(0).is_err());
    }

    #[test]
    fn test_spec_serializes_like_run_input() {
        let spec = SearchSpec::new(["rust"], "Berlin")
            .unwrap()
            .with_work_type(WorkType::OnSite);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["mandatoryKeywords"][0], "rust");
        assert_eq!(json["workType"], "ON_SITE");
        assert_eq!(json["maxJobs"], 100);
    }
}
