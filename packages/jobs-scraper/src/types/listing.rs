//! Listing records: the raw scraped shape and the normalized record.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::search::SearchSpec;

/// Unvalidated strings pulled out of one listing element.
///
/// Every extraction strategy populates exactly this schema. A sub-element
/// that is missing on the page is `None`, never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawListing {
    pub id: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub posted_date: Option<String>,
    pub salary: Option<String>,
    pub work_type: Option<String>,
    pub url: Option<String>,
}

impl RawListing {
    /// True when not a single field could be read.
    pub fn is_blank(&self) -> bool {
        self.id.is_none()
            && self.title.is_none()
            && self.company.is_none()
            && self.location.is_none()
            && self.description.is_none()
            && self.posted_date.is_none()
            && self.salary.is_none()
            && self.work_type.is_none()
            && self.url.is_none()
    }
}

/// When a listing was posted.
///
/// `Unparsed` is the normalization fallback: the original text is kept
/// verbatim so it stays distinguishable from a parsed timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostedAt {
    Parsed(DateTime<Utc>),
    Unparsed(String),
}

impl PostedAt {
    pub fn is_parsed(&self) -> bool {
        matches!(self, PostedAt::Parsed(_))
    }
}

impl fmt::Display for PostedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostedAt::Parsed(ts) => f.write_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            PostedAt::Unparsed(raw) => f.write_str(raw),
        }
    }
}

/// Pay period keyword class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalaryPeriod {
    Yearly,
    Monthly,
    Weekly,
    Hourly,
}

impl SalaryPeriod {
    fn phrase(&self) -> &'static str {
        match self {
            SalaryPeriod::Yearly => "per year",
            SalaryPeriod::Monthly => "per month",
            SalaryPeriod::Weekly => "per week",
            SalaryPeriod::Hourly => "per hour",
        }
    }
}

/// Structured salary. Every field is independently nullable; when both
/// bounds are present `min <= max`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Salary {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: Option<String>,
    pub period: Option<SalaryPeriod>,
}

impl Salary {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.currency.is_none() && self.period.is_none()
    }
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    match code {
        "USD" => Some("$"),
        "GBP" => Some("£"),
        "EUR" => Some("€"),
        "INR" => Some("₹"),
        "JPY" => Some("¥"),
        _ => None,
    }
}

/// Renders salary text that parses back to the same structure.
impl fmt::Display for Salary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = self.currency.as_deref().and_then(currency_symbol).unwrap_or("");
        let mut parts: Vec<String> = Vec::new();

        match (self.min, self.max) {
            (Some(min), Some(max)) => parts.push(format!("{symbol}{min} - {symbol}{max}")),
            (Some(min), None) => parts.push(format!("from {symbol}{min}")),
            (None, Some(max)) => parts.push(format!("up to {symbol}{max}")),
            (None, None) if !symbol.is_empty() => parts.push(symbol.to_string()),
            (None, None) => {}
        }

        if let Some(period) = self.period {
            parts.push(period.phrase().to_string());
        }

        f.write_str(&parts.join(" "))
    }
}

/// Canonical record handed to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedJob {
    pub id: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    /// One of the work-type labels, or `None`.
    pub work_type: Option<String>,
    pub posted_at: Option<PostedAt>,
    pub salary: Salary,
    pub description: Option<String>,
    pub url: Option<String>,
    pub scraped_at: DateTime<Utc>,
    pub search_params: SearchSpec,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_posted_at_serializes_as_plain_string() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let parsed = serde_json::to_value(PostedAt::Parsed(ts)).unwrap();
        assert_eq!(parsed, serde_json::json!("2024-01-15T00:00:00Z"));

        let raw = serde_json::to_value(PostedAt::Unparsed("last Tuesday".into())).unwrap();
        assert_eq!(raw, serde_json::json!("last Tuesday"));
    }

    #[test]
    fn test_salary_display() {
        let salary = Salary {
            min: Some(80000.0),
            max: Some(100000.0),
            currency: Some("USD".into()),
            period: Some(SalaryPeriod::Yearly),
        };
        assert_eq!(salary.to_string(), "$80000 - $100000 per year");

        let capped = Salary {
            max: Some(50000.0),
            currency: Some("GBP".into()),
            ..Default::default()
        };
        assert_eq!(capped.to_string(), "up to £50000");
        assert_eq!(Salary::default().to_string(), "");
    }

    #[test]
    fn test_blank_listing() {
        assert!(RawListing::default().is_blank());
        let listing = RawListing {
            title: Some("Engineer".into()),
            ..Default::default()
        };
        assert!(!listing.is_blank());
    }
}
