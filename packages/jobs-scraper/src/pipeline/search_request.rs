//! Search request construction.

use url::Url;

use crate::error::DriverError;
use crate::types::search::SearchSpec;

/// A canonical search request: fixed-order query parameters on a base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    base_url: String,
    params: Vec<(&'static str, String)>,
}

impl SearchRequest {
    /// Query parameters in serialization order.
    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }

    /// Value of a parameter, if present.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Serialize to a URL. Values are form-encoded.
    pub fn to_url(&self) -> Result<String, DriverError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|_| DriverError::InvalidUrl(self.base_url.clone()))?;
        url.query_pairs_mut()
            .clear()
            .extend_pairs(self.params.iter().map(|(k, v)| (*k, v.as_str())));
        Ok(url.to_string())
    }
}

/// Keyword expression: mandatory terms joined conjunctively, then each
/// optional term as ` OR term`.
pub fn keyword_expression(spec: &SearchSpec) -> String {
    let mut expression = spec.mandatory_keywords.join(" ");
    for term in &spec.optional_keywords {
        if !expression.is_empty() {
            expression.push(' ');
        }
        expression.push_str("OR ");
        expression.push_str(term);
    }
    expression
}

/// Build the request for a spec.
///
/// Parameter order is fixed (`keywords`, `location`, `f_WT`, `position`,
/// `pageNum`) regardless of input order. The work-type filter is omitted for
/// ANY, and any parameter with an empty value is dropped.
pub fn build_search_request(base_url: &str, spec: &SearchSpec) -> SearchRequest {
    let candidates: [(&'static str, Option<String>); 5] = [
        ("keywords", Some(keyword_expression(spec))),
        ("location", Some(spec.location.trim().to_string())),
        ("f_WT", spec.work_type.filter_code().map(str::to_string)),
        ("position", Some("1".to_string())),
        ("pageNum", Some("0".to_string())),
    ];

    let params = candidates
        .into_iter()
        .filter_map(|(key, value)| value.filter(|v| !v.trim().is_empty()).map(|v| (key, v)))
        .collect();

    SearchRequest {
        base_url: base_url.to_string(),
        params,
    }
}
