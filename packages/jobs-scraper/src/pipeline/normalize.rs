//! Field normalization: posted dates, salary ranges, work types, text.
//!
//! None of these functions fail. Text that cannot be parsed falls back to a
//! best-effort value (the original string for dates, an all-null salary),
//! and the outcome reports the fallback so callers can count it.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::types::listing::{NormalizedJob, PostedAt, RawListing, Salary, SalaryPeriod};
use crate::types::search::{SearchSpec, WorkType};

static RELATIVE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d+)\+?\s*(hours?|hrs?|h|days?|d|weeks?|wks?|w|months?|mos?|m|years?|yrs?|y)(?:\s+ago)?$",
    )
    .expect("relative date pattern is valid")
});

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("ISO date pattern is valid"));

static SALARY_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)(k)?").expect("salary number pattern is valid")
});

/// Checked in order; the first symbol present wins.
const CURRENCIES: [(&str, &str); 5] = [
    ("$", "USD"),
    ("£", "GBP"),
    ("€", "EUR"),
    ("₹", "INR"),
    ("¥", "JPY"),
];

/// Period keywords in precedence order. Full words match as word prefixes
/// ("yearly", "hourly"); abbreviations only as whole words so that e.g.
/// "remote" does not read as "mo".
static PERIODS: LazyLock<Vec<(Regex, SalaryPeriod)>> = LazyLock::new(|| {
    [
        (r"\b(?:year|annual)|\byrs?\b", SalaryPeriod::Yearly),
        (r"\bmonth|\bmos?\b", SalaryPeriod::Monthly),
        (r"\bweek|\bwks?\b", SalaryPeriod::Weekly),
        (r"\bhour|\bhrs?\b", SalaryPeriod::Hourly),
    ]
    .into_iter()
    .map(|(pattern, period)| (Regex::new(pattern).expect("period pattern is valid"), period))
    .collect()
});

/// Lowercase, trim and collapse internal whitespace.
fn fold(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Parse a posted-date string relative to the current time.
pub fn parse_date(text: &str) -> PostedAt {
    parse_date_at(text, Utc::now())
}

/// Parse a posted-date string relative to `now`.
///
/// Rules, in order: "now"/"just now"; `<n><unit>` with an optional "ago"
/// (h, d, w, m = 30 days, y = 365 days); strict `YYYY-MM-DD` at midnight
/// UTC; an RFC 3339 / ISO-8601 timestamp; otherwise the text unchanged.
pub fn parse_date_at(text: &str, now: DateTime<Utc>) -> PostedAt {
    let folded = fold(text);
    let folded = folded
        .strip_prefix("reposted ")
        .or_else(|| folded.strip_prefix("posted "))
        .unwrap_or(&folded);

    if folded == "now" || folded == "just now" {
        return PostedAt::Parsed(now);
    }

    if let Some(caps) = RELATIVE_DATE.captures(folded) {
        if let Ok(amount) = caps[1].parse::<i64>() {
            let delta = match caps[2].chars().next() {
                Some('h') => Duration::try_hours(amount),
                Some('d') => Duration::try_days(amount),
                Some('w') => Duration::try_weeks(amount),
                Some('m') => amount.checked_mul(30).and_then(Duration::try_days),
                Some('y') => amount.checked_mul(365).and_then(Duration::try_days),
                _ => None,
            };
            if let Some(ts) = delta.and_then(|d| now.checked_sub_signed(d)) {
                return PostedAt::Parsed(ts);
            }
        }
    }

    let trimmed = text.trim();
    if ISO_DATE.is_match(trimmed) {
        if let Some(ts) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return PostedAt::Parsed(ts.and_utc());
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return PostedAt::Parsed(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return PostedAt::Parsed(ts.and_utc());
    }

    PostedAt::Unparsed(text.to_string())
}

/// Parse free-text salary into `{min, max, currency, period}`.
pub fn extract_salary(text: &str) -> Salary {
    let mut salary = Salary::default();
    if text.trim().is_empty() {
        return salary;
    }

    let normalized = text
        .to_lowercase()
        .replace(',', "")
        .replace(['~', '–', '—'], "-");

    salary.currency = CURRENCIES
        .iter()
        .find(|(symbol, _)| normalized.contains(symbol))
        .map(|(_, code)| code.to_string());

    let numbers: Vec<f64> = SALARY_NUMBER
        .captures_iter(&normalized)
        .filter_map(|caps| {
            let value = caps[1].parse::<f64>().ok()?;
            Some(if caps.get(2).is_some() { value * 1000.0 } else { value })
        })
        .collect();

    if !numbers.is_empty() {
        let lowest = numbers.iter().copied().fold(f64::INFINITY, f64::min);
        let highest = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if normalized.contains("up to") {
            salary.max = Some(highest);
        } else if normalized.contains("from") {
            salary.min = Some(lowest);
        } else {
            salary.min = Some(lowest);
            if numbers.len() > 1 {
                salary.max = Some(highest);
            }
        }
    }

    salary.period = PERIODS
        .iter()
        .find(|(pattern, _)| pattern.is_match(&normalized))
        .map(|(_, period)| *period);

    salary
}

/// Map listing work-type text onto a work-type label.
pub fn normalize_work_type(text: &str) -> Option<&'static str> {
    let folded = fold(text);
    if folded.is_empty() {
        return None;
    }
    if let Ok(work_type) = folded.parse::<WorkType>() {
        return (work_type != WorkType::Any).then(|| work_type.label());
    }
    if folded.contains("hybrid") {
        Some(WorkType::Hybrid.label())
    } else if folded.contains("remote") {
        Some(WorkType::Remote.label())
    } else if folded.contains("on-site") || folded.contains("on site") || folded.contains("onsite") {
        Some(WorkType::OnSite.label())
    } else {
        None
    }
}

/// Trim and collapse whitespace; blank becomes `None`.
pub fn clean_text(text: Option<&str>) -> Option<String> {
    let text = text?;
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

/// A normalized record plus which fields fell back.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub job: NormalizedJob,
    pub date_fallback: bool,
    pub salary_fallback: bool,
}

/// Turn one raw listing into the canonical record.
pub fn normalize_listing(
    raw: RawListing,
    spec: &SearchSpec,
    scraped_at: DateTime<Utc>,
) -> Normalized {
    let posted_at =
        clean_text(raw.posted_date.as_deref()).map(|text| parse_date_at(&text, scraped_at));
    let date_fallback = matches!(posted_at, Some(PostedAt::Unparsed(_)));

    let salary_text = clean_text(raw.salary.as_deref());
    let salary = salary_text.as_deref().map(extract_salary).unwrap_or_default();
    let salary_fallback = salary_text.is_some() && salary.is_empty();

    if date_fallback || salary_fallback {
        debug!(
            listing_id = ?raw.id,
            date_fallback,
            salary_fallback,
            fallback = true,
            "Field left unparsed"
        );
    }

    let job = NormalizedJob {
        id: clean_text(raw.id.as_deref()),
        title: clean_text(raw.title.as_deref()),
        company: clean_text(raw.company.as_deref()),
        location: clean_text(raw.location.as_deref()),
        work_type: raw
            .work_type
            .as_deref()
            .and_then(normalize_work_type)
            .map(str::to_string),
        posted_at,
        salary,
        description: raw
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
        url: clean_text(raw.url.as_deref()),
        scraped_at,
        search_params: spec.clone(),
    };

    Normalized {
        job,
        date_fallback,
        salary_fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn spec() -> SearchSpec {
        SearchSpec::new(["rust"], "Berlin").unwrap()
    }

    #[test]
    fn test_parse_date_now() {
        let now = fixed_now();
        assert_eq!(parse_date_at("just now", now), PostedAt::Parsed(now));
        assert_eq!(parse_date_at("NOW", now), PostedAt::Parsed(now));
        assert_eq!(parse_date_at("Posted Just Now", now), PostedAt::Parsed(now));
    }

    #[test]
    fn test_now_must_be_the_whole_text() {
        let now = fixed_now();
        assert_eq!(
            parse_date_at("Be an early applicant now", now),
            PostedAt::Unparsed("Be an early applicant now".into())
        );
        assert_eq!(
            parse_date_at("Known", now),
            PostedAt::Unparsed("Known".into())
        );
    }

    #[test]
    fn test_parse_date_relative_units() {
        let now = fixed_now();
        assert_eq!(
            parse_date_at("2h ago", now),
            PostedAt::Parsed(now - Duration::hours(2))
        );
        assert_eq!(
            parse_date_at("3d", now),
            PostedAt::Parsed(now - Duration::days(3))
        );
        assert_eq!(
            parse_date_at("1 week ago", now),
            PostedAt::Parsed(now - Duration::weeks(1))
        );
        assert_eq!(
            parse_date_at("2m ago", now),
            PostedAt::Parsed(now - Duration::days(60))
        );
        assert_eq!(
            parse_date_at("1y", now),
            PostedAt::Parsed(now - Duration::days(365))
        );
        assert_eq!(
            parse_date_at("30+ days ago", now),
            PostedAt::Parsed(now - Duration::days(30))
        );
    }

    #[test]
    fn test_parse_date_against_wall_clock() {
        let before = Utc::now();
        let PostedAt::Parsed(ts) = parse_date("2h ago") else {
            panic!("relative date should parse");
        };
        let expected = before - Duration::hours(2);
        assert!((ts - expected).num_seconds().abs() <= 5);
    }

    #[test]
    fn test_parse_date_calendar_date_is_midnight() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(
            parse_date_at("2024-01-15", fixed_now()),
            PostedAt::Parsed(expected)
        );
    }

    #[test]
    fn test_parse_date_fallback_keeps_original() {
        assert_eq!(
            parse_date_at("Last Tuesday", fixed_now()),
            PostedAt::Unparsed("Last Tuesday".into())
        );
        assert_eq!(
            parse_date_at("5 minutes ago", fixed_now()),
            PostedAt::Unparsed("5 minutes ago".into())
        );
        assert_eq!(
            parse_date_at("2024-13-45", fixed_now()),
            PostedAt::Unparsed("2024-13-45".into())
        );
    }

    #[test]
    fn test_parse_date_is_idempotent() {
        let now = Utc::now();
        for input in ["2h ago", "just now", "2024-01-15", "some day"] {
            let first = parse_date_at(input, now);
            let second = parse_date_at(&first.to_string(), now);
            assert_eq!(first, second, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_extract_salary_range_with_period() {
        let salary = extract_salary("$80k - $100k per year");
        assert_eq!(
            salary,
            Salary {
                min: Some(80000.0),
                max: Some(100000.0),
                currency: Some("USD".into()),
                period: Some(SalaryPeriod::Yearly),
            }
        );
    }

    #[test]
    fn test_extract_salary_up_to_and_from() {
        let capped = extract_salary("up to $50k");
        assert_eq!(capped.min, None);
        assert_eq!(capped.max, Some(50000.0));
        assert_eq!(capped.currency.as_deref(), Some("USD"));

        let floor = extract_salary("From £40,000 - £55,000 a year");
        assert_eq!(floor.min, Some(40000.0));
        assert_eq!(floor.max, None);
        assert_eq!(floor.currency.as_deref(), Some("GBP"));
        assert_eq!(floor.period, Some(SalaryPeriod::Yearly));
    }

    #[test]
    fn test_extract_salary_empty_is_all_null() {
        assert_eq!(extract_salary(""), Salary::default());
        assert_eq!(extract_salary("   "), Salary::default());
    }

    #[test]
    fn test_single_number_is_a_floor() {
        let salary = extract_salary("€45/hr");
        assert_eq!(salary.min, Some(45.0));
        assert_eq!(salary.max, None);
        assert_eq!(salary.currency.as_deref(), Some("EUR"));
        assert_eq!(salary.period, Some(SalaryPeriod::Hourly));
    }

    #[test]
    fn test_k_suffix_before_letters() {
        let salary = extract_salary("$80kpa - $95kpa");
        assert_eq!(salary.min, Some(80_000.0));
        assert_eq!(salary.max, Some(95_000.0));

        let compact = extract_salary("€60k/yr");
        assert_eq!(compact.min, Some(60_000.0));
        assert_eq!(compact.period, Some(SalaryPeriod::Yearly));
    }

    #[test]
    fn test_tilde_range_and_thousands_separators() {
        let salary = extract_salary("₹1,200,000 ~ ₹1,800,000 annually");
        assert_eq!(salary.min, Some(1_200_000.0));
        assert_eq!(salary.max, Some(1_800_000.0));
        assert_eq!(salary.currency.as_deref(), Some("INR"));
        assert_eq!(salary.period, Some(SalaryPeriod::Yearly));
    }

    #[test]
    fn test_currency_table_order_wins() {
        // "$" precedes "¥" in the table even though "¥" appears first.
        let salary = extract_salary("¥5000000 ($35k)");
        assert_eq!(salary.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_period_table_precedence() {
        assert_eq!(
            extract_salary("$5000/mo").period,
            Some(SalaryPeriod::Monthly)
        );
        assert_eq!(
            extract_salary("$2k per week, 40 hours").period,
            Some(SalaryPeriod::Weekly)
        );
        assert_eq!(extract_salary("$50/hr remote").period, Some(SalaryPeriod::Hourly));
        assert_eq!(extract_salary("Competitive").period, None);
    }

    #[test]
    fn test_salary_is_idempotent() {
        for input in [
            "$80k - $100k per year",
            "up to $50k",
            "from €30k monthly",
            "£25.50 per hour",
            "$",
            "",
        ] {
            let first = extract_salary(input);
            let second = extract_salary(&first.to_string());
            assert_eq!(first, second, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_normalize_work_type() {
        assert_eq!(normalize_work_type("Remote"), Some("REMOTE"));
        assert_eq!(normalize_work_type("  Hybrid work "), Some("HYBRID"));
        assert_eq!(normalize_work_type("On-site"), Some("ON_SITE"));
        assert_eq!(normalize_work_type("ANY"), None);
        assert_eq!(normalize_work_type("Full-time"), None);
        assert_eq!(normalize_work_type(""), None);
    }

    #[test]
    fn test_normalize_listing_flags_fallbacks() {
        let raw = RawListing {
            id: Some(" 42 ".into()),
            title: Some("  Senior   Rust Engineer\n".into()),
            posted_date: Some("sometime".into()),
            salary: Some("Competitive".into()),
            work_type: Some("Remote".into()),
            ..Default::default()
        };
        let now = fixed_now();
        let out = normalize_listing(raw, &spec(), now);

        assert_eq!(out.job.id.as_deref(), Some("42"));
        assert_eq!(out.job.title.as_deref(), Some("Senior Rust Engineer"));
        assert_eq!(out.job.work_type.as_deref(), Some("REMOTE"));
        assert_eq!(out.job.posted_at, Some(PostedAt::Unparsed("sometime".into())));
        assert!(out.job.salary.is_empty());
        assert_eq!(out.job.scraped_at, now);
        assert!(out.date_fallback);
        assert!(out.salary_fallback);
    }

    #[test]
    fn test_normalize_listing_missing_fields_are_not_fallbacks() {
        let out = normalize_listing(RawListing::default(), &spec(), fixed_now());
        assert!(out.job.posted_at.is_none());
        assert!(out.job.salary.is_empty());
        assert!(!out.date_fallback);
        assert!(!out.salary_fallback);
    }
}
