//! Bulk extraction from an HTML snapshot of each listing card.

use async_trait::async_trait;
use scraper::{ElementRef, Html};

use crate::dom;
use crate::error::{DriverResult, ExtractionError, ExtractionResult};
use crate::traits::driver::{ElementHandle, Expr, PageDriver};
use crate::traits::extractor::RecordExtractor;
use crate::types::config::Selectors;
use crate::types::listing::RawListing;

/// Reads every field from the card's outer HTML in one round trip.
///
/// The snapshot is parsed locally, so nothing on the page changes and
/// listings can be extracted concurrently.
pub struct StaticHtmlExtractor {
    selectors: Selectors,
}

impl StaticHtmlExtractor {
    /// Create the extractor. Fails if any selector does not parse.
    pub fn new(selectors: Selectors) -> DriverResult<Self> {
        for selector in [
            &selectors.title,
            &selectors.company,
            &selectors.location,
            &selectors.posted_date,
            &selectors.url,
            &selectors.description,
            &selectors.salary,
            &selectors.work_type,
        ] {
            dom::compile_selector(selector)?;
        }
        Ok(Self { selectors })
    }

    /// Parse one card snapshot.
    pub fn read_snapshot(&self, html: &str) -> RawListing {
        let fragment = Html::parse_fragment(html);
        let Some(card) = dom::fragment_element(&fragment) else {
            return RawListing::default();
        };

        let s = &self.selectors;
        let read = |expr: Expr| dom::evaluate(card, &expr).ok().flatten();

        RawListing {
            id: read(Expr::own_attr(&s.id_attribute))
                .or_else(|| read(Expr::attr(format!("[{}]", s.id_attribute), &s.id_attribute))),
            title: read(Expr::text(&s.title)),
            company: read(Expr::text(&s.company)),
            location: read(Expr::text(&s.location)),
            description: read_description(card, &s.description),
            posted_date: read(Expr::attr(&s.posted_date, "datetime"))
                .or_else(|| read(Expr::text(&s.posted_date))),
            salary: read(Expr::text(&s.salary)),
            work_type: read(Expr::text(&s.work_type)),
            url: read(Expr::attr(&s.url, "href")),
        }
    }
}

/// Description keeps line structure; only the outer whitespace goes.
fn read_description(card: ElementRef<'_>, selector: &str) -> Option<String> {
    let selector = dom::compile_selector(selector).ok()?;
    let element = card.select(&selector).next()?;
    let text = element.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[async_trait]
impl RecordExtractor for StaticHtmlExtractor {
    async fn extract(
        &self,
        driver: &dyn PageDriver,
        listing: &ElementHandle,
    ) -> ExtractionResult<RawListing> {
        let snapshot = driver
            .evaluate(Some(listing), &Expr::outer_html())
            .await
            .map_err(|source| ExtractionError::Unavailable {
                id: listing.id().to_string(),
                source,
            })?;

        match snapshot {
            Some(html) if !html.trim().is_empty() => Ok(self.read_snapshot(&html)),
            _ => Err(ExtractionError::Empty {
                id: listing.id().to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        "static_html"
    }
}
