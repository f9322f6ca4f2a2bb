//! Click-to-reveal extraction.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::error::{DriverError, ExtractionError, ExtractionResult};
use crate::traits::driver::{ElementHandle, Expr, PageDriver};
use crate::traits::extractor::RecordExtractor;
use crate::types::config::{ScraperSettings, Selectors};
use crate::types::listing::RawListing;

/// Expands each listing and reads the detail pane.
///
/// Card fields are read relative to the listing element; description,
/// salary and work type come from the page-level detail pane that the
/// click reveals. Only one listing can be expanded at a time.
pub struct InteractiveExtractor {
    selectors: Selectors,
    settle_timeout: Duration,
    animation_frame_delay: Duration,
}

impl InteractiveExtractor {
    pub fn new(settings: &ScraperSettings) -> Self {
        Self {
            selectors: settings.selectors.clone(),
            settle_timeout: settings.settle_timeout(),
            animation_frame_delay: settings.animation_frame_delay(),
        }
    }

    async fn read_card(
        &self,
        driver: &dyn PageDriver,
        listing: &ElementHandle,
        expr: Expr,
    ) -> ExtractionResult<Option<String>> {
        match driver.evaluate(Some(listing), &expr).await {
            Ok(value) => Ok(value),
            Err(source @ DriverError::Detached { .. }) => Err(ExtractionError::Unavailable {
                id: listing.id().to_string(),
                source,
            }),
            Err(e) => {
                debug!(listing = listing.id(), error = %e, "Card field unreadable");
                Ok(None)
            }
        }
    }

    async fn read_detail(&self, driver: &dyn PageDriver, expr: Expr) -> Option<String> {
        match driver.evaluate(None, &expr).await {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "Detail field unreadable");
                None
            }
        }
    }
}

#[async_trait]
impl RecordExtractor for InteractiveExtractor {
    async fn extract(
        &self,
        driver: &dyn PageDriver,
        listing: &ElementHandle,
    ) -> ExtractionResult<RawListing> {
        let unavailable = |source| ExtractionError::Unavailable {
            id: listing.id().to_string(),
            source,
        };

        driver.click(listing).await.map_err(unavailable)?;
        driver
            .wait_until_settled(self.settle_timeout)
            .await
            .map_err(unavailable)?;
        if !self.animation_frame_delay.is_zero() {
            tokio::time::sleep(self.animation_frame_delay).await;
        }

        let s = &self.selectors;
        let id = match self
            .read_card(driver, listing, Expr::own_attr(&s.id_attribute))
            .await?
        {
            Some(id) => Some(id),
            None => {
                self.read_card(
                    driver,
                    listing,
                    Expr::attr(format!("[{}]", s.id_attribute), &s.id_attribute),
                )
                .await?
            }
        };

        let posted_date = match self
            .read_card(driver, listing, Expr::attr(&s.posted_date, "datetime"))
            .await?
        {
            Some(date) => Some(date),
            None => {
                self.read_card(driver, listing, Expr::text(&s.posted_date))
                    .await?
            }
        };

        Ok(RawListing {
            id,
            title: self.read_card(driver, listing, Expr::text(&s.title)).await?,
            company: self.read_card(driver, listing, Expr::text(&s.company)).await?,
            location: self.read_card(driver, listing, Expr::text(&s.location)).await?,
            posted_date,
            url: self.read_card(driver, listing, Expr::attr(&s.url, "href")).await?,
            description: self.read_detail(driver, Expr::text(&s.description)).await,
            salary: self.read_detail(driver, Expr::text(&s.salary)).await,
            work_type: self.read_detail(driver, Expr::text(&s.work_type)).await,
        })
    }

    fn is_isolated(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "interactive"
    }
}
