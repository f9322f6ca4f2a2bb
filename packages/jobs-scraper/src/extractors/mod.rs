//! Record extraction strategies.
//!
//! - [`StaticHtmlExtractor`] - parse a snapshot of each card (default)
//! - [`InteractiveExtractor`] - expand each card and read the detail pane

pub mod interactive;
pub mod static_html;

pub use interactive::InteractiveExtractor;
pub use static_html::StaticHtmlExtractor;

use crate::error::DriverResult;
use crate::traits::extractor::RecordExtractor;
use crate::types::config::{ExtractionStrategy, ScraperSettings};

/// Build the extractor selected in the settings.
pub fn build_extractor(settings: &ScraperSettings) -> DriverResult<Box<dyn RecordExtractor>> {
    Ok(match settings.strategy {
        ExtractionStrategy::Static => Box::new(StaticHtmlExtractor::new(settings.selectors.clone())?),
        ExtractionStrategy::Interactive => Box::new(InteractiveExtractor::new(settings)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_selects_extractor() {
        let bulk = build_extractor(&ScraperSettings::default()).unwrap();
        assert_eq!(bulk.name(), "static_html");
        assert!(bulk.is_isolated());

        let settings = ScraperSettings::default().with_strategy(ExtractionStrategy::Interactive);
        let interactive = build_extractor(&settings).unwrap();
        assert_eq!(interactive.name(), "interactive");
        assert!(!interactive.is_isolated());
    }
}
