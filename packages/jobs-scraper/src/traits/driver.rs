//! Page driver trait: the browser/session capabilities the crawler needs.
//!
//! A driver owns one page. Implementations range from a headless browser
//! session to a static HTML fetcher (`HttpDriver`); the crawler and both
//! extraction strategies only talk to this trait.
//!
//! # Usage
//!
//! ```rust,ignore
//! driver.navigate("https://example.com/jobs?keywords=rust").await?;
//! driver.wait_until_settled(Duration::from_secs(10)).await?;
//! for card in driver.query_all(".job-card-container").await? {
//!     let title = driver.evaluate(Some(&card), &Expr::text("h3")).await?;
//! }
//! ```

use async_trait::async_trait;
use std::time::Duration;

use crate::error::DriverResult;

/// Opaque reference to an element on the driver's current page.
///
/// Handles are only valid until the page is replaced; using a stale
/// handle yields `DriverError::Detached`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    id: String,
}

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Stable key for the element. Unique within a run for a given driver.
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// What to read from an element (or the page).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Whitespace-collapsed text of the scope, or of the first descendant
    /// matching `selector`.
    Text { selector: Option<String> },

    /// Attribute of the scope, or of the first descendant matching `selector`.
    Attribute {
        selector: Option<String>,
        name: String,
    },

    /// Outer HTML of the scope element.
    OuterHtml,
}

impl Expr {
    pub fn text(selector: impl Into<String>) -> Self {
        Expr::Text {
            selector: Some(selector.into()),
        }
    }

    pub fn own_text() -> Self {
        Expr::Text { selector: None }
    }

    pub fn attr(selector: impl Into<String>, name: impl Into<String>) -> Self {
        Expr::Attribute {
            selector: Some(selector.into()),
            name: name.into(),
        }
    }

    pub fn own_attr(name: impl Into<String>) -> Self {
        Expr::Attribute {
            selector: None,
            name: name.into(),
        }
    }

    pub fn outer_html() -> Self {
        Expr::OuterHtml
    }
}

/// Severity of a message the page itself reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Info,
    Error,
}

/// Console output or page error captured by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleMessage {
    pub level: ConsoleLevel,
    pub text: String,
}

impl ConsoleMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: ConsoleLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: ConsoleLevel::Error,
            text: text.into(),
        }
    }
}

#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Load a URL into the page. Relative URLs resolve against the current page.
    async fn navigate(&self, url: &str) -> DriverResult<()>;

    /// Wait until the page has finished loading content.
    async fn wait_until_settled(&self, timeout: Duration) -> DriverResult<()>;

    /// All elements matching a selector, in document order.
    async fn query_all(&self, selector: &str) -> DriverResult<Vec<ElementHandle>>;

    /// Read a value from an element, or from the page when `element` is `None`.
    ///
    /// A missing target is `Ok(None)`; only a vanished scope element is an error.
    async fn evaluate(
        &self,
        element: Option<&ElementHandle>,
        expr: &Expr,
    ) -> DriverResult<Option<String>>;

    /// Click an element (reveal details, load more results).
    async fn click(&self, element: &ElementHandle) -> DriverResult<()>;

    /// Take console output and page errors collected since the last call.
    fn drain_console(&self) -> Vec<ConsoleMessage> {
        Vec::new()
    }

    /// Release the page/session.
    async fn close(&self) -> DriverResult<()> {
        Ok(())
    }

    /// Driver name (for logging).
    fn name(&self) -> &str {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_constructors() {
        assert_eq!(
            Expr::text("h3"),
            Expr::Text {
                selector: Some("h3".into())
            }
        );
        assert_eq!(
            Expr::own_attr("data-job-id"),
            Expr::Attribute {
                selector: None,
                name: "data-job-id".into()
            }
        );
    }

    #[test]
    fn test_handle_identity() {
        let a = ElementHandle::new("p0:1");
        assert_eq!(a.id(), "p0:1");
        assert_eq!(a, ElementHandle::new("p0:1"));
        assert_ne!(a, ElementHandle::new("p1:1"));
    }
}
