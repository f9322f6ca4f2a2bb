//! Testing utilities including mock implementations.
//!
//! These are useful for testing crawls without a browser or network:
//! `MockDriver` serves a scripted listing board with a load-more control,
//! `MockRuntime` records progress events and the final output.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use crate::dom;
use crate::error::{DriverError, DriverResult, RuntimeError, RuntimeResult};
use crate::traits::driver::{ConsoleMessage, ElementHandle, Expr, PageDriver};
use crate::traits::runtime::Runtime;
use crate::types::config::Selectors;
use crate::types::progress::{ProgressEvent, RunOutput};

const LOAD_MORE_ID: &str = "load-more";
const LOAD_MORE_HREF: &str = "/jobs/search/?start=more";

/// A scripted listing. Markup follows the default `Selectors`.
#[derive(Debug, Clone, Default)]
pub struct MockListing {
    pub id: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub posted_date: Option<String>,
    pub salary: Option<String>,
    pub work_type: Option<String>,
    pub description: Option<String>,
}

impl MockListing {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_posted_date(mut self, posted: impl Into<String>) -> Self {
        self.posted_date = Some(posted.into());
        self
    }

    pub fn with_salary(mut self, salary: impl Into<String>) -> Self {
        self.salary = Some(salary.into());
        self
    }

    pub fn with_work_type(mut self, work_type: impl Into<String>) -> Self {
        self.work_type = Some(work_type.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn handle_id(&self) -> String {
        format!("card-{}", self.id)
    }

    fn url(&self) -> String {
        format!("https://www.linkedin.com/jobs/view/{}", self.id)
    }

    /// Collapsed card markup; detail fields only when `with_details`.
    pub fn card_html(&self, with_details: bool) -> String {
        let mut html = format!(
            r#"<div class="job-card-container" data-job-id="{}">"#,
            escape(&self.id)
        );
        html.push_str(&format!(
            r#"<a class="job-card-list__title" href="{}">{}</a>"#,
            self.url(),
            field(&self.title)
        ));
        push_field(&mut html, "span", "job-card-container__company-name", &self.company);
        push_field(&mut html, "span", "job-card-container__metadata-item", &self.location);
        if let Some(posted) = &self.posted_date {
            html.push_str(&format!("<time>{}</time>", escape(posted)));
        }
        if with_details {
            html.push_str(&self.detail_fields());
        }
        html.push_str("</div>");
        html
    }

    /// Detail pane revealed by clicking the card.
    pub fn detail_html(&self) -> String {
        format!(r#"<section class="jobs-details">{}</section>"#, self.detail_fields())
    }

    fn detail_fields(&self) -> String {
        let mut html = String::new();
        push_field(&mut html, "div", "show-more-less-html__markup", &self.description);
        push_field(&mut html, "span", "compensation-metadata", &self.salary);
        push_field(&mut html, "span", "workplace-type", &self.work_type);
        html
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn field(value: &Option<String>) -> String {
    value.as_deref().map(escape).unwrap_or_default()
}

fn push_field(html: &mut String, tag: &str, class: &str, value: &Option<String>) {
    if let Some(value) = value {
        html.push_str(&format!(r#"<{tag} class="{class}">{}</{tag}>"#, escape(value)));
    }
}

/// Record of a call made to the mock driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockDriverCall {
    Navigate { url: String },
    Settle,
    QueryAll { selector: String },
    Evaluate { element: Option<String> },
    Click { element: String },
    Close,
}

#[derive(Default)]
struct MockState {
    loaded: bool,
    revealed: usize,
    detail: Option<usize>,
    closed: bool,
    navigation_failures: u32,
    load_more_failures: u32,
    calls: Vec<MockDriverCall>,
}

/// A mock page driver serving a scripted listing board.
///
/// Navigating to any search URL shows the first `page_size` listings.
/// Page-scoped evaluation reads the clicked listing's detail pane, or the
/// board itself when no listing has been opened.
/// Each load-more action appends the next `page_size` listings to the same
/// document, so earlier handles stay valid. The load-more control is
/// present while listings remain (or always, with `with_endless_load_more`).
pub struct MockDriver {
    listings: Vec<MockListing>,
    selectors: Selectors,
    page_size: usize,
    load_more_href: bool,
    endless_load_more: bool,
    reject_load_more: bool,
    collapsed_cards: bool,
    failing_listings: HashSet<String>,
    console_script: Vec<ConsoleMessage>,
    console: Mutex<Vec<ConsoleMessage>>,
    state: RwLock<MockState>,
}

impl MockDriver {
    pub fn new(listings: Vec<MockListing>) -> Self {
        Self {
            listings,
            selectors: Selectors::default(),
            page_size: 25,
            load_more_href: true,
            endless_load_more: false,
            reject_load_more: false,
            collapsed_cards: false,
            failing_listings: HashSet::new(),
            console_script: Vec::new(),
            console: Mutex::new(Vec::new()),
            state: RwLock::new(MockState::default()),
        }
    }

    /// Listings revealed per page load and per load-more.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Load-more control has no `href` and must be clicked.
    pub fn without_load_more_href(mut self) -> Self {
        self.load_more_href = false;
        self
    }

    /// Keep showing the load-more control after the board is exhausted.
    pub fn with_endless_load_more(mut self) -> Self {
        self.endless_load_more = true;
        self
    }

    /// Every load-more action fails with a non-retryable error.
    pub fn rejecting_load_more(mut self) -> Self {
        self.reject_load_more = true;
        self
    }

    /// Cards omit description, salary and work type (click to reveal).
    pub fn with_collapsed_cards(mut self) -> Self {
        self.collapsed_cards = true;
        self
    }

    /// The listing vanishes whenever it is read or clicked.
    pub fn failing_listing(mut self, id: impl Into<String>) -> Self {
        self.failing_listings.insert(id.into());
        self
    }

    /// The next `count` search navigations fail with HTTP 503.
    pub fn failing_navigations(self, count: u32) -> Self {
        self.state.write().unwrap().navigation_failures = count;
        self
    }

    /// The next `count` load-more actions fail with HTTP 503.
    pub fn failing_load_more(self, count: u32) -> Self {
        self.state.write().unwrap().load_more_failures = count;
        self
    }

    /// Messages the page reports on every navigation.
    pub fn with_console(mut self, message: ConsoleMessage) -> Self {
        self.console_script.push(message);
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockDriverCall> {
        self.state.read().unwrap().calls.clone()
    }

    /// URLs passed to `navigate`, in order.
    pub fn navigations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockDriverCall::Navigate { url } => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn was_closed(&self) -> bool {
        self.state.read().unwrap().closed
    }

    fn record(&self, call: MockDriverCall) {
        self.state.write().unwrap().calls.push(call);
    }

    fn load_more_html(&self) -> String {
        if self.load_more_href {
            format!(r#"<button class="see-more-jobs" href="{LOAD_MORE_HREF}">See more jobs</button>"#)
        } else {
            r#"<button class="see-more-jobs">See more jobs</button>"#.to_string()
        }
    }

    /// The listing page itself: revealed cards plus the load-more control.
    fn board_html(&self, revealed: usize) -> String {
        let mut html = String::from(r#"<main class="jobs-search">"#);
        for listing in &self.listings[..revealed] {
            html.push_str(&listing.card_html(!self.collapsed_cards));
        }
        html.push_str(&self.load_more_html());
        html.push_str("</main>");
        html
    }

    /// Index of a revealed listing behind a handle.
    fn listing_index(&self, element: &ElementHandle) -> DriverResult<usize> {
        let detached = || DriverError::Detached {
            id: element.id().to_string(),
        };
        let state = self.state.read().unwrap();
        let index = self.listings[..state.revealed]
            .iter()
            .position(|l| l.handle_id() == element.id())
            .ok_or_else(detached)?;
        if self.failing_listings.contains(&self.listings[index].id) {
            return Err(detached());
        }
        Ok(index)
    }

    fn load_more(&self) -> DriverResult<()> {
        if self.reject_load_more {
            return Err(DriverError::Unsupported("load more is not clickable".into()));
        }
        let mut state = self.state.write().unwrap();
        if state.load_more_failures > 0 {
            state.load_more_failures -= 1;
            return Err(DriverError::Status {
                status: 503,
                url: LOAD_MORE_HREF.to_string(),
            });
        }
        state.revealed = (state.revealed + self.page_size).min(self.listings.len());
        state.detail = None;
        Ok(())
    }

    fn emit_console(&self) {
        self.console
            .lock()
            .unwrap()
            .extend(self.console_script.iter().cloned());
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        self.record(MockDriverCall::Navigate {
            url: url.to_string(),
        });

        if url == LOAD_MORE_HREF && self.state.read().unwrap().loaded {
            self.load_more()?;
            self.emit_console();
            return Ok(());
        }

        {
            let mut state = self.state.write().unwrap();
            if state.navigation_failures > 0 {
                state.navigation_failures -= 1;
                return Err(DriverError::Status {
                    status: 503,
                    url: url.to_string(),
                });
            }
            state.loaded = true;
            state.closed = false;
            state.revealed = self.page_size.min(self.listings.len());
            state.detail = None;
        }
        self.emit_console();
        Ok(())
    }

    async fn wait_until_settled(&self, _timeout: Duration) -> DriverResult<()> {
        self.record(MockDriverCall::Settle);
        if !self.state.read().unwrap().loaded {
            return Err(DriverError::NotLoaded);
        }
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> DriverResult<Vec<ElementHandle>> {
        self.record(MockDriverCall::QueryAll {
            selector: selector.to_string(),
        });
        let state = self.state.read().unwrap();
        if !state.loaded {
            return Err(DriverError::NotLoaded);
        }

        if selector == self.selectors.card {
            Ok(self.listings[..state.revealed]
                .iter()
                .map(|l| ElementHandle::new(l.handle_id()))
                .collect())
        } else if selector == self.selectors.load_more {
            let more = state.revealed < self.listings.len() || self.endless_load_more;
            Ok(if more {
                vec![ElementHandle::new(LOAD_MORE_ID)]
            } else {
                Vec::new()
            })
        } else {
            Ok(Vec::new())
        }
    }

    async fn evaluate(
        &self,
        element: Option<&ElementHandle>,
        expr: &Expr,
    ) -> DriverResult<Option<String>> {
        self.record(MockDriverCall::Evaluate {
            element: element.map(|e| e.id().to_string()),
        });

        match element {
            Some(element) if element.id() == LOAD_MORE_ID => {
                dom::evaluate_fragment(&self.load_more_html(), expr)
            }
            Some(element) => {
                let index = self.listing_index(element)?;
                let html = self.listings[index].card_html(!self.collapsed_cards);
                dom::evaluate_fragment(&html, expr)
            }
            None => {
                let (detail, revealed) = {
                    let state = self.state.read().unwrap();
                    (state.detail, state.revealed)
                };
                match detail {
                    Some(index) => dom::evaluate_fragment(&self.listings[index].detail_html(), expr),
                    None => dom::evaluate_fragment(&self.board_html(revealed), expr),
                }
            }
        }
    }

    async fn click(&self, element: &ElementHandle) -> DriverResult<()> {
        self.record(MockDriverCall::Click {
            element: element.id().to_string(),
        });

        if element.id() == LOAD_MORE_ID {
            return self.load_more();
        }
        let index = self.listing_index(element)?;
        self.state.write().unwrap().detail = Some(index);
        Ok(())
    }

    fn drain_console(&self) -> Vec<ConsoleMessage> {
        std::mem::take(&mut *self.console.lock().unwrap())
    }

    async fn close(&self) -> DriverResult<()> {
        self.record(MockDriverCall::Close);
        let mut state = self.state.write().unwrap();
        state.closed = true;
        state.loaded = false;
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock runtime recording everything pushed to it.
pub struct MockRuntime {
    input: serde_json::Value,
    fail_progress: bool,
    fail_output: bool,
    events: RwLock<Vec<ProgressEvent>>,
    output: RwLock<Option<RunOutput>>,
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRuntime {
    pub fn new() -> Self {
        Self {
            input: serde_json::json!({}),
            fail_progress: false,
            fail_output: false,
            events: RwLock::new(Vec::new()),
            output: RwLock::new(None),
        }
    }

    /// Set the run input record.
    pub fn with_input(mut self, input: serde_json::Value) -> Self {
        self.input = input;
        self
    }

    /// Every progress push fails.
    pub fn failing_progress(mut self) -> Self {
        self.fail_progress = true;
        self
    }

    /// Persisting the final output fails.
    pub fn failing_output(mut self) -> Self {
        self.fail_output = true;
        self
    }

    /// Progress events pushed so far.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.read().unwrap().clone()
    }

    /// The final output, if one was set.
    pub fn output(&self) -> Option<RunOutput> {
        self.output.read().unwrap().clone()
    }
}

#[async_trait]
impl Runtime for MockRuntime {
    async fn get_run_input(&self) -> RuntimeResult<serde_json::Value> {
        Ok(self.input.clone())
    }

    async fn push_progress(&self, event: &ProgressEvent) -> RuntimeResult<()> {
        if self.fail_progress {
            return Err(RuntimeError::Io(std::io::Error::other(
                "progress channel closed",
            )));
        }
        self.events.write().unwrap().push(event.clone());
        Ok(())
    }

    async fn set_final_output(&self, output: &RunOutput) -> RuntimeResult<()> {
        if self.fail_output {
            return Err(RuntimeError::Io(std::io::Error::other("output store unavailable")));
        }
        *self.output.write().unwrap() = Some(output.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_board_reveals_pages() {
        let driver = MockDriver::new((1..=5).map(|i| MockListing::new(i.to_string())).collect())
            .with_page_size(2);
        let selectors = Selectors::default();

        driver.navigate("https://example.com/jobs").await.unwrap();
        assert_eq!(driver.query_all(&selectors.card).await.unwrap().len(), 2);

        let more = driver.query_all(&selectors.load_more).await.unwrap();
        let href = driver
            .evaluate(Some(&more[0]), &Expr::own_attr("href"))
            .await
            .unwrap()
            .unwrap();
        driver.navigate(&href).await.unwrap();
        assert_eq!(driver.query_all(&selectors.card).await.unwrap().len(), 4);

        driver.click(&more[0]).await.unwrap();
        assert_eq!(driver.query_all(&selectors.card).await.unwrap().len(), 5);
        assert!(driver.query_all(&selectors.load_more).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failing_listing_is_detached() {
        let driver = MockDriver::new(vec![MockListing::new("1")]).failing_listing("1");
        driver.navigate("https://example.com/jobs").await.unwrap();
        let cards = driver.query_all(".job-card-container").await.unwrap();
        let err = driver
            .evaluate(Some(&cards[0]), &Expr::outer_html())
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Detached { .. }));
    }

    #[tokio::test]
    async fn test_click_reveals_detail() {
        let listing = MockListing::new("7").with_description("Build things");
        let driver = MockDriver::new(vec![listing]).with_collapsed_cards();
        driver.navigate("https://example.com/jobs").await.unwrap();
        let cards = driver.query_all(".job-card-container").await.unwrap();

        let expr = Expr::text(".show-more-less-html__markup");
        assert_eq!(driver.evaluate(None, &expr).await.unwrap(), None);
        driver.click(&cards[0]).await.unwrap();
        assert_eq!(
            driver.evaluate(None, &expr).await.unwrap().as_deref(),
            Some("Build things")
        );
    }

    #[tokio::test]
    async fn test_open_detail_replaces_page_scope() {
        let driver = MockDriver::new(vec![
            MockListing::new("1").with_salary("$90k per year"),
            MockListing::new("2"),
        ]);
        driver.navigate("https://example.com/jobs").await.unwrap();
        let cards = driver.query_all(".job-card-container").await.unwrap();

        let salary = Expr::text(".compensation-metadata");
        assert_eq!(
            driver.evaluate(None, &salary).await.unwrap().as_deref(),
            Some("$90k per year")
        );
        driver.click(&cards[1]).await.unwrap();
        assert_eq!(driver.evaluate(None, &salary).await.unwrap(), None);
    }
}
