//! Static HTML page driver backed by `reqwest` and `scraper`.
//!
//! There is no script execution: a page is settled as soon as it has been
//! fetched, and "clicking" an element follows its link into a detail slot.
//! While a detail is open, page-scoped evaluation reads only the detail.

use async_trait::async_trait;
use scraper::Html;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::dom;
use crate::error::{DriverError, DriverResult};
use crate::traits::driver::{ConsoleMessage, ElementHandle, Expr, PageDriver};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Default)]
struct PageState {
    url: Option<Url>,
    document: Option<String>,
    detail: Option<String>,
    /// Outer HTML of every element handed out for the current document.
    elements: HashMap<String, String>,
}

/// Page driver that fetches documents over HTTP.
///
/// # Example
///
/// ```rust,ignore
/// let driver = HttpDriver::new()?;
/// driver.navigate("https://www.linkedin.com/jobs/search/?keywords=rust").await?;
/// let cards = driver.query_all(".job-card-container").await?;
/// ```
pub struct HttpDriver {
    client: reqwest::Client,
    user_agent: String,
    state: Mutex<PageState>,
    console: Mutex<Vec<ConsoleMessage>>,
}

impl HttpDriver {
    pub fn new() -> DriverResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DriverError::Http(Box::new(e)))?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            state: Mutex::new(PageState::default()),
            console: Mutex::new(Vec::new()),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn log(&self, message: ConsoleMessage) {
        self.console
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message);
    }

    fn resolve(&self, url: &str) -> DriverResult<Url> {
        let base = self.state().url.clone();
        let resolved = match base {
            Some(base) => base.join(url),
            None => Url::parse(url),
        };
        resolved.map_err(|_| DriverError::InvalidUrl(url.to_string()))
    }

    async fn fetch(&self, url: Url) -> DriverResult<(Url, String)> {
        debug!(url = %url, "HTTP fetch starting");
        let response = self
            .client
            .get(url.clone())
            .header("User-Agent", &self.user_agent)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "HTTP request failed");
                DriverError::Http(Box::new(e))
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(DriverError::RateLimited {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(DriverError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| DriverError::Http(Box::new(e)))?;
        Ok((final_url, body))
    }

    /// Outer HTML behind a handle, or `Detached` if the page moved on.
    fn element_html(&self, element: &ElementHandle) -> DriverResult<String> {
        self.state()
            .elements
            .get(element.id())
            .cloned()
            .ok_or_else(|| DriverError::Detached {
                id: element.id().to_string(),
            })
    }
}

/// Stable id for an element: content hash plus occurrence index.
///
/// Identical markup on a later page maps to the same id, so a listing that
/// reappears after pagination is recognized as already seen.
fn element_id(outer_html: &str, occurrence: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(outer_html.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    if occurrence == 0 {
        digest[..16].to_string()
    } else {
        format!("{}-{}", &digest[..16], occurrence)
    }
}

fn select_outer_html(document: &str, selector: &str) -> DriverResult<Vec<String>> {
    let selector = dom::compile_selector(selector)?;
    let html = Html::parse_document(document);
    Ok(html.select(&selector).map(|el| el.html()).collect())
}

fn evaluate_document(document: &str, expr: &Expr) -> DriverResult<Option<String>> {
    let html = Html::parse_document(document);
    dom::evaluate(html.root_element(), expr)
}

/// Link an element points at: its own `href`, else its first descendant link.
fn link_target(outer_html: &str) -> DriverResult<Option<String>> {
    Ok(dom::evaluate_fragment(outer_html, &Expr::own_attr("href"))?
        .or(dom::evaluate_fragment(outer_html, &Expr::attr("a[href]", "href"))?))
}

#[async_trait]
impl PageDriver for HttpDriver {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        let target = self.resolve(url)?;
        let (final_url, body) = self.fetch(target).await?;

        self.log(ConsoleMessage::info(format!(
            "Loaded {} ({} bytes)",
            final_url,
            body.len()
        )));

        let mut state = self.state();
        state.url = Some(final_url);
        state.document = Some(body);
        state.detail = None;
        state.elements.clear();
        Ok(())
    }

    async fn wait_until_settled(&self, _timeout: Duration) -> DriverResult<()> {
        if self.state().document.is_none() {
            return Err(DriverError::NotLoaded);
        }
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> DriverResult<Vec<ElementHandle>> {
        let mut state = self.state();
        let document = state.document.as_deref().ok_or(DriverError::NotLoaded)?;
        let matches = select_outer_html(document, selector)?;

        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut handles = Vec::with_capacity(matches.len());
        for outer_html in matches {
            let occurrence = seen.entry(outer_html.clone()).or_insert(0);
            let id = element_id(&outer_html, *occurrence);
            *occurrence += 1;
            state.elements.insert(id.clone(), outer_html);
            handles.push(ElementHandle::new(id));
        }
        Ok(handles)
    }

    async fn evaluate(
        &self,
        element: Option<&ElementHandle>,
        expr: &Expr,
    ) -> DriverResult<Option<String>> {
        if let Some(element) = element {
            let outer_html = self.element_html(element)?;
            return dom::evaluate_fragment(&outer_html, expr);
        }

        let (detail, document) = {
            let state = self.state();
            (state.detail.clone(), state.document.clone())
        };
        let document = document.ok_or(DriverError::NotLoaded)?;

        // An opened detail replaces the page scope; its missing fields stay missing.
        match detail {
            Some(detail) => evaluate_document(&detail, expr),
            None => evaluate_document(&document, expr),
        }
    }

    async fn click(&self, element: &ElementHandle) -> DriverResult<()> {
        let outer_html = self.element_html(element)?;
        let href = link_target(&outer_html)?.ok_or_else(|| {
            DriverError::Unsupported(format!("element {} has no link to follow", element.id()))
        })?;

        let target = self.resolve(&href)?;
        let (final_url, body) = self.fetch(target).await?;
        self.log(ConsoleMessage::info(format!("Opened detail {final_url}")));

        self.state().detail = Some(body);
        Ok(())
    }

    fn drain_console(&self) -> Vec<ConsoleMessage> {
        std::mem::take(
            &mut *self
                .console
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }

    async fn close(&self) -> DriverResult<()> {
        *self.state() = PageState::default();
        Ok(())
    }

    fn name(&self) -> &str {
        "http"
    }
}
