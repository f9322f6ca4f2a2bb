//! Expression evaluation over parsed HTML (`scraper`).
//!
//! Shared by the static HTML extractor and the HTTP driver so both read
//! markup with the same rules.

use scraper::{ElementRef, Html, Selector};

use crate::error::{DriverError, DriverResult};
use crate::traits::driver::Expr;

pub fn compile_selector(selector: &str) -> DriverResult<Selector> {
    Selector::parse(selector).map_err(|_| DriverError::InvalidSelector(selector.to_string()))
}

/// Text content with whitespace runs collapsed. Empty text is `None`.
pub fn collapsed_text(element: ElementRef<'_>) -> Option<String> {
    let text = element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

/// Evaluate an expression with `scope` as the context element.
///
/// Selectors match descendants of the scope. A selector with no match is
/// `Ok(None)`.
pub fn evaluate(scope: ElementRef<'_>, expr: &Expr) -> DriverResult<Option<String>> {
    match expr {
        Expr::Text { selector: None } => Ok(collapsed_text(scope)),
        Expr::Text {
            selector: Some(selector),
        } => Ok(first_match(scope, selector)?.and_then(collapsed_text)),
        Expr::Attribute {
            selector: None,
            name,
        } => Ok(scope.value().attr(name).map(str::to_string)),
        Expr::Attribute {
            selector: Some(selector),
            name,
        } => Ok(first_match(scope, selector)?
            .and_then(|el| el.value().attr(name))
            .map(str::to_string)),
        Expr::OuterHtml => Ok(Some(scope.html())),
    }
}

fn first_match<'a>(scope: ElementRef<'a>, selector: &str) -> DriverResult<Option<ElementRef<'a>>> {
    let selector = compile_selector(selector)?;
    Ok(scope.select(&selector).next())
}

/// First element of a fragment (the element a snapshot was taken of).
pub fn fragment_element(fragment: &Html) -> Option<ElementRef<'_>> {
    fragment
        .root_element()
        .children()
        .filter_map(ElementRef::wrap)
        .next()
}

/// Evaluate an expression against a standalone element snapshot.
pub fn evaluate_fragment(outer_html: &str, expr: &Expr) -> DriverResult<Option<String>> {
    let fragment = Html::parse_fragment(outer_html);
    match fragment_element(&fragment) {
        Some(scope) => evaluate(scope, expr),
        None => Ok(None),
    }
}
