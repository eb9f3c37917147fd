//! Element polling for a JavaScript-rendered UI
//!
//! The target application renders its controls asynchronously after page
//! load, so every locate operation polls with exponential backoff instead
//! of assuming the element exists.

use std::time::Duration;

use chromiumoxide::Page;
use chromiumoxide::element::Element;

use crate::browser::{BrowserError, BrowserResult};

/// Wait for an element matching an XPath locator to appear in the DOM.
///
/// Polls with exponential backoff: starts at 100ms, doubles each retry,
/// caps at 1 second, gives up when `timeout` elapses.
pub async fn wait_for_element(
    page: &Page,
    locator: &str,
    timeout: Duration,
) -> BrowserResult<Element> {
    let start = std::time::Instant::now();
    let mut poll_interval = Duration::from_millis(100);
    let max_interval = Duration::from_secs(1);

    loop {
        if let Ok(element) = page.find_xpath(locator).await {
            return Ok(element);
        }

        if start.elapsed() >= timeout {
            return Err(BrowserError::InteractionFailed(format!(
                "Element not found (timeout after {}ms): '{}'",
                timeout.as_millis(),
                locator
            )));
        }

        tokio::time::sleep(poll_interval).await;
        poll_interval = (poll_interval * 2).min(max_interval);
    }
}

/// Wait until an element is present AND laid out (visible).
///
/// Presence in the DOM is not enough for the target app: mode options and
/// cards exist hidden before their container opens. Visibility is probed
/// via `offsetParent`, which is null for elements removed from layout.
pub async fn wait_for_visible(
    page: &Page,
    locator: &str,
    timeout: Duration,
) -> BrowserResult<Element> {
    let start = std::time::Instant::now();
    let mut poll_interval = Duration::from_millis(100);
    let max_interval = Duration::from_secs(1);

    loop {
        if let Ok(element) = page.find_xpath(locator).await
            && is_visible(&element).await
        {
            return Ok(element);
        }

        if start.elapsed() >= timeout {
            return Err(BrowserError::InteractionFailed(format!(
                "Element not visible (timeout after {}ms): '{}'",
                timeout.as_millis(),
                locator
            )));
        }

        tokio::time::sleep(poll_interval).await;
        poll_interval = (poll_interval * 2).min(max_interval);
    }
}

/// Check whether an element currently participates in layout
pub async fn is_visible(element: &Element) -> bool {
    match element
        .call_js_fn("function() { return this.offsetParent !== null; }", false)
        .await
    {
        Ok(result) => result
            .result
            .value
            .as_ref()
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        Err(_) => false,
    }
}
