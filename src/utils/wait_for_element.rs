//! Element polling utility for dynamically rendered review pages
//!
//! Provides wait_for_element() which polls for DOM elements with exponential backoff.
//! Review lists, sort menus and reply dialogs are all rendered by JavaScript
//! after the initial page load event fires.

use std::time::Duration;

use chromiumoxide::Page;
use chromiumoxide::element::Element;

use crate::automation::AutomationError;

/// Wait for an element to appear in the DOM using exponential backoff polling
///
/// # Arguments
/// * `page` - The chromiumoxide Page to search in
/// * `selector` - CSS selector for the element
/// * `timeout` - Maximum time to wait for the element
///
/// # Returns
/// * `Ok(Element)` - The element was found
/// * `Err(AutomationError::ElementTimeout)` - Timeout exceeded
///
/// # Polling Strategy
/// - Starts at 100ms intervals
/// - Doubles each retry (exponential backoff)
/// - Caps at 1 second maximum interval
/// - Total duration limited by timeout parameter
pub async fn wait_for_element(
    page: &Page,
    selector: &str,
    timeout: Duration,
) -> Result<Element, AutomationError> {
    let start = std::time::Instant::now();
    let mut poll_interval = Duration::from_millis(100);
    let max_interval = Duration::from_secs(1);

    loop {
        if let Ok(element) = page.find_element(selector).await {
            return Ok(element);
        }

        if start.elapsed() >= timeout {
            return Err(AutomationError::ElementTimeout {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }

        tokio::time::sleep(poll_interval).await;
        poll_interval = next_poll_interval(poll_interval, max_interval);
    }
}

/// Double the interval, but cap at max_interval
fn next_poll_interval(current: Duration, max: Duration) -> Duration {
    (current * 2).min(max)
}
