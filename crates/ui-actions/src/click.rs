//! Escalating interaction tactics.

use tracing::{debug, warn};

use meshpilot_page_port::{ElementRef, PageError, PagePort};

/// Click with escalating robustness: plain click, then forced click, then a
/// synthetic pointer event at the element's bounding-box center.
///
/// Each tier is attempted only after the previous one failed with an error
/// escalation can help with; a stale handle or a closed page propagates
/// immediately. The last error propagates when every tier is exhausted.
pub async fn robust_click(page: &dyn PagePort, element: &ElementRef) -> Result<(), PageError> {
    // Best effort; some drivers scroll implicitly.
    let _ = page.scroll_into_view(element).await;

    let plain = match page.click(element).await {
        Ok(()) => return Ok(()),
        Err(err) if err.is_escalatable() => {
            warn!(element = %element.label, %err, "plain click failed, forcing");
            err
        }
        Err(err) => return Err(err),
    };

    let forced = match page.force_click(element).await {
        Ok(()) => {
            debug!(element = %element.label, "forced click succeeded");
            return Ok(());
        }
        Err(err) if err.is_escalatable() => {
            warn!(element = %element.label, %err, "forced click failed, trying pointer event");
            err
        }
        Err(err) => return Err(err),
    };

    match page.state(element).await {
        Ok(state) => {
            if let Some((x, y)) = state.center() {
                return page.pointer_click(x, y).await;
            }
            // No layout box to aim at; the forced-click error is the real story.
            Err(forced)
        }
        Err(_) => Err(plain),
    }
}

/// Fill a text control, focusing it first when the driver requires it.
pub async fn fill_text(
    page: &dyn PagePort,
    element: &ElementRef,
    text: &str,
) -> Result<(), PageError> {
    // Focus via click is best-effort; contenteditable hosts accept fill anyway.
    let _ = page.click(element).await;
    page.fill(element, text).await
}

/// Fill a text control and submit it with Enter.
pub async fn submit_text(
    page: &dyn PagePort,
    element: &ElementRef,
    text: &str,
) -> Result<(), PageError> {
    fill_text(page, element, text).await?;
    page.press(element, "Enter").await
}
