//! Bounded waits over the page seam.
//!
//! Optional-step branching is an explicit conditional here: helpers return
//! `Option` on absence instead of throwing, so callers never suppress
//! timeouts as control flow.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use meshpilot_core_types::FlowTimeouts;
use meshpilot_page_port::{ElementQuery, ElementRef, PagePort, TextMatch};

/// Candidate locations of the activity counter, in priority order.
pub fn activity_queries() -> Vec<ElementQuery> {
    vec![
        ElementQuery::role("status", TextMatch::Contains("activity".into())),
        ElementQuery::css("[data-activity-count]"),
    ]
}

/// Advisory heartbeat: wait for the app's activity counter to move past
/// `previous`.
///
/// Never fails. If the counter element is absent on this build of the app, a
/// short unconditional settle delay is taken and `previous` is returned
/// unchanged. If present, its displayed value is polled until it differs from
/// `previous` or the inner window lapses; the best value read so far wins.
///
/// A non-change is not proof nothing happened — every caller must follow with
/// its own bounded wait for the next expected control.
pub async fn wait_for_activity(
    page: &dyn PagePort,
    previous: Option<u64>,
    timeouts: &FlowTimeouts,
) -> Option<u64> {
    let queries = activity_queries();
    let lookup_deadline = Instant::now() + timeouts.lookup();
    let counter = loop {
        let mut found = None;
        for query in &queries {
            if let Ok(mut matches) = page.query(query).await {
                if !matches.is_empty() {
                    found = Some(matches.remove(0));
                    break;
                }
            }
        }
        if let Some(el) = found {
            break Some(el);
        }
        if Instant::now() >= lookup_deadline {
            break None;
        }
        sleep(timeouts.poll()).await;
    };

    let Some(counter) = counter else {
        debug!("no activity counter on this page; settling unconditionally");
        sleep(timeouts.settle()).await;
        return previous;
    };

    let deadline = Instant::now() + timeouts.heartbeat();
    let mut best = previous;
    loop {
        match page.state(&counter).await {
            Ok(state) if state.visible => {
                if let Ok(value) = state.text.trim().parse::<u64>() {
                    best = Some(value);
                    if previous != Some(value) {
                        trace!(value, ?previous, "activity counter moved");
                        return best;
                    }
                }
            }
            Ok(_) => {}
            // The counter re-rendered away mid-poll; advisory only.
            Err(_) => return best,
        }
        if Instant::now() >= deadline {
            debug!(?previous, "activity counter did not move within window");
            return best;
        }
        sleep(timeouts.poll()).await;
    }
}

/// Wait for the first visible match of `query`, bounded by `timeout`.
pub async fn wait_present(
    page: &dyn PagePort,
    query: &ElementQuery,
    timeout: Duration,
    poll: Duration,
) -> Option<ElementRef> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(el) = first_visible(page, query).await {
            return Some(el);
        }
        if Instant::now() >= deadline {
            return None;
        }
        sleep(poll).await;
    }
}

/// Wait for a visible *and enabled* match of `query`.
pub async fn wait_actionable(
    page: &dyn PagePort,
    query: &ElementQuery,
    timeout: Duration,
    poll: Duration,
) -> Option<ElementRef> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Ok(matches) = page.query(query).await {
            for el in matches {
                if let Ok(state) = page.state(&el).await {
                    if state.visible && state.enabled {
                        return Some(el);
                    }
                }
            }
        }
        if Instant::now() >= deadline {
            return None;
        }
        sleep(poll).await;
    }
}

/// Race several waits: the first query with a visible match wins.
///
/// Within one poll round the queries are checked in order, so earlier entries
/// take priority when several signals are already on screen.
pub async fn wait_any(
    page: &dyn PagePort,
    queries: &[ElementQuery],
    timeout: Duration,
    poll: Duration,
) -> Option<(usize, ElementRef)> {
    let deadline = Instant::now() + timeout;
    loop {
        for (index, query) in queries.iter().enumerate() {
            if let Some(el) = first_visible(page, query).await {
                return Some((index, el));
            }
        }
        if Instant::now() >= deadline {
            return None;
        }
        sleep(poll).await;
    }
}

/// Wait until `query` has no visible match (spinners, overlays).
pub async fn wait_gone(
    page: &dyn PagePort,
    query: &ElementQuery,
    timeout: Duration,
    poll: Duration,
) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if first_visible(page, query).await.is_none() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(poll).await;
    }
}

async fn first_visible(page: &dyn PagePort, query: &ElementQuery) -> Option<ElementRef> {
    let matches = page.query(query).await.ok()?;
    for el in matches {
        if let Ok(state) = page.state(&el).await {
            if state.visible {
                return Some(el);
            }
        }
    }
    None
}
