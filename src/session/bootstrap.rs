//! Session establishment: launch, navigate, authenticate, refine
//!
//! Linear state machine with rollback: create agent → navigate →
//! forbidden-page check → register → inject cookies → select mode →
//! select card. Only the forbidden page is fatal; cookie injection and
//! mode/card selection are best-effort refinements whose outcome is
//! reported, not escalated. Any failure before registration completes
//! terminates the partial agent and leaves no registry entry behind.

use std::sync::Arc;

use uuid::Uuid;

use crate::Config;
use crate::browser::BrowserWrapper;
use crate::browser_setup::launch_browser;
use crate::events::{Event, EventLog};
use crate::gemini::cookies::{self, CookieStore};
use crate::gemini::mode::{Card, Mode, select_card, switch_mode};
use crate::session::{SessionError, SessionHandle, SessionRegistry};

/// Result of a successful bootstrap, with the best-effort step outcomes
/// made visible to the caller
#[derive(Debug, Clone)]
pub struct Established {
    pub session_id: String,
    pub cookies_loaded: bool,
    pub mode_selected: bool,
    pub card_selected: bool,
}

/// Establish one authenticated automation session.
///
/// On failure the error carries the session id that was attempted so the
/// caller can correlate event-log records even though no session exists.
pub async fn establish(
    registry: &SessionRegistry,
    events: &EventLog,
    config: &Config,
    mode: Mode,
    card: Option<Card>,
) -> Result<Established, SessionError> {
    let session_id = Uuid::new_v4().simple().to_string();

    let profile_dir = std::env::temp_dir().join(format!("gemini_bridge_{session_id}"));
    let (browser, handler, profile_dir) = launch_browser(&config.browser, profile_dir)
        .await
        .map_err(|e| SessionError::Bootstrap {
            session_id: session_id.clone(),
            message: format!("browser launch failed: {e}"),
        })?;
    let mut wrapper = BrowserWrapper::new(browser, handler, profile_dir);

    events
        .append(Event::new("create_agent", "success").field("session_id", session_id.as_str()))
        .await;

    let page = match wrapper.browser().new_page(config.target_url.as_str()).await {
        Ok(page) => page,
        Err(e) => {
            teardown(wrapper).await;
            return Err(SessionError::Bootstrap {
                session_id,
                message: format!("navigation failed: {e}"),
            });
        }
    };
    let _ = page.wait_for_navigation().await;

    // The one fatal, non-recoverable condition: a blocked session is
    // useless and must not be registered.
    if is_forbidden_page(&page).await {
        events
            .append(
                Event::new("check_forbidden", "error")
                    .field("session_id", session_id.as_str())
                    .field("url", config.target_url.as_str()),
            )
            .await;
        teardown(wrapper).await;
        return Err(SessionError::Forbidden {
            session_id,
            url: config.target_url.clone(),
        });
    }
    events
        .append(
            Event::new("check_forbidden", "success")
                .field("session_id", session_id.as_str())
                .field("url", config.target_url.as_str()),
        )
        .await;

    let handle = Arc::new(SessionHandle::new(session_id.clone(), wrapper, page.clone()));
    registry.insert(handle.clone()).await;

    events
        .append(Event::new("open_website", "success").field("session_id", session_id.as_str()))
        .await;

    // Best-effort from here on: the session is usable without cookies,
    // mode or card.
    let cookies_loaded = load_and_inject_cookies(&page, config, events).await;
    let mode_selected = switch_mode(&page, &config.locators, mode, events).await;
    let card_selected = match card {
        Some(card) => select_card(&page, card, events).await,
        None => false,
    };

    events
        .append(
            Event::new("login_with_cookies", "success").field("session_id", session_id.as_str()),
        )
        .await;

    Ok(Established {
        session_id,
        cookies_loaded,
        mode_selected,
        card_selected,
    })
}

/// Inspect the rendered page for indicators of a blocking response
async fn is_forbidden_page(page: &chromiumoxide::Page) -> bool {
    match page.content().await {
        Ok(source) => {
            let source = source.to_lowercase();
            source.contains("error 403") || source.contains("forbidden")
        }
        // Unreadable page state is handled by later liveness checks, not
        // treated as a block.
        Err(_) => false,
    }
}

/// Load the persisted cookie feed and inject it; a missing or empty feed
/// and any injection failure all degrade to `false`
async fn load_and_inject_cookies(
    page: &chromiumoxide::Page,
    config: &Config,
    events: &EventLog,
) -> bool {
    let store = CookieStore::new(&config.cookie_file);

    let records = match store.load().await {
        Ok(records) if !records.is_empty() => records,
        Ok(_) => {
            events
                .append(
                    Event::new("load_cookies", "warning").field("message", "Cookie file not found"),
                )
                .await;
            return false;
        }
        Err(e) => {
            events
                .append(Event::new("load_cookies", "error").field("error", e.to_string()))
                .await;
            return false;
        }
    };

    cookies::inject(page, &records, events).await.is_ok()
}

/// Dispose of an agent that never made it into the registry
async fn teardown(mut wrapper: BrowserWrapper) {
    let _ = wrapper.browser_mut().close().await;
    let _ = wrapper.browser_mut().wait().await;
    wrapper.cleanup_temp_dir();
}
