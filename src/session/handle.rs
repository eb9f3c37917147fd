//! One established automation session: id, owned browser, primary page

use chromiumoxide::Page;
use tokio::sync::Mutex;
use tracing::info;

use crate::browser::BrowserWrapper;

/// Handle to a live agent, exclusively owned by the session registry.
///
/// The browser lives behind a `tokio::sync::Mutex` because termination
/// needs exclusive access across `.await` points; `Page` is cheaply
/// cloneable and read through a shared reference.
pub struct SessionHandle {
    id: String,
    browser: Mutex<Option<BrowserWrapper>>,
    page: Page,
}

impl SessionHandle {
    pub(crate) fn new(id: String, wrapper: BrowserWrapper, page: Page) -> Self {
        Self {
            id,
            browser: Mutex::new(Some(wrapper)),
            page,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Cheap liveness probe: a CDP version query succeeds only while the
    /// browser process is reachable. A terminated handle is not alive.
    pub async fn is_alive(&self) -> bool {
        let guard = self.browser.lock().await;
        match guard.as_ref() {
            Some(wrapper) => wrapper.browser().version().await.is_ok(),
            None => false,
        }
    }

    /// Terminate the agent: close the browser, wait for the process to
    /// exit, then remove its profile directory. Idempotent; safe to call
    /// on an already-dead agent.
    ///
    /// Close must complete before wait, and wait before cleanup — Chrome
    /// holds profile file handles until the process fully exits.
    pub async fn terminate(&self) -> Result<(), String> {
        let mut guard = self.browser.lock().await;

        let Some(mut wrapper) = guard.take() else {
            return Ok(());
        };

        info!("Terminating session {}", self.id);

        let close_result = wrapper.browser_mut().close().await;
        let wait_result = wrapper.browser_mut().wait().await;
        wrapper.cleanup_temp_dir();
        drop(wrapper);

        match (close_result, wait_result) {
            (Ok(_), Ok(_)) => Ok(()),
            (Err(e), _) => Err(format!("browser close failed: {e}")),
            (_, Err(e)) => Err(format!("browser wait failed: {e}")),
        }
    }
}
