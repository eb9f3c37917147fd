//! Prompt pipeline: keystroke encoding, submission, completion wait,
//! extraction
//!
//! The input surface is a single-line-oriented rich textarea, so a
//! multi-line prompt is encoded as explicit keystrokes: text per line,
//! shift+Enter between lines, plain Enter to submit. Completion is
//! detected by polling for the copy-response control becoming visible,
//! with liveness supervision and an optional overall deadline.

use std::time::{Duration, Instant};

use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::browser::{BrowserError, BrowserResult};
use crate::events::{Event, EventLog};
use crate::gemini::extract::{extract_code_blocks, extract_text};
use crate::session::SessionHandle;
use crate::utils::constants::LOCATE_TIMEOUT;
use crate::utils::{is_visible, wait_for_visible};
use crate::{Locators, PollConfig};

const SHIFT_MODIFIER: i64 = 8;

#[derive(Debug, Error)]
pub enum PromptError {
    /// Session is unknown or its agent failed the entry liveness probe
    #[error("session not active")]
    NotFound,

    /// Agent died while waiting for the response
    #[error("session terminated externally")]
    Gone,

    /// Overall prompt deadline elapsed before the completion marker appeared
    #[error("timed out waiting for response")]
    DeadlineExceeded,

    /// Caller cancelled the wait
    #[error("prompt cancelled")]
    Cancelled,

    #[error(transparent)]
    Agent(#[from] BrowserError),
}

/// Extracted response for one prompt
#[derive(Debug, Clone)]
pub struct PromptReply {
    pub full_response: Vec<String>,
    pub code_blocks: Vec<String>,
}

/// One step of the submission encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keystroke {
    /// Literal text for one line of the prompt
    Type(String),
    /// shift+Enter: line break without submitting
    SoftBreak,
    /// plain Enter: submit
    Submit,
}

/// Encode a prompt into the keystroke sequence the input surface expects.
///
/// A soft break goes between consecutive lines only; the single submit
/// keystroke comes after the final line.
pub fn keystroke_plan(prompt: &str) -> Vec<Keystroke> {
    let lines: Vec<&str> = prompt.split('\n').collect();
    let mut plan = Vec::with_capacity(lines.len() * 2);

    for (i, line) in lines.iter().enumerate() {
        plan.push(Keystroke::Type(line.to_string()));
        if i < lines.len() - 1 {
            plan.push(Keystroke::SoftBreak);
        }
    }

    plan.push(Keystroke::Submit);
    plan
}

/// Submit a prompt and wait for the extracted response.
///
/// The caller has already resolved the session; a failed entry liveness
/// probe is a `NotFound` outcome, a death mid-poll is `Gone`.
pub async fn run_prompt(
    handle: &SessionHandle,
    prompt: &str,
    locators: &Locators,
    poll: &PollConfig,
    cancel: &CancellationToken,
    events: &EventLog,
) -> Result<PromptReply, PromptError> {
    if !handle.is_alive().await {
        return Err(PromptError::NotFound);
    }

    let page = handle.page();

    submit(page, locators, prompt).await?;
    tokio::time::sleep(Duration::from_millis(poll.submit_settle_ms)).await;

    events
        .append(Event::new("send_prompt", "sent").field("session_id", handle.id()))
        .await;

    wait_for_completion(handle, locators, poll, cancel).await?;

    let full_response = extract_text(page).await?;
    let code_blocks = extract_code_blocks(page).await;

    events
        .append(Event::new("send_prompt", "response_received").field("session_id", handle.id()))
        .await;

    Ok(PromptReply {
        full_response,
        code_blocks,
    })
}

/// Locate the input surface, focus it, clear it, run the keystroke plan
async fn submit(page: &Page, locators: &Locators, prompt: &str) -> BrowserResult<()> {
    let input = wait_for_visible(page, &locators.input_box, LOCATE_TIMEOUT).await?;
    input.click().await?;
    input
        .call_js_fn("function() { this.textContent = ''; }", false)
        .await?;

    for step in keystroke_plan(prompt) {
        match step {
            Keystroke::Type(line) => {
                if !line.is_empty() {
                    input.type_str(&line).await?;
                }
            }
            Keystroke::SoftBreak => press_enter(page, true).await?,
            Keystroke::Submit => press_enter(page, false).await?,
        }
    }

    Ok(())
}

/// Dispatch a raw Enter keystroke, optionally with the shift modifier held.
///
/// `Element::type_str` cannot express modifiers, so this goes through the
/// low-level CDP input API with paired down/up events.
async fn press_enter(page: &Page, shift: bool) -> BrowserResult<()> {
    let modifiers = if shift { SHIFT_MODIFIER } else { 0 };

    let down = DispatchKeyEventParams::builder()
        .r#type(DispatchKeyEventType::KeyDown)
        .modifiers(modifiers)
        .key("Enter")
        .code("Enter")
        .text("\r")
        .unmodified_text("\r")
        .windows_virtual_key_code(13)
        .build()
        .map_err(BrowserError::InteractionFailed)?;
    page.execute(down).await?;

    let up = DispatchKeyEventParams::builder()
        .r#type(DispatchKeyEventType::KeyUp)
        .modifiers(modifiers)
        .key("Enter")
        .code("Enter")
        .windows_virtual_key_code(13)
        .build()
        .map_err(BrowserError::InteractionFailed)?;
    page.execute(up).await?;

    Ok(())
}

/// Poll until the completion marker is visible.
///
/// Each turn re-checks cancellation, the optional deadline and agent
/// liveness before looking for the marker, so a dead agent aborts the
/// wait instead of looping forever.
async fn wait_for_completion(
    handle: &SessionHandle,
    locators: &Locators,
    poll: &PollConfig,
    cancel: &CancellationToken,
) -> Result<(), PromptError> {
    let interval = Duration::from_secs(poll.interval_secs);
    let deadline = poll
        .timeout_secs
        .map(|secs| Instant::now() + Duration::from_secs(secs));

    loop {
        if cancel.is_cancelled() {
            return Err(PromptError::Cancelled);
        }
        if let Some(deadline) = deadline
            && Instant::now() >= deadline
        {
            return Err(PromptError::DeadlineExceeded);
        }
        if !handle.is_alive().await {
            return Err(PromptError::Gone);
        }

        if let Ok(marker) = handle.page().find_xpath(&locators.completion_marker).await
            && is_visible(&marker).await
        {
            return Ok(());
        }

        tokio::select! {
            _ = cancel.cancelled() => return Err(PromptError::Cancelled),
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_break_between_lines_submit_after_last() {
        let plan = keystroke_plan("line1\nline2");
        assert_eq!(
            plan,
            vec![
                Keystroke::Type("line1".to_string()),
                Keystroke::SoftBreak,
                Keystroke::Type("line2".to_string()),
                Keystroke::Submit,
            ]
        );
    }

    #[test]
    fn single_line_has_no_soft_break() {
        let plan = keystroke_plan("hello");
        assert_eq!(
            plan,
            vec![Keystroke::Type("hello".to_string()), Keystroke::Submit]
        );
    }

    #[test]
    fn blank_lines_are_preserved_as_soft_breaks() {
        let plan = keystroke_plan("a\n\nb");
        assert_eq!(
            plan,
            vec![
                Keystroke::Type("a".to_string()),
                Keystroke::SoftBreak,
                Keystroke::Type(String::new()),
                Keystroke::SoftBreak,
                Keystroke::Type("b".to_string()),
                Keystroke::Submit,
            ]
        );
    }

    #[test]
    fn exactly_one_submit_at_the_end() {
        for prompt in ["x", "x\ny", "a\nb\nc\nd"] {
            let plan = keystroke_plan(prompt);
            let submits = plan.iter().filter(|k| **k == Keystroke::Submit).count();
            assert_eq!(submits, 1);
            assert_eq!(plan.last(), Some(&Keystroke::Submit));
        }
    }
}
