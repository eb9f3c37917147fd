//! Response-generation mode and task-card selection
//!
//! Both operations are best-effort refinements of a session: they report
//! success as a bool and never propagate a failure past this boundary,
//! since a session without the requested mode or card is still usable.

use chromiumoxide::Page;
use tracing::debug;

use crate::Locators;
use crate::browser::BrowserResult;
use crate::events::{Event, EventLog};
use crate::utils::constants::{LOCATE_TIMEOUT, SCROLL_SETTLE};
use crate::utils::{wait_for_element, wait_for_visible};

/// Response-generation mode of the target application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Fast,
    /// Extended reasoning ("Thinking with 3 pro")
    ThinkingPro,
}

impl Mode {
    /// Normalize a caller-supplied mode string.
    ///
    /// Only the exact synonyms "Thinking" and "3" select the pro mode;
    /// everything else, including an absent value, falls back to Fast.
    pub fn normalize(input: Option<&str>) -> Self {
        match input.map(str::trim) {
            Some("Thinking") | Some("3") => Mode::ThinkingPro,
            _ => Mode::Fast,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Fast => "Fast",
            Mode::ThinkingPro => "Thinking with 3 pro",
        }
    }
}

/// Task-category card on the target application's home screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Card {
    CreateImage,
    Write,
    Build,
    DeepResearch,
    CreateVideo,
    Learn,
}

impl Card {
    /// Normalize a caller-supplied card name against the fixed six-item
    /// catalog; anything else means no card is selected.
    pub fn normalize(input: Option<&str>) -> Option<Self> {
        match input? {
            "Create image" => Some(Card::CreateImage),
            "Write" => Some(Card::Write),
            "Build" => Some(Card::Build),
            "Deep Research" => Some(Card::DeepResearch),
            "Create Video" => Some(Card::CreateVideo),
            "Learn" => Some(Card::Learn),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Card::CreateImage => "Create image",
            Card::Write => "Write",
            Card::Build => "Build",
            Card::DeepResearch => "Deep Research",
            Card::CreateVideo => "Create Video",
            Card::Learn => "Learn",
        }
    }

    /// aria-label fragment the card button carries in the rendered UI
    fn aria_label(&self) -> &'static str {
        match self {
            Card::CreateImage => "Create Image",
            Card::Write => "Write",
            Card::Build => "Build",
            Card::DeepResearch => "Deep Research",
            Card::CreateVideo => "Create Video",
            Card::Learn => "Learn",
        }
    }

    /// Locator from the fixed card catalog
    pub fn locator(&self) -> String {
        format!(
            "//button[contains(@class, 'card-legacy') and contains(@aria-label, '{}')]",
            self.aria_label()
        )
    }
}

/// Drive the two-step mode switch: open the switcher, pick the option.
///
/// Returns whether the switch succeeded; the attempted mode is recorded
/// either way.
pub async fn switch_mode(page: &Page, locators: &Locators, mode: Mode, events: &EventLog) -> bool {
    match try_switch_mode(page, locators, mode).await {
        Ok(()) => {
            events
                .append(Event::new("switch_mode", "success").field("mode", mode.as_str()))
                .await;
            true
        }
        Err(e) => {
            events
                .append(
                    Event::new("switch_mode", "error")
                        .field("mode", mode.as_str())
                        .field("error", e.to_string()),
                )
                .await;
            false
        }
    }
}

async fn try_switch_mode(page: &Page, locators: &Locators, mode: Mode) -> BrowserResult<()> {
    let switch = wait_for_element(page, &locators.mode_switch, LOCATE_TIMEOUT).await?;
    switch.click().await?;

    let option_locator = match mode {
        Mode::Fast => &locators.mode_fast,
        Mode::ThinkingPro => &locators.mode_thinking,
    };

    let option = wait_for_visible(page, option_locator, LOCATE_TIMEOUT).await?;
    option.click().await?;
    Ok(())
}

/// Activate a task card: wait for it, scroll it into view, let layout
/// settle, click. Returns whether the card was selected.
pub async fn select_card(page: &Page, card: Card, events: &EventLog) -> bool {
    match try_select_card(page, card).await {
        Ok(()) => {
            events
                .append(Event::new("select_card", "success").field("card", card.as_str()))
                .await;
            true
        }
        Err(e) => {
            events
                .append(
                    Event::new("select_card", "error")
                        .field("card", card.as_str())
                        .field("error", e.to_string()),
                )
                .await;
            false
        }
    }
}

async fn try_select_card(page: &Page, card: Card) -> BrowserResult<()> {
    let element = wait_for_visible(page, &card.locator(), LOCATE_TIMEOUT).await?;

    element.scroll_into_view().await?;
    debug!("Card '{}' scrolled into view", card.as_str());
    tokio::time::sleep(SCROLL_SETTLE).await;

    element.click().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thinking_synonyms_normalize_to_pro() {
        assert_eq!(Mode::normalize(Some("Thinking")), Mode::ThinkingPro);
        assert_eq!(Mode::normalize(Some("3")), Mode::ThinkingPro);
        assert_eq!(Mode::normalize(Some(" Thinking ")), Mode::ThinkingPro);
    }

    #[test]
    fn everything_else_normalizes_to_fast() {
        assert_eq!(Mode::normalize(None), Mode::Fast);
        assert_eq!(Mode::normalize(Some("")), Mode::Fast);
        assert_eq!(Mode::normalize(Some("Fast")), Mode::Fast);
        assert_eq!(Mode::normalize(Some("thinking")), Mode::Fast);
        assert_eq!(Mode::normalize(Some("pro")), Mode::Fast);
    }

    #[test]
    fn known_cards_pass_through() {
        assert_eq!(Card::normalize(Some("Create image")), Some(Card::CreateImage));
        assert_eq!(Card::normalize(Some("Write")), Some(Card::Write));
        assert_eq!(Card::normalize(Some("Build")), Some(Card::Build));
        assert_eq!(Card::normalize(Some("Deep Research")), Some(Card::DeepResearch));
        assert_eq!(Card::normalize(Some("Create Video")), Some(Card::CreateVideo));
        assert_eq!(Card::normalize(Some("Learn")), Some(Card::Learn));
    }

    #[test]
    fn unknown_cards_normalize_to_absent() {
        assert_eq!(Card::normalize(None), None);
        assert_eq!(Card::normalize(Some("")), None);
        assert_eq!(Card::normalize(Some("create image")), None);
        assert_eq!(Card::normalize(Some("Research")), None);
    }

    #[test]
    fn card_locator_targets_its_aria_label() {
        assert!(Card::DeepResearch.locator().contains("'Deep Research'"));
        assert!(Card::CreateImage.locator().contains("'Create Image'"));
        assert!(Card::Learn.locator().contains("card-legacy"));
    }
}
