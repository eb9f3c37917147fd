//! Shared configuration constants for session automation
//!
//! Default values and timing constants used throughout the codebase to
//! ensure consistency and avoid magic numbers.

use std::time::Duration;

/// Chrome user agent string presented to the target application
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
///
/// Chrome releases new stable versions ~every 4 weeks; refresh quarterly
/// to stay within a plausible version window.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// How long locate operations wait for an element to become interactable
pub const LOCATE_TIMEOUT: Duration = Duration::from_secs(20);

/// Settle pause after scrolling a card into view, before clicking it
pub const SCROLL_SETTLE: Duration = Duration::from_millis(500);

/// Attempts to find at least one code container before giving up
pub const CODE_BLOCK_RETRIES: usize = 5;

/// Pause between code-container retries
pub const CODE_BLOCK_RETRY_PAUSE: Duration = Duration::from_secs(1);
