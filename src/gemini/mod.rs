//! Driving the target chat application: cookies, modes, prompts, extraction

pub mod cookies;
pub mod extract;
pub mod mode;
pub mod prompt;

pub use cookies::{CookieRecord, CookieStore, InjectOutcome, parse_cookie_table};
pub use mode::{Card, Mode, select_card, switch_mode};
pub use prompt::{PromptError, PromptReply, run_prompt};
