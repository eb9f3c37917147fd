//! Browser-driven control plane for the Gemini web app
//!
//! Establishes cookie-authenticated Chrome automation sessions via chromiumoxide,
//! submits prompts and extracts generated responses over a small HTTP surface.

pub mod api;
mod browser;
pub mod browser_setup;
pub mod events;
pub mod gemini;
pub mod session;
mod utils;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    /// Target web application the sessions drive
    #[serde(default = "default_target_url")]
    pub target_url: String,

    /// Persisted cookie feed, regenerated wholesale on each import
    #[serde(default = "default_cookie_file")]
    pub cookie_file: PathBuf,

    /// Append-only structured event stream (one JSON record per line)
    #[serde(default = "default_event_log")]
    pub event_log: PathBuf,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub locators: Locators,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Browser security and launch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Disable web security features (Same-Origin Policy, etc.)
    /// WARNING: Only enable for trusted content
    #[serde(default = "default_disable_security")]
    pub disable_security: bool,

    /// Window dimensions
    #[serde(default)]
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_width")]
    pub width: u32,

    #[serde(default = "default_window_height")]
    pub height: u32,
}

/// Completion-polling knobs for the prompt pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Seconds between completion-marker checks
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,

    /// Pause after submitting a prompt so the UI registers the send
    #[serde(default = "default_submit_settle_ms")]
    pub submit_settle_ms: u64,

    /// Overall deadline for one prompt; None bounds the wait by
    /// agent liveness only
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Versioned DOM locator catalog for the target application.
///
/// Fixed XPath expressions supplied as configuration; no attempt is made
/// to survive arbitrary UI changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Locators {
    /// Prompt input surface (single-line-oriented rich textarea)
    #[serde(default = "default_input_box")]
    pub input_box: String,

    /// Button that reveals the fast/thinking mode options
    #[serde(default = "default_mode_switch")]
    pub mode_switch: String,

    /// Fast mode option inside the switcher
    #[serde(default = "default_mode_fast")]
    pub mode_fast: String,

    /// Thinking/pro mode option inside the switcher
    #[serde(default = "default_mode_thinking")]
    pub mode_thinking: String,

    /// Copy-response control; its visibility marks generation complete
    #[serde(default = "default_completion_marker")]
    pub completion_marker: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8085
}

fn default_target_url() -> String {
    "https://gemini.google.com/app".to_string()
}

fn default_cookie_file() -> PathBuf {
    PathBuf::from("cookies.json")
}

fn default_event_log() -> PathBuf {
    PathBuf::from("responses_log.jsonl")
}

fn default_headless() -> bool {
    false
}

fn default_disable_security() -> bool {
    false // SECURE BY DEFAULT
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    1024
}

fn default_poll_interval() -> u64 {
    5
}

fn default_submit_settle_ms() -> u64 {
    1000
}

fn default_input_box() -> String {
    "/html/body/chat-app/main/side-navigation-v2/bard-sidenav-container/bard-sidenav-content\
     /div[2]/div/div[2]/chat-window/div/input-container/div/input-area-v2/div/div/div[1]\
     /div/div/rich-textarea/div[1]/p"
        .to_string()
}

fn default_mode_switch() -> String {
    "//button[contains(@class,'input-area-switch') and .//span[normalize-space()='Fast']]"
        .to_string()
}

fn default_mode_fast() -> String {
    "//button[@data-test-id='bard-mode-option-fast']".to_string()
}

fn default_mode_thinking() -> String {
    "//button[@data-test-id='bard-mode-option-thinkingwith3pro']".to_string()
}

fn default_completion_marker() -> String {
    "//button[@data-test-id='copy-button' and @mattooltip='Copy response']".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            browser: BrowserConfig::default(),
            target_url: default_target_url(),
            cookie_file: default_cookie_file(),
            event_log: default_event_log(),
            poll: PollConfig::default(),
            locators: Locators::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            disable_security: default_disable_security(),
            window: WindowConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval(),
            submit_settle_ms: default_submit_settle_ms(),
            timeout_secs: None,
        }
    }
}

impl Default for Locators {
    fn default() -> Self {
        Self {
            input_box: default_input_box(),
            mode_switch: default_mode_switch(),
            mode_fast: default_mode_fast(),
            mode_thinking: default_mode_thinking(),
            completion_marker: default_completion_marker(),
        }
    }
}

/// Load config from config.yaml in the working directory
pub fn load_yaml_config() -> anyhow::Result<Config> {
    let config_path = PathBuf::from("config.yaml");

    if config_path.exists() {
        let contents = fs::read_to_string(&config_path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    } else {
        Ok(Config::default())
    }
}

pub use browser::{BrowserError, BrowserResult, BrowserWrapper};
pub use events::{Event, EventLog};
pub use session::{SessionError, SessionRegistry, SessionStatus};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_without_file() {
        let config = Config::default();
        assert_eq!(config.server.port, 8085);
        assert_eq!(config.target_url, "https://gemini.google.com/app");
        assert_eq!(config.poll.interval_secs, 5);
        assert!(config.poll.timeout_secs.is_none());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str("server:\n  port: 9000\n").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.cookie_file, PathBuf::from("cookies.json"));
        assert!(config.locators.completion_marker.contains("copy-button"));
    }
}
