//! Browser infrastructure for launching and owning Chrome instances

mod wrapper;

pub use wrapper::BrowserWrapper;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Element interaction failed: {0}")]
    InteractionFailed(String),
}

pub type BrowserResult<T> = Result<T, BrowserError>;

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        BrowserError::InteractionFailed(err.to_string())
    }
}
