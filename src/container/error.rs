use thiserror::Error;

use crate::model::window_node::{WindowId, WindowType};
use crate::sys::display::DisplayId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WmError {
    #[error("window not found: {0}")]
    WindowNotFound(WindowId),
    #[error("display not found: {0}")]
    DisplayNotFound(DisplayId),
    #[error("invalid parameter: {0}")]
    InvalidParam(String),
    #[error("no root partition accepts window type {0}")]
    InvalidType(WindowType),
    #[error("parent {0} is not in the window tree")]
    InvalidParent(WindowId),
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// The request matched the current state; nothing was changed or sent.
    #[error("nothing to do")]
    DoNothing,
}

pub type WmResult<T> = Result<T, WmError>;
