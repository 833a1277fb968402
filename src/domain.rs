use std::io::{Error, ErrorKind};
use std::time::Duration;

use derive_setters::Setters;
use ratatui::crossterm::event::KeyEvent;
use thiserror::Error;

pub const DEFAULT_URL: &str = "https://jsonplaceholder.typicode.com/posts";

/// Page sizes offered by the selector, in display order.
pub const PAGE_SIZES: [usize; 4] = [10, 30, 50, 100];
pub const DEFAULT_PAGE_SIZE: usize = 30;

pub const HELP_TEXT: &str = "\
p / PageUp / Left     previous page
n / PageDown / Right  next page
Home / End            first / last page
g / :                 jump to page
+ / -                 next / previous page size
Tab / Shift-Tab       focus next / previous column
s                     toggle sort of focused column
j / k / Up / Down     move row selection
Enter                 activate focused action column
u / d                 update / delete selected row
y / c                 copy row / cell to clipboard
r                     reload posts
?                     show this help
Esc                   close popup / cancel input
q                     quit";

#[derive(Debug, Error)]
pub enum TVError {
    #[error("io error: {0}")]
    IoError(Error),
    #[error("request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("server responded with status {0}")]
    HttpStatus(u16),
    #[error("malformed posts payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
    #[error("invalid page size {0}, must be positive")]
    InvalidPageSize(usize),
    #[error("loading failed: {0}")]
    LoadingFailed(String),
    #[error("file not found")]
    FileNotFound,
    #[error("permission denied")]
    PermissionDenied,
}

impl From<Error> for TVError {
    fn from(err: Error) -> Self {
        match err.kind() {
            ErrorKind::NotFound => TVError::FileNotFound,
            ErrorKind::PermissionDenied => TVError::PermissionDenied,
            _ => TVError::IoError(err),
        }
    }
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct TVConfig {
    pub url: String,
    pub page_size: usize,
    pub request_timeout: Duration,
    pub event_poll_time: u64,
    pub max_column_width: usize,
}

impl Default for TVConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: Duration::from_secs(10),
            event_poll_time: 100,
            max_column_width: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CMDMode {
    PageJump,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    PreviousPage,
    NextPage,
    FirstPage,
    LastPage,
    EnterPageJump,
    NextPageSize,
    PreviousPageSize,
    NextColumn,
    PreviousColumn,
    ToggleSort,
    MoveUp,
    MoveDown,
    Activate,
    Update,
    Delete,
    CopyRow,
    CopyCell,
    Reload,
    Help,
    Exit,
    RawKey(KeyEvent),
}
