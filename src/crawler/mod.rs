use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::util::text;

/// 伊朗自由市場匯率、金幣、黃金與比特幣報價
pub mod bonbast;

/// How much of a response body is kept inside an error.
const BODY_SNIPPET_CHARS: usize = 256;

#[derive(Error, Debug)]
pub enum CrawlerError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected http status {code}")]
    HttpStatus { code: u16 },
    #[error("the remote host has blocked this address (http 403)")]
    Blocked,
    #[error("homepage structure unrecognized, token not found")]
    TokenExtraction,
    #[error("the remote service rejected the token")]
    InvalidToken,
    #[error("couldn't decode JSON response: {}", text::truncate(.body, BODY_SNIPPET_CHARS))]
    MalformedResponse { body: String },
    #[error("field '{field_key}' is missing from the price response")]
    MissingField { field_key: String },
    #[error("field '{field_key}' has a non-numeric value {value}")]
    InvalidFieldValue { field_key: String, value: String },
    #[error("'{value}' is not a valid {name} header value")]
    InvalidHeader { name: &'static str, value: String },
    #[error("gave up after {0:?}")]
    Timeout(Duration),
}

impl CrawlerError {
    /// The HTTP status behind the error, when there is one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CrawlerError::HttpStatus { code } => Some(*code),
            CrawlerError::Blocked => Some(StatusCode::FORBIDDEN.as_u16()),
            CrawlerError::Transport(why) => why.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Maps a response status onto the error taxonomy; any 2xx passes.
pub fn check_status(status: StatusCode) -> Result<(), CrawlerError> {
    if status.is_success() {
        return Ok(());
    }

    match status {
        StatusCode::FORBIDDEN => Err(CrawlerError::Blocked),
        _ => Err(CrawlerError::HttpStatus {
            code: status.as_u16(),
        }),
    }
}
