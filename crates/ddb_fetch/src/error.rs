use thiserror::Error;

pub const PUBLIC_CHARACTER_HINT: &str = "the character must be public \
     (Manage > Character Settings > Privacy: Public)";

/// Longest response body excerpt kept on an HTTP error.
pub const BODY_EXCERPT_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("expected a numeric character id or a dndbeyond.com/characters/<id> link")]
    MissingIdentifier,
    #[error("character service returned {status} {reason}; {hint}", hint = PUBLIC_CHARACTER_HINT)]
    Http {
        status: u16,
        reason: String,
        body_excerpt: String,
    },
    #[error("character service rejected the request: {0}")]
    Rejected(String),
    #[error("request to character service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("character service response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

pub(crate) fn body_excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}
