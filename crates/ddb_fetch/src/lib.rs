//! The fetch collaborator: turns a character id or profile link into the
//! source character document.

mod client;
mod error;
mod id;

pub use client::{
    CharacterFetcher, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT, ENDPOINT_ENV, FetchConfig,
    unwrap_response,
};
pub use error::{BODY_EXCERPT_CHARS, FetchError, PUBLIC_CHARACTER_HINT};
pub use id::extract_character_id;
