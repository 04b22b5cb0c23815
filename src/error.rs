use std::io;
use std::result::Result as StdResult;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("fetch error: {0}")]
    Fetch(#[from] crate::api::FetchError),
    #[error("Discord API error: {0}")]
    DiscordApi(#[from] twilight_http::Error),
    #[error("Discord response error: {0}")]
    DiscordBody(#[from] twilight_http::response::DeserializeBodyError),
    #[error("gateway error: {0}")]
    Gateway(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

pub type Result<T> = StdResult<T, Error>;
