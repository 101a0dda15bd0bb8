use std::fmt;

use reqwest::StatusCode;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// Persisted session state could not be read or written.
    Storage(String),
    /// Token payload could not be decoded into an expiry claim.
    Decode(String),
    Http(reqwest::Error),
    /// Remote endpoint answered with a non-success status.
    Api(StatusCode, String),
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "io error: {}", err),
            Error::Storage(msg) => write!(f, "storage error: {}", msg),
            Error::Decode(msg) => write!(f, "decode error: {}", msg),
            Error::Http(err) => write!(f, "http error: {}", err),
            Error::Api(status, body) => write!(f, "api error: status={} body='{}'", status, body),
            Error::Config(msg) => write!(f, "config error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
