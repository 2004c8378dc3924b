use serde::Deserialize;
use thiserror::Error;

use crate::response::Response;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("invalid app credentials: {0}")]
    Credentials(#[from] jsonwebtoken::errors::Error),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{} {}: {message}", .response.status, .response.url)]
    Api {
        response: Box<Response>,
        message: String,
        errors: Vec<FieldError>,
        documentation_url: Option<String>,
    },

    #[error("failed to decode response from {}: {source}", .response.url)]
    Decode {
        response: Box<Response>,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Response metadata, when the request got far enough to receive one.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Error::Api { response, .. } | Error::Decode { response, .. } => Some(response.as_ref()),
            _ => None,
        }
    }
}

/// Error body returned by GitHub on non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<FieldError>,
    pub documentation_url: Option<String>,
}

/// One validation failure reported in an error body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldError {
    pub resource: Option<String>,
    pub field: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
}
