use std::fmt;

use thiserror::Error;

/// Which upstream call a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Geocoding,
    Forecast,
}

impl Upstream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Upstream::Geocoding => "geocoding",
            Upstream::Forecast => "forecast",
        }
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures of a single weather lookup. `Display` is the message sent on the wire.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("city '{0}' not found")]
    CityNotFound(String),

    #[error("{service} API error: {status}: {body}")]
    UpstreamStatus {
        service: Upstream,
        status: u16,
        body: String,
    },

    #[error("{service} request failed: {cause}")]
    Upstream { service: Upstream, cause: String },

    #[error("malformed {service} response: {cause}")]
    MalformedResponse { service: Upstream, cause: String },
}

/// Everything the router can answer with instead of a result.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}
