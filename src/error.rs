//! Failure of a single review page fetch

/// Why a page could not be fetched. Any variant ends pagination.
#[derive(Debug)]
pub enum FetchError {
    /// Server answered with a non-2xx status.
    Status(u16),
    /// Connection, TLS or timeout failure before a status was read.
    Transport(reqwest::Error),
    /// Body was not a review page.
    Decode(serde_json::Error),
    /// Body decoded but `success` was not 1.
    Unsuccessful(i64),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status(code) => write!(f, "Failed to fetch reviews. Status code: {code}"),
            Self::Transport(e) => write!(f, "Failed to fetch reviews: {e}"),
            Self::Decode(e) => write!(f, "Invalid review page JSON: {e}"),
            Self::Unsuccessful(flag) => write!(f, "API reported success={flag}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Decode(e) => Some(e),
            Self::Status(_) | Self::Unsuccessful(_) => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::Status(status.as_u16()),
            None => Self::Transport(e),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e)
    }
}
