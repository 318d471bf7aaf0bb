use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// No identity or the backend refused the bearer token.
    Unauthorized,
    /// Non-2xx response; the message comes from the response body when available.
    Status,
    Network,
    Timeout,
    Decode,
    /// Rejected client-side before any request was sent.
    Validation,
}

/// The single error shape that leaves the API gateway. Callers only look at
/// `kind` and the human-readable message; transport detail stays in the logs.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ApiErrorKind,
    status: Option<u16>,
    message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Unauthorized, Some(401), message)
    }

    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let kind = if status == 401 {
            ApiErrorKind::Unauthorized
        } else {
            ApiErrorKind::Status
        };
        Self::new(kind, Some(status), message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, None, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Timeout, None, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Decode, None, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Validation, None, message)
    }

    /// Builds the error for a non-2xx response. The body's `detail` field wins,
    /// then `message`, then a generic status-code text.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                ["detail", "message", "error"]
                    .iter()
                    .find_map(|field| value.get(field).and_then(detail_text))
            })
            .unwrap_or_else(|| format!("API Error: {status}"));
        Self::from_status(status, message)
    }

    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout("request timed out")
        } else if err.is_decode() {
            Self::decode(format!("invalid response body: {err}"))
        } else {
            Self::network(format!("request failed: {err}"))
        }
    }

    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }

    fn new(kind: ApiErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }
}

// FastAPI validation errors put a list of objects in `detail`.
fn detail_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        serde_json::Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()).map(str::to_string))
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("could not save sign-in: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AudioError {
    #[error("audio output not supported on this platform")]
    NotSupported,

    #[error("failed to start audio process: {0}")]
    SpawnFailed(String),

    #[error("playback failed: {0}")]
    PlaybackFailed(String),

    #[error("audio download failed: {0}")]
    Network(String),

    #[error("playback cancelled")]
    Cancelled,
}
