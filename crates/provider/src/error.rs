/// Errors from the provider HTTP layer.
///
/// Each dispatch-time failure maps to a distinct variant so callers can
/// act differently: back off on [`RateLimited`](Self::RateLimited) and
/// [`Maintenance`](Self::Maintenance), fix configuration on
/// [`Auth`](Self::Auth), and never retry
/// [`MalformedResponse`](Self::MalformedResponse) blindly.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider throttled the request or the account is out of quota.
    #[error("Provider rate limit exceeded: {message}")]
    RateLimited { message: String },

    /// The provider rejected our credentials.
    #[error("Provider authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    /// The provider is down for maintenance.
    #[error("Provider is under maintenance: {message}")]
    Maintenance { message: String },

    /// A success status with a body we cannot use (not JSON, no task id).
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// The provider failed with a 5xx.
    #[error("Provider server error ({status}): {body}")]
    ServerError { status: u16, body: String },

    /// The provider refused the request itself (other 4xx).
    #[error("Provider rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ProviderError {
    /// Whether the same request may succeed later without changes.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::Maintenance { .. }
                | Self::ServerError { .. }
                | Self::Transport(_)
        )
    }
}

/// Longest body excerpt carried in an error.
const BODY_EXCERPT_CHARS: usize = 512;

/// Map a non-success HTTP status to an error variant.
pub fn classify_status(status: u16, body: &str) -> ProviderError {
    let body = excerpt(body);
    match status {
        401 | 403 => ProviderError::Auth {
            status,
            message: body,
        },
        429 => ProviderError::RateLimited { message: body },
        503 => ProviderError::Maintenance { message: body },
        500..=599 => ProviderError::ServerError { status, body },
        _ => ProviderError::Rejected { status, body },
    }
}

/// Map an application-level `code` carried in a 2xx JSON body.
///
/// The provider reports some failures as HTTP 200 with a non-200 `code`
/// (430 for "too frequent", 455 for maintenance).
pub fn classify_code(code: i64, message: &str) -> ProviderError {
    let message = excerpt(message);
    match code {
        401 | 403 => ProviderError::Auth {
            status: code as u16,
            message,
        },
        429 | 430 => ProviderError::RateLimited { message },
        455 | 503 => ProviderError::Maintenance { message },
        500..=599 => ProviderError::ServerError {
            status: code as u16,
            body: message,
        },
        _ => ProviderError::Rejected {
            status: u16::try_from(code).unwrap_or(0),
            body: message,
        },
    }
}

fn excerpt(body: &str) -> String {
    match body.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
