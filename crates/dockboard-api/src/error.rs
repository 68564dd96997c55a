use thiserror::Error;

/// Top-level error type for the `dockboard-api` crate.
///
/// Covers every failure mode across both host surfaces: authentication,
/// HTTP transport, the REST API, and the WebSocket command channel.
/// `dockboard-core` maps these into its own domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The host rejected the access token.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The configured token cannot be sent as an HTTP header.
    #[error("Invalid access token")]
    InvalidToken,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Host API ────────────────────────────────────────────────────
    /// Non-success HTTP status from the REST API.
    #[error("Host API error (HTTP {status}): {message}")]
    Host { status: u16, message: String },

    /// A WebSocket command came back with `success: false`.
    #[error("Command failed ({code}): {message}")]
    Command { code: String, message: String },

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket closed by the host.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    /// The connection dropped while a request was outstanding.
    #[error("Connection closed before a reply arrived")]
    ConnectionClosed,

    /// The host sent a frame that does not fit the handshake.
    #[error("Unexpected frame from host: {0}")]
    UnexpectedFrame(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the host refused our credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::InvalidToken)
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::WebSocketConnect(_) | Self::ConnectionClosed => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Host { status: 404, .. } => true,
            Self::Command { code, .. } => code == "not_found",
            _ => false,
        }
    }

    /// Extract the host's error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Command { code, .. } => Some(code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_not_found_is_not_found() {
        let err = Error::Command {
            code: "not_found".into(),
            message: "Service not found.".into(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.api_error_code(), Some("not_found"));
    }

    #[test]
    fn timeout_is_transient() {
        assert!(Error::Timeout { timeout_secs: 5 }.is_transient());
        assert!(!Error::InvalidToken.is_transient());
        assert!(Error::InvalidToken.is_auth_failure());
    }
}
