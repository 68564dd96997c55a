// ── Core error types ──
//
// Domain errors from dockboard-core. Consumers never see raw HTTP
// statuses or WebSocket frames; the `From<dockboard_api::Error>` impl
// translates transport failures into these variants.

use thiserror::Error;

use crate::model::ResourceKind;
use crate::registry::RegistryRequest;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to host at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Host disconnected")]
    Disconnected,

    #[error("Host request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Dashboard synthesis ──────────────────────────────────────────
    /// One of the two registry reads failed; no partial dashboard is built.
    #[error("Registry query {request} failed: {source}")]
    RegistryFetch {
        request: RegistryRequest,
        #[source]
        source: Box<CoreError>,
    },

    /// Strict synthesis found no device carrying a required model tag.
    #[error("No \"{model}\" device found in the registry")]
    MissingResourceModel { model: ResourceKind },

    // ── Row configuration ────────────────────────────────────────────
    #[error("{card}: missing required field \"{field}\"")]
    Configuration { card: String, field: String },

    #[error("Invalid entity id \"{value}\": expected <domain>.<object_id>")]
    InvalidEntityId { value: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Actions ──────────────────────────────────────────────────────
    /// A dispatched service call was rejected. Never retried.
    #[error("Service call {domain}.{service} failed: {source}")]
    ServiceCall {
        domain: String,
        service: String,
        #[source]
        source: Box<CoreError>,
    },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// Host error code (e.g. `not_found`, `unknown_command`).
        code: Option<String>,
        /// HTTP status code (REST surface only).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Follow `RegistryFetch` / `ServiceCall` wrappers to the underlying cause.
    pub fn root(&self) -> &CoreError {
        match self {
            Self::RegistryFetch { source, .. } | Self::ServiceCall { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self.root() {
            Self::Api {
                status: Some(404), ..
            } => true,
            Self::Api { code: Some(code), .. } => code == "not_found",
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<dockboard_api::Error> for CoreError {
    fn from(err: dockboard_api::Error) -> Self {
        use dockboard_api::Error as ApiError;

        match err {
            ApiError::Authentication { message } => CoreError::AuthenticationFailed { message },
            ApiError::InvalidToken => CoreError::AuthenticationFailed {
                message: "access token contains characters that cannot be sent".into(),
            },
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e.url().map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::Host { status, message } => CoreError::Api {
                message,
                code: None,
                status: Some(status),
            },
            ApiError::Command { code, message } => CoreError::Api {
                message,
                code: Some(code),
                status: None,
            },
            ApiError::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            ApiError::WebSocketClosed { code, reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket closed (code {code}): {reason}"),
            },
            ApiError::ConnectionClosed => CoreError::Disconnected,
            ApiError::UnexpectedFrame(frame) => {
                CoreError::Internal(format!("unexpected frame from host: {frame}"))
            }
            ApiError::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_names_the_field() {
        let err = CoreError::Configuration {
            card: "docker-container-card".into(),
            field: "container_id".into(),
        };
        assert_eq!(
            err.to_string(),
            "docker-container-card: missing required field \"container_id\""
        );
    }

    #[test]
    fn root_unwraps_registry_fetch() {
        let err = CoreError::RegistryFetch {
            request: RegistryRequest::EntityList,
            source: Box::new(CoreError::Timeout { timeout_secs: 30 }),
        };
        assert!(matches!(err.root(), CoreError::Timeout { timeout_secs: 30 }));
    }

    #[test]
    fn command_not_found_maps_to_api() {
        let err = CoreError::from(dockboard_api::Error::Command {
            code: "not_found".into(),
            message: "Service not found.".into(),
        });
        assert!(err.is_not_found());
    }
}
