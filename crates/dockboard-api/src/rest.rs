// REST client for the host's `/api` surface
//
// Wraps `reqwest::Client` with bearer auth, URL construction and status
// mapping. Used for one-shot state reads and service calls when no
// WebSocket session is open.

use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{ApiStatus, RawState};
use crate::transport::{TransportConfig, bearer_headers};

/// The host answers errors as `{"message": "..."}`.
#[derive(serde::Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Raw HTTP client for the host REST API.
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    /// Create a client that sends `token` as a bearer header on every request.
    ///
    /// `base_url` is the host root, e.g. `http://homeassistant.local:8123`.
    pub fn new(base_url: Url, token: &SecretString, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client_with_headers(bearer_headers(token)?)?;
        Ok(Self { http, base_url })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The host base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /api/` -- liveness and token check.
    pub async fn api_status(&self) -> Result<ApiStatus, Error> {
        self.get(&self.api_url("")?).await
    }

    /// `GET /api/states`
    pub async fn states(&self) -> Result<Vec<RawState>, Error> {
        self.get(&self.api_url("states")?).await
    }

    /// `GET /api/states/<entity_id>`; an unknown entity is `None`.
    pub async fn state(&self, entity_id: &str) -> Result<Option<RawState>, Error> {
        match self.get(&self.api_url(&format!("states/{entity_id}"))?).await {
            Ok(state) => Ok(Some(state)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// `POST /api/services/<domain>/<service>`
    ///
    /// Returns the host's response body (the states changed by the call).
    pub async fn call_service(&self, domain: &str, service: &str, payload: &Value) -> Result<Value, Error> {
        let url = self.api_url(&format!("services/{domain}/{service}"))?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(Error::Transport)?;
        parse_response(resp).await
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    async fn get<T: DeserializeOwned>(&self, url: &Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url.clone()).send().await.map_err(Error::Transport)?;
        parse_response(resp).await
    }
}

async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::Authentication {
            message: "access token rejected".into(),
        });
    }

    let body = resp.text().await.map_err(Error::Transport)?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| body.chars().take(200).collect());
        return Err(Error::Host {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body,
        }
    })
}
