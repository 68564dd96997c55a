// ── Runtime connection configuration ──
//
// Describes how to reach a host and how to synthesize its dashboard.
// Carries credential data but never touches disk; the CLI builds a
// `HostConfig` from its profile and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::strategy::{MissingModelPolicy, StrategyOptions};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict). Default for hosts.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for one host connection.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Host URL (e.g., `http://homeassistant.local:8123`).
    pub url: Url,
    /// Long-lived access token.
    pub token: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout applied by the transport.
    pub timeout: Duration,
    /// Subscribe to `state_changed` after connecting.
    pub live_states: bool,
    pub strategy: StrategyOptions,
}

impl HostConfig {
    pub fn new(url: Url, token: SecretString) -> Self {
        Self {
            url,
            token,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            live_states: true,
            strategy: StrategyOptions::default(),
        }
    }

    pub fn with_missing_models(mut self, policy: MissingModelPolicy) -> Self {
        self.strategy.missing_models = policy;
        self
    }

    pub(crate) fn transport(&self) -> dockboard_api::TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => dockboard_api::TlsMode::System,
            TlsVerification::CustomCa(path) => dockboard_api::TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => dockboard_api::TlsMode::DangerAcceptInvalid,
        };
        dockboard_api::TransportConfig::new(tls, self.timeout)
    }
}
