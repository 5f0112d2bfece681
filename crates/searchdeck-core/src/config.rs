use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::ConnectionError;

pub const DEFAULT_STORE_PORT: u16 = 8080;
pub const DEFAULT_GRPC_PORT: u16 = 50051;

/// Embedding service whose credential rides along as a request header.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Google,
}

impl Provider {
    /// Lenient parse matching the connection form: gemini/google selects the
    /// Google header, everything else the OpenAI one.
    pub fn parse(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "gemini" | "google" => Self::Google,
            _ => Self::OpenAi,
        }
    }

    /// Header name the store expects for this provider's key.
    pub fn header_name(self) -> &'static str {
        match self {
            Self::OpenAi => "X-OpenAI-Api-Key",
            Self::Google => "X-Google-Studio-Api-Key",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderCredential {
    pub provider: Provider,
    pub api_key: String,
}

/// Everything needed to establish the session handle. Created once at
/// authentication time and lives for the session.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    /// Explicit transport-security override; `None` resolves by heuristic.
    pub secure: Option<bool>,
    pub api_key: String,
    /// Binary-channel host, defaulting to the primary host.
    pub grpc_host: Option<String>,
    /// Binary-channel port, defaulting to 50051.
    pub grpc_port: Option<u16>,
    pub provider: Option<ProviderCredential>,
}

/// Pre-configured deployment target, unlocked by the master password.
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentProfile {
    pub name: String,
    pub host: String,
    pub port: Option<u16>,
    pub api_key: String,
    pub secure: Option<bool>,
    pub grpc_host: Option<String>,
    pub grpc_port: Option<u16>,
}

/// Process-level configuration, read once at startup from `searchdeck.toml`
/// merged with `SEARCHDECK_*` environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    pub store_host: Option<String>,
    pub store_port: Option<u16>,
    pub store_api_key: Option<String>,
    pub secure: Option<bool>,
    pub grpc_host: Option<String>,
    pub grpc_port: Option<u16>,
    pub provider: Option<String>,
    pub provider_api_key: Option<String>,
    pub master_password: Option<String>,
    pub deployment: Option<DeploymentProfile>,
}

impl Settings {
    pub fn load() -> anyhow::Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("searchdeck.toml"))
            .merge(Env::prefixed("SEARCHDECK_"));
        let settings = figment
            .extract()
            .map_err(|e| anyhow::anyhow!("failed to load settings: {}", e))?;
        Ok(settings)
    }

    /// Connection parameters for the manual path. Missing host or API key is
    /// a configuration error caught before any network attempt.
    pub fn connection_config(&self) -> Result<ConnectionConfig, ConnectionError> {
        let host = self.store_host.clone().unwrap_or_default();
        if host.trim().is_empty() {
            return Err(ConnectionError::Misconfigured("store host is not set".into()));
        }
        let api_key = self.store_api_key.clone().unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(ConnectionError::Misconfigured("store API key is not set".into()));
        }
        Ok(ConnectionConfig {
            host,
            port: self.store_port.unwrap_or(DEFAULT_STORE_PORT),
            secure: self.secure,
            api_key,
            grpc_host: self.grpc_host.clone(),
            grpc_port: self.grpc_port,
            provider: self.provider_credential(),
        })
    }

    /// Connection parameters from the pre-configured deployment profile.
    /// Returns `None` unless a profile exists, a master password is set, and
    /// the supplied password matches it.
    pub fn deployment_config(&self, password: &str) -> Option<ConnectionConfig> {
        let profile = self.deployment.as_ref()?;
        let gate = self.master_password.as_deref()?;
        if gate.is_empty() || gate != password {
            return None;
        }
        Some(ConnectionConfig {
            host: profile.host.clone(),
            port: profile.port.unwrap_or(DEFAULT_STORE_PORT),
            secure: profile.secure,
            api_key: profile.api_key.clone(),
            grpc_host: profile.grpc_host.clone(),
            grpc_port: profile.grpc_port,
            provider: self.provider_credential(),
        })
    }

    fn provider_credential(&self) -> Option<ProviderCredential> {
        let api_key = self.provider_api_key.as_deref()?.trim();
        if api_key.is_empty() {
            return None;
        }
        let provider = Provider::parse(self.provider.as_deref().unwrap_or("openai"));
        Some(ProviderCredential {
            provider,
            api_key: api_key.to_string(),
        })
    }
}
