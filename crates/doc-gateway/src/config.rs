//! Document Gateway configuration.
//!
//! Configuration is loaded from environment variables once at startup and is
//! immutable afterwards. Auth-mode derivation (issuer and discovery URLs from
//! the tenant id) happens here, exactly once, so the verifiers never have to
//! re-derive anything per request. Sensitive fields are redacted in Debug
//! output.

use secrecy::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default header carrying the shared secret in API-key mode.
pub const DEFAULT_API_KEY_HEADER: &str = "x-api-key";

/// Base URL of the token issuer authority.
pub const AAD_AUTHORITY_BASE: &str = "https://login.microsoftonline.com";

/// Document Gateway configuration.
///
/// Loaded from environment variables with sensible defaults. The database URL
/// is redacted in Debug output to prevent credential leakage.
#[derive(Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Authentication mode and its settings.
    pub auth: AuthSettings,
}

/// Authentication settings, tagged by mode.
///
/// The mode is parsed from `AUTH_MODE` at load time; an unrecognized value is
/// rejected with [`ConfigError::UnsupportedAuthMode`]. After load the mode is
/// a typed enum, so "unsupported mode" cannot occur at request time.
#[derive(Debug, Clone)]
pub enum AuthSettings {
    /// Bearer tokens signed by a trusted third-party issuer.
    TokenIssuer(IssuerSettings),

    /// Static shared secret presented in a configurable header.
    SharedSecret(ApiKeySettings),
}

impl AuthSettings {
    /// Short mode label for logs and metrics.
    pub fn mode(&self) -> &'static str {
        match self {
            AuthSettings::TokenIssuer(_) => "bearer",
            AuthSettings::SharedSecret(_) => "api_key",
        }
    }
}

/// Settings for token-issuer (AAD) mode.
#[derive(Debug, Clone)]
pub struct IssuerSettings {
    /// Issuer tenant identifier.
    pub tenant_id: String,

    /// Expected `aud` claim value.
    pub audience: String,

    /// Expected `iss` claim value. Derived from the tenant when `AAD_ISSUER`
    /// is unset; non-empty by construction.
    pub issuer: String,

    /// OpenID Connect discovery document URL. Derived from the tenant when
    /// `AAD_OPENID_CONFIG` is unset; non-empty by construction.
    pub discovery_url: String,
}

/// Settings for shared-secret (API-key) mode.
///
/// The secret value is a [`SecretString`], so deriving Debug is safe: the
/// value renders as `[REDACTED]`.
#[derive(Debug, Clone)]
pub struct ApiKeySettings {
    /// Header name carrying the secret (stored lowercase).
    pub header: String,

    /// Expected secret value.
    pub value: SecretString,
}

/// Custom Debug implementation that redacts the database URL.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("auth", &self.auth)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unsupported AUTH_MODE: {0} (expected AAD or API_KEY)")]
    UnsupportedAuthMode(String),

    #[error("Invalid API key header name: {0}")]
    InvalidApiKeyHeader(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?
            .clone();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let auth = Self::auth_from_vars(vars)?;

        Ok(Config {
            database_url,
            bind_address,
            auth,
        })
    }

    fn auth_from_vars(vars: &HashMap<String, String>) -> Result<AuthSettings, ConfigError> {
        let mode = vars
            .get("AUTH_MODE")
            .map(|m| m.to_ascii_uppercase())
            .unwrap_or_else(|| "API_KEY".to_string());

        match mode.as_str() {
            "AAD" => {
                let tenant_id = vars
                    .get("AAD_TENANT_ID")
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| ConfigError::MissingEnvVar("AAD_TENANT_ID".to_string()))?
                    .clone();

                let audience = vars
                    .get("AAD_AUDIENCE")
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| ConfigError::MissingEnvVar("AAD_AUDIENCE".to_string()))?
                    .clone();

                // Empty overrides are treated as unset, matching the optional
                // AAD_ISSUER contract.
                let issuer = vars
                    .get("AAD_ISSUER")
                    .filter(|v| !v.is_empty())
                    .cloned()
                    .unwrap_or_else(|| format!("{}/{}/v2.0", AAD_AUTHORITY_BASE, tenant_id));

                let discovery_url = vars
                    .get("AAD_OPENID_CONFIG")
                    .filter(|v| !v.is_empty())
                    .cloned()
                    .unwrap_or_else(|| {
                        format!(
                            "{}/{}/v2.0/.well-known/openid-configuration",
                            AAD_AUTHORITY_BASE, tenant_id
                        )
                    });

                Ok(AuthSettings::TokenIssuer(IssuerSettings {
                    tenant_id,
                    audience,
                    issuer,
                    discovery_url,
                }))
            }
            "API_KEY" => {
                let header = vars
                    .get("API_KEY_HEADER")
                    .filter(|v| !v.is_empty())
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_API_KEY_HEADER.to_string())
                    .to_ascii_lowercase();

                // Reject names that cannot appear as an HTTP header, so the
                // case-insensitive lookup in the mediator cannot silently
                // match nothing.
                if axum::http::header::HeaderName::try_from(header.as_str()).is_err() {
                    return Err(ConfigError::InvalidApiKeyHeader(header));
                }

                let value = vars
                    .get("API_KEY_VALUE")
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| ConfigError::MissingEnvVar("API_KEY_VALUE".to_string()))?
                    .clone();

                Ok(AuthSettings::SharedSecret(ApiKeySettings {
                    header,
                    value: SecretString::from(value),
                }))
            }
            other => Err(ConfigError::UnsupportedAuthMode(other.to_string())),
        }
    }
}
