//! Gate configuration value objects.
//!
//! Configuration is owned by the host and handed to each operation fresh;
//! nothing here is cached across requests.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, KeyKind};
use crate::exclusion::ExclusionRules;
use crate::ip::ClientIp;
use crate::secret::Secret;

/// Default reputation service domain.
pub const DEFAULT_SERVICE_DOMAIN: &str = "cloudfilt.com";
/// Default platform name used in the registration endpoint path.
pub const DEFAULT_PLATFORM: &str = "joomla";
/// Default hard timeout for outbound calls.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// The paired keys issued by the reputation service.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Client-visible key, embedded in the asset URL and block redirect.
    #[serde(alias = "key_front")]
    pub front_key: String,
    /// Server-only key, sent with every verification call.
    #[serde(alias = "key_back")]
    pub back_key: Secret<String>,
}

impl Credentials {
    /// Creates a key pair.
    pub fn new(front_key: impl Into<String>, back_key: impl Into<String>) -> Self {
        Self {
            front_key: front_key.into(),
            back_key: Secret::new(back_key.into()),
        }
    }

    /// Returns the first blank key, front checked before back.
    ///
    /// A key holding only whitespace counts as blank.
    pub fn first_missing(&self) -> Option<KeyKind> {
        if self.front_key.trim().is_empty() {
            Some(KeyKind::Front)
        } else if self.back_key.is_blank() {
            Some(KeyKind::Back)
        } else {
            None
        }
    }

    /// Returns `true` when both keys are present.
    pub fn is_complete(&self) -> bool {
        self.first_missing().is_none()
    }
}

/// Site identifier resolved from a key pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct SiteIdentity(String);

impl SiteIdentity {
    /// Wraps a resolved identifier.
    pub fn new(site_id: impl Into<String>) -> Self {
        Self(site_id.into())
    }

    /// Returns the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether the gate filters traffic at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Requests are checked against the reputation service.
    Enabled,
    /// Every request is allowed until an operator re-enables the gate.
    Disabled,
}

/// What to do when the verification call fails at the transport level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportFailurePolicy {
    /// Allow the request; only an explicit non-`OK` body blocks.
    #[default]
    FailOpen,
    /// Block the request whenever the body is not exactly `OK`.
    FailClosed,
}

/// Endpoints and transport settings of the reputation service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base domain, e.g. `cloudfilt.com`.
    pub domain: String,
    /// Platform name in the registration path.
    pub platform: String,
    /// Hard timeout for a single outbound call.
    pub timeout_ms: u64,
    /// Skip TLS certificate validation. Off unless explicitly configured.
    pub accept_invalid_certs: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            domain: DEFAULT_SERVICE_DOMAIN.to_string(),
            platform: DEFAULT_PLATFORM.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            accept_invalid_certs: false,
        }
    }
}

impl ServiceConfig {
    /// Per-request verification endpoint for `site`.
    pub fn verification_url(&self, site: &SiteIdentity) -> String {
        format!("https://api{}.{}/phpcurl", site, self.domain)
    }

    /// Key-pair registration endpoint.
    pub fn registration_url(&self) -> String {
        format!("https://api.{}/checkcms/{}.php", self.domain, self.platform)
    }

    /// Client-side analysis script injected into allowed pages.
    pub fn asset_url(&self, site: &SiteIdentity, front_key: &str) -> String {
        format!(
            "https://srv{}.{}/analyz.js?render={}",
            site, self.domain, front_key
        )
    }

    /// Redirect target for blocked clients.
    pub fn block_url(&self, client_ip: &ClientIp, front_key: &str) -> String {
        format!("https://{}/stop-{}-{}", self.domain, client_ip, front_key)
    }
}

/// The complete gate configuration as stored by the host.
///
/// # Examples
///
/// ```
/// use admission_gate::{GateConfig, GateState, TransportFailurePolicy};
///
/// let config = GateConfig::from_toml_str(
///     r#"
///     key_front = "fk-1"
///     key_back = "bk-1"
///     key_site = "42"
///     component_exclude = ["com_ajax"]
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(config.gate_state(), GateState::Enabled);
/// assert_eq!(config.site().unwrap().as_str(), "42");
/// assert_eq!(config.transport_failure, TransportFailurePolicy::FailOpen);
/// assert!(config.exclusions.excluded_resource_types.contains("com_ajax"));
/// ```
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Front/back key pair.
    #[serde(flatten)]
    pub credentials: Credentials,
    /// Cached site identifier from the last successful resolution.
    #[serde(alias = "key_site")]
    pub site_key: Option<String>,
    /// Host-level enabled flag.
    pub enabled: bool,
    /// Traffic that bypasses filtering.
    #[serde(flatten)]
    pub exclusions: ExclusionRules,
    /// Reputation service endpoints.
    pub service: ServiceConfig,
    /// Verification failure posture.
    pub transport_failure: TransportFailurePolicy,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            site_key: None,
            enabled: true,
            exclusions: ExclusionRules::default(),
            service: ServiceConfig::default(),
            transport_failure: TransportFailurePolicy::default(),
        }
    }
}

impl GateConfig {
    /// Creates an enabled configuration with the given keys and no site.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            ..Self::default()
        }
    }

    /// Sets the cached site identifier.
    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site_key = Some(site.into());
        self
    }

    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigParse` on malformed TOML or mistyped fields.
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigIo` if the file cannot be read, or
    /// `Error::ConfigParse` if it is not valid configuration.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Lifecycle state derived from the enabled flag.
    pub fn gate_state(&self) -> GateState {
        if self.enabled {
            GateState::Enabled
        } else {
            GateState::Disabled
        }
    }

    /// The cached site identifier, if a non-blank one is stored.
    pub fn site(&self) -> Option<SiteIdentity> {
        self.site_key
            .as_deref()
            .filter(|site| !site.trim().is_empty())
            .map(SiteIdentity::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_enabled_and_fail_open() {
        let config = GateConfig::default();
        assert_eq!(config.gate_state(), GateState::Enabled);
        assert_eq!(config.transport_failure, TransportFailurePolicy::FailOpen);
        assert_eq!(config.service.timeout_ms, 1000);
        assert!(!config.service.accept_invalid_certs);
        assert!(config.site().is_none());
    }

    #[test]
    fn endpoint_urls() {
        let service = ServiceConfig::default();
        let site = SiteIdentity::new("7");
        let ip = ClientIp::from("203.0.113.5".parse::<std::net::IpAddr>().unwrap());

        assert_eq!(service.verification_url(&site), "https://api7.cloudfilt.com/phpcurl");
        assert_eq!(
            service.registration_url(),
            "https://api.cloudfilt.com/checkcms/joomla.php"
        );
        assert_eq!(
            service.asset_url(&site, "fk"),
            "https://srv7.cloudfilt.com/analyz.js?render=fk"
        );
        assert_eq!(
            service.block_url(&ip, "fk"),
            "https://cloudfilt.com/stop-203.0.113.5-fk"
        );
    }

    #[test]
    fn parses_nested_service_and_policy() {
        let config = GateConfig::from_toml_str(
            r#"
            front_key = "fk"
            back_key = "bk"
            enabled = false
            transport_failure = "fail-closed"
            excluded_roles = ["8"]

            [service]
            domain = "example.test"
            timeout_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.gate_state(), GateState::Disabled);
        assert_eq!(config.transport_failure, TransportFailurePolicy::FailClosed);
        assert_eq!(config.service.domain, "example.test");
        assert_eq!(config.service.platform, "joomla");
        assert_eq!(config.service.timeout_ms, 250);
        assert!(config.exclusions.excluded_roles.contains("8"));
        assert_eq!(config.credentials.back_key.expose_secret(), "bk");
    }

    #[test]
    fn debug_output_redacts_back_key() {
        let config = GateConfig::new(Credentials::new("fk", "very-secret-back"));
        assert!(!format!("{:?}", config).contains("very-secret-back"));
    }

    #[test]
    fn blank_site_key_counts_as_absent() {
        let config = GateConfig::default().with_site("  ");
        assert!(config.site().is_none());
    }

    #[test]
    fn missing_keys_are_reported_front_first() {
        assert_eq!(Credentials::new("", "").first_missing(), Some(KeyKind::Front));
        assert_eq!(Credentials::new("fk", " ").first_missing(), Some(KeyKind::Back));
        assert!(Credentials::new("fk", "bk").is_complete());
    }

    #[test]
    fn rejects_mistyped_fields() {
        let err = GateConfig::from_toml_str("enabled = \"yes\"").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }
}
