//! Key-pair validation and site identifier resolution.
//!
//! Resolution runs when an operator saves the gate configuration. A
//! successful run may update the cached site identifier; any failure
//! disables the gate, clears the cached identifier and refuses the save.

use serde_json::Value;

use crate::config::{Credentials, ServiceConfig, SiteIdentity};
use crate::error::{CredentialError, Error, StoreError};
use crate::store::ConfigStore;
use crate::transport::RemoteClient;
use crate::web::{MessageLevel, PageHost};

/// `status` value the registration endpoint uses to reject a key pair.
pub const REJECTED_STATUS: &str = "NO";

/// A state change the configuration store is asked to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigTransition {
    /// Cache a newly resolved site identifier.
    PersistSiteKey(SiteIdentity),
    /// Disable the gate and forget the cached site identifier.
    DisableAndClear,
}

impl ConfigTransition {
    /// Carries out the transition against `store`.
    ///
    /// # Errors
    ///
    /// Returns the store's error unchanged.
    pub fn apply<S: ConfigStore + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
        match self {
            ConfigTransition::PersistSiteKey(site) => store.persist_site_key(site),
            ConfigTransition::DisableAndClear => store.disable_and_clear_site_key(),
        }
    }
}

impl CredentialError {
    /// The transition every credential failure requests.
    pub fn transition(&self) -> ConfigTransition {
        ConfigTransition::DisableAndClear
    }
}

/// A successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Site identifier the reputation service returned.
    pub site: SiteIdentity,
    /// `Some` only when the identifier differs from the stored one.
    pub transition: Option<ConfigTransition>,
}

/// Parses a registration endpoint body.
///
/// The body is a JSON object with a `status` field and, when accepted, a
/// `site` field that may be a string or a number.
///
/// # Errors
///
/// `CredentialsRejected` for status `NO`; `MalformedResponse` when the body
/// is not a JSON object, lacks `status`, or an accepted reply lacks `site`.
///
/// # Examples
///
/// ```
/// use admission_gate::{parse_registration, CredentialError};
///
/// assert_eq!(parse_registration(r#"{"status":"OK","site":"123"}"#).unwrap().as_str(), "123");
/// assert_eq!(parse_registration(r#"{"status":"NO"}"#), Err(CredentialError::CredentialsRejected));
/// ```
pub fn parse_registration(body: &str) -> Result<SiteIdentity, CredentialError> {
    let malformed = |reason: &str| CredentialError::MalformedResponse {
        reason: reason.to_string(),
    };

    let reply: Value = serde_json::from_str(body).map_err(|_| malformed("body is not JSON"))?;
    let Some(reply) = reply.as_object() else {
        return Err(malformed("body is not a JSON object"));
    };

    let status = match reply.get("status") {
        None | Some(Value::Null) => return Err(malformed("missing status")),
        Some(status) => status,
    };

    if status.as_str() == Some(REJECTED_STATUS) {
        return Err(CredentialError::CredentialsRejected);
    }

    match reply.get("site") {
        Some(Value::String(site)) if !site.trim().is_empty() => Ok(SiteIdentity::new(site.clone())),
        Some(Value::Number(site)) => Ok(SiteIdentity::new(site.to_string())),
        _ => Err(malformed("accepted reply without a site")),
    }
}

/// Validates key pairs against the registration endpoint.
#[derive(Debug)]
pub struct CredentialResolver<C> {
    client: C,
}

impl<C: RemoteClient> CredentialResolver<C> {
    /// Creates a resolver that calls out through `client`.
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Returns the outbound client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Resolves `credentials` to a site identifier.
    ///
    /// Makes no remote call when either key is blank. On success the
    /// returned [`Resolution`] requests persistence only if the site differs
    /// from `stored`, so resolving unchanged keys again is a no-op.
    ///
    /// # Errors
    ///
    /// `EmptyCredential`, `ConnectionFailed`, `CredentialsRejected` or
    /// `MalformedResponse`.
    pub fn resolve(
        &self,
        credentials: &Credentials,
        stored: Option<&SiteIdentity>,
        service: &ServiceConfig,
    ) -> Result<Resolution, CredentialError> {
        if let Some(which) = credentials.first_missing() {
            return Err(CredentialError::EmptyCredential { which });
        }

        let fields = [
            ("key_front", credentials.front_key.as_str()),
            ("key_back", credentials.back_key.expose_secret().as_str()),
        ];
        let body = self
            .client
            .post(&service.registration_url(), &fields, service.timeout_ms)
            .map_err(|error| CredentialError::ConnectionFailed {
                reason: error.to_string(),
            })?;

        let site = parse_registration(&body)?;
        let transition =
            (stored != Some(&site)).then(|| ConfigTransition::PersistSiteKey(site.clone()));

        Ok(Resolution { site, transition })
    }

    /// Runs resolution for a configuration save.
    ///
    /// Loads the configuration fresh from `store`, resolves it and applies
    /// the resulting transition. On failure the gate is disabled, a warning
    /// naming the reason is queued on `host`, and the error is returned so
    /// the host refuses the save. If the store cannot record the disable, an
    /// error message follows the warning.
    ///
    /// # Errors
    ///
    /// `Error::Credential` when resolution fails, `Error::Store` when the
    /// configuration cannot be loaded or the new site cannot be persisted.
    pub fn on_configuration_save<S, H>(
        &self,
        store: &mut S,
        host: &mut H,
    ) -> Result<SiteIdentity, Error>
    where
        S: ConfigStore + ?Sized,
        H: PageHost + ?Sized,
    {
        let config = store.load()?;
        let stored = config.site();

        match self.resolve(&config.credentials, stored.as_ref(), &config.service) {
            Ok(resolution) => {
                if let Some(transition) = &resolution.transition {
                    transition.apply(store)?;
                    tracing::info!(site = %resolution.site, "site identifier updated");
                } else {
                    tracing::debug!(site = %resolution.site, "site identifier unchanged");
                }
                Ok(resolution.site)
            }
            Err(error) => {
                tracing::warn!(%error, "credential resolution failed, disabling gate");

                let disabled = error.transition().apply(store);
                host.enqueue_message(
                    MessageLevel::Warning,
                    &format!("The admission gate has been disabled: {error}"),
                );
                if let Err(store_error) = disabled {
                    tracing::error!(%store_error, "could not disable gate");
                    host.enqueue_message(
                        MessageLevel::Error,
                        &format!("The admission gate could not be disabled: {store_error}"),
                    );
                }

                Err(error.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GateConfig;
    use crate::error::{KeyKind, TransportError};
    use crate::transport::ScriptedClient;
    use crate::web::RecordingHost;

    /// Serves a fixed configuration and refuses every write.
    struct ReadOnlyStore;

    impl ConfigStore for ReadOnlyStore {
        fn load(&self) -> Result<GateConfig, StoreError> {
            Ok(GateConfig::new(Credentials::new("fk", "bk")).with_site("5"))
        }

        fn persist_site_key(&mut self, _site: &SiteIdentity) -> Result<(), StoreError> {
            Err(StoreError::new("read-only"))
        }

        fn disable_and_clear_site_key(&mut self) -> Result<(), StoreError> {
            Err(StoreError::new("read-only"))
        }
    }

    fn service() -> ServiceConfig {
        ServiceConfig::default()
    }

    #[test]
    fn parse_accepts_numeric_site() {
        assert_eq!(
            parse_registration(r#"{"status":"OK","site":77}"#).unwrap(),
            SiteIdentity::new("77")
        );
    }

    #[test]
    fn parse_rejects_bad_bodies() {
        for body in [
            "",
            "OK",
            "[1,2]",
            "<html>502 Bad Gateway</html>",
            r#"{"site":"1"}"#,
            r#"{"status":null}"#,
            r#"{"status":"OK"}"#,
            r#"{"status":"OK","site":""}"#,
        ] {
            assert!(
                matches!(
                    parse_registration(body),
                    Err(CredentialError::MalformedResponse { .. })
                ),
                "{body}"
            );
        }
    }

    #[test]
    fn empty_front_key_short_circuits() {
        let resolver = CredentialResolver::new(ScriptedClient::new());
        let err = resolver
            .resolve(&Credentials::new("", "x"), None, &service())
            .unwrap_err();

        assert_eq!(
            err,
            CredentialError::EmptyCredential {
                which: KeyKind::Front
            }
        );
        assert_eq!(resolver.client().call_count(), 0);
    }

    #[test]
    fn registration_call_shape() {
        let resolver =
            CredentialResolver::new(ScriptedClient::new().reply(r#"{"status":"OK","site":"4"}"#));
        resolver
            .resolve(&Credentials::new("fk", "bk"), None, &service())
            .unwrap();

        let call = &resolver.client().calls()[0];
        assert_eq!(call.url, "https://api.cloudfilt.com/checkcms/joomla.php");
        assert_eq!(call.field("key_front"), Some("fk"));
        assert_eq!(call.field("key_back"), Some("bk"));
    }

    #[test]
    fn transport_error_is_connection_failure() {
        let resolver = CredentialResolver::new(
            ScriptedClient::new().fail(TransportError::Timeout { timeout_ms: 1000 }),
        );
        let err = resolver
            .resolve(&Credentials::new("fk", "bk"), None, &service())
            .unwrap_err();

        assert!(matches!(err, CredentialError::ConnectionFailed { .. }));
        assert_eq!(err.transition(), ConfigTransition::DisableAndClear);
    }

    #[test]
    fn unchanged_site_requests_no_transition() {
        let resolver =
            CredentialResolver::new(ScriptedClient::new().reply(r#"{"status":"OK","site":"5"}"#));
        let stored = SiteIdentity::new("5");
        let resolution = resolver
            .resolve(&Credentials::new("fk", "bk"), Some(&stored), &service())
            .unwrap();

        assert_eq!(resolution.site, stored);
        assert!(resolution.transition.is_none());
    }

    #[test]
    fn changed_site_requests_persist() {
        let resolver =
            CredentialResolver::new(ScriptedClient::new().reply(r#"{"status":"OK","site":"6"}"#));
        let stored = SiteIdentity::new("5");
        let resolution = resolver
            .resolve(&Credentials::new("fk", "bk"), Some(&stored), &service())
            .unwrap();

        assert_eq!(
            resolution.transition,
            Some(ConfigTransition::PersistSiteKey(SiteIdentity::new("6")))
        );
    }

    #[test]
    fn failed_disable_is_reported_after_the_warning() {
        let resolver = CredentialResolver::new(ScriptedClient::new().reply(r#"{"status":"NO"}"#));
        let mut host = RecordingHost::default();

        let err = resolver
            .on_configuration_save(&mut ReadOnlyStore, &mut host)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Credential(CredentialError::CredentialsRejected)
        ));
        assert_eq!(host.messages.len(), 2);
        assert_eq!(host.messages[0].0, MessageLevel::Warning);
        assert_eq!(
            host.messages[1],
            (
                MessageLevel::Error,
                "The admission gate could not be disabled: configuration store error: read-only"
                    .to_string()
            )
        );
    }
}
