use std::fmt;

use crate::{
    config::{GateConfig, GateState, TransportFailurePolicy},
    error::TransportError,
    exclusion::is_excluded,
    ip::extract_client_ip,
    logging::GateLog,
    request::{AdmissionRequest, PageRequest},
    transport::RemoteClient,
    web::PageHost,
};

/// Body the verification endpoint returns for an allowed client.
pub const ALLOW_BODY: &str = "OK";

/// Whether a request may proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// Serve the page.
    Allow,
    /// Do not serve content; redirect to the contained target.
    Block(String),
}

impl AdmissionDecision {
    /// Returns `true` for [`AdmissionDecision::Allow`].
    pub fn is_allow(&self) -> bool {
        matches!(self, AdmissionDecision::Allow)
    }
}

impl fmt::Display for AdmissionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmissionDecision::Allow => write!(f, "allow"),
            AdmissionDecision::Block(_) => write!(f, "block"),
        }
    }
}

/// Why a request was allowed without asking the reputation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bypass {
    /// The gate is disabled.
    Disabled,
    /// Keys or site identifier are missing.
    Unconfigured,
    /// The resource type or a user role is excluded.
    Excluded,
}

impl fmt::Display for Bypass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bypass::Disabled => write!(f, "gate disabled"),
            Bypass::Unconfigured => write!(f, "gate not configured"),
            Bypass::Excluded => write!(f, "request excluded"),
        }
    }
}

/// Client-side script the host should add, loaded asynchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    /// Script URL, parameterized by site and front key.
    pub url: String,
}

/// The full result of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    /// Allow or block.
    pub decision: AdmissionDecision,
    /// Set when the reputation service was not consulted.
    pub bypass: Option<Bypass>,
    /// Script to inject; only present after a verification call that allowed.
    pub asset: Option<AssetReference>,
}

impl Admission {
    fn bypassed(reason: Bypass) -> Self {
        Self {
            decision: AdmissionDecision::Allow,
            bypass: Some(reason),
            asset: None,
        }
    }
}

/// Applies the configured policy to the outcome of a verification call.
///
/// A body of exactly `OK` always allows. Under
/// [`TransportFailurePolicy::FailOpen`] only a non-empty, non-`OK` body
/// blocks; transport errors allow. Under
/// [`TransportFailurePolicy::FailClosed`] anything but `OK` blocks.
///
/// # Examples
///
/// ```
/// use admission_gate::{blocks, TransportError, TransportFailurePolicy};
///
/// let timeout = Err(TransportError::Timeout { timeout_ms: 1000 });
///
/// assert!(!blocks(TransportFailurePolicy::FailOpen, &timeout));
/// assert!(blocks(TransportFailurePolicy::FailClosed, &timeout));
/// assert!(blocks(TransportFailurePolicy::FailOpen, &Ok("BLOCKED".to_string())));
/// ```
pub fn blocks(policy: TransportFailurePolicy, outcome: &Result<String, TransportError>) -> bool {
    match (policy, outcome) {
        (_, Ok(body)) if body == ALLOW_BODY => false,
        (TransportFailurePolicy::FailOpen, Ok(body)) => !body.is_empty(),
        (TransportFailurePolicy::FailOpen, Err(_)) => false,
        (TransportFailurePolicy::FailClosed, _) => true,
    }
}

/// Per-request admission gate.
///
/// Holds only the outbound client. Configuration is passed to every call so
/// that a decision never acts on values cached from an earlier request.
///
/// # Examples
///
/// ```
/// use admission_gate::{
///     AdmissionDecision, AdmissionGate, Credentials, GateConfig, OriginSignal, PageRequest,
///     ScriptedClient,
/// };
///
/// let config = GateConfig::new(Credentials::new("fk", "bk")).with_site("5");
/// let request = PageRequest {
///     request_id: "req-1".to_string(),
///     origin: admission_gate::OriginSignals::new().with(OriginSignal::RemoteAddr, "192.0.2.8"),
///     url: "https://site.test/".to_string(),
///     ..PageRequest::default()
/// };
///
/// let gate = AdmissionGate::new(ScriptedClient::new().reply("BLOCKED"));
/// let admission = gate.decide(&config, &request);
///
/// assert_eq!(
///     admission.decision,
///     AdmissionDecision::Block("https://cloudfilt.com/stop-192.0.2.8-fk".to_string())
/// );
/// ```
#[derive(Debug)]
pub struct AdmissionGate<C> {
    client: C,
}

impl<C: RemoteClient> AdmissionGate<C> {
    /// Creates a gate that verifies through `client`.
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Returns the outbound client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Decides whether `request` may proceed.
    ///
    /// Misconfiguration and excluded traffic allow without a remote call.
    /// Otherwise exactly one verification call is made and its outcome is
    /// judged by the configured [`TransportFailurePolicy`]. Never fails.
    pub fn decide(&self, config: &GateConfig, request: &PageRequest) -> Admission {
        let log = GateLog::new(&request.request_id);

        if config.gate_state() == GateState::Disabled {
            log.bypass(Bypass::Disabled);
            return Admission::bypassed(Bypass::Disabled);
        }

        let site = match config.site() {
            Some(site) if config.credentials.is_complete() => site,
            _ => {
                log.bypass(Bypass::Unconfigured);
                return Admission::bypassed(Bypass::Unconfigured);
            }
        };

        if is_excluded(&request.resource_type, &request.user_roles, &config.exclusions) {
            log.bypass(Bypass::Excluded);
            return Admission::bypassed(Bypass::Excluded);
        }

        let client_ip = extract_client_ip(&request.origin);
        let payload = AdmissionRequest {
            client_ip: &client_ip,
            requested_url: &request.url,
            back_key: &config.credentials.back_key,
            site: &site,
        };
        let outcome = payload.send(&self.client, &config.service);

        if let Err(error) = &outcome {
            log.transport_failure(&client_ip, error);
        }

        let front_key = &config.credentials.front_key;
        let admission = if blocks(config.transport_failure, &outcome) {
            Admission {
                decision: AdmissionDecision::Block(config.service.block_url(&client_ip, front_key)),
                bypass: None,
                asset: None,
            }
        } else {
            Admission {
                decision: AdmissionDecision::Allow,
                bypass: None,
                asset: Some(AssetReference {
                    url: config.service.asset_url(&site, front_key),
                }),
            }
        };

        log.verdict(&client_ip, &admission.decision);
        admission
    }

    /// Decides and applies the result through the host.
    ///
    /// Allowed pages get the asset script; blocked clients are redirected.
    pub fn handle<H: PageHost + ?Sized>(
        &self,
        config: &GateConfig,
        request: &PageRequest,
        host: &mut H,
    ) -> Admission {
        let admission = self.decide(config, request);

        match &admission.decision {
            AdmissionDecision::Allow => {
                if let Some(asset) = &admission.asset {
                    host.add_async_script(&asset.url);
                }
            }
            AdmissionDecision::Block(target) => host.redirect(target),
        }

        admission
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Credentials, exclusion::ExclusionRules, ip::OriginSignal, ip::OriginSignals,
        transport::ScriptedClient, web::RecordingHost,
    };

    fn config() -> GateConfig {
        GateConfig::new(Credentials::new("fk-9", "bk-9")).with_site("12")
    }

    fn request() -> PageRequest {
        PageRequest {
            request_id: "req-gate".to_string(),
            origin: OriginSignals::new().with(OriginSignal::RemoteAddr, "198.51.100.20"),
            url: "https://site.test/blog".to_string(),
            resource_type: "com_content".to_string(),
            ..PageRequest::default()
        }
    }

    #[test]
    fn policy_table() {
        use TransportFailurePolicy::{FailClosed, FailOpen};
        let ok = Ok("OK".to_string());
        let empty = Ok(String::new());
        let blocked = Ok("BLOCKED".to_string());
        let failed = Err(TransportError::Connect("refused".to_string()));

        assert!(!blocks(FailOpen, &ok));
        assert!(!blocks(FailOpen, &empty));
        assert!(blocks(FailOpen, &blocked));
        assert!(!blocks(FailOpen, &failed));

        assert!(!blocks(FailClosed, &ok));
        assert!(blocks(FailClosed, &empty));
        assert!(blocks(FailClosed, &blocked));
        assert!(blocks(FailClosed, &failed));
    }

    #[test]
    fn ok_is_case_and_whitespace_sensitive() {
        assert!(blocks(TransportFailurePolicy::FailOpen, &Ok("ok".to_string())));
        assert!(blocks(TransportFailurePolicy::FailOpen, &Ok("OK\n".to_string())));
    }

    #[test]
    fn disabled_gate_allows_without_call() {
        let mut config = config();
        config.enabled = false;
        let gate = AdmissionGate::new(ScriptedClient::new());

        let admission = gate.decide(&config, &request());

        assert_eq!(admission.bypass, Some(Bypass::Disabled));
        assert!(admission.decision.is_allow());
        assert_eq!(gate.client().call_count(), 0);
    }

    #[test]
    fn missing_site_or_keys_allow_without_call() {
        let gate = AdmissionGate::new(ScriptedClient::new());

        let no_site = GateConfig::new(Credentials::new("fk", "bk"));
        assert_eq!(gate.decide(&no_site, &request()).bypass, Some(Bypass::Unconfigured));

        let no_back = GateConfig::new(Credentials::new("fk", "")).with_site("1");
        assert_eq!(gate.decide(&no_back, &request()).bypass, Some(Bypass::Unconfigured));

        assert_eq!(gate.client().call_count(), 0);
    }

    #[test]
    fn excluded_request_allows_without_asset() {
        let mut config = config();
        config.exclusions = ExclusionRules::new(["com_content"], Vec::<String>::new());
        let gate = AdmissionGate::new(ScriptedClient::new());

        let admission = gate.decide(&config, &request());

        assert_eq!(admission.bypass, Some(Bypass::Excluded));
        assert!(admission.asset.is_none());
        assert_eq!(gate.client().call_count(), 0);
    }

    #[test]
    fn unknown_ip_is_still_verified() {
        let gate = AdmissionGate::new(ScriptedClient::new().reply("BLOCKED"));
        let request = PageRequest {
            origin: OriginSignals::new(),
            ..request()
        };

        let admission = gate.decide(&config(), &request);

        assert_eq!(gate.client().calls()[0].field("ip"), Some("UNKNOWN"));
        assert_eq!(
            admission.decision,
            AdmissionDecision::Block("https://cloudfilt.com/stop-UNKNOWN-fk-9".to_string())
        );
    }

    #[test]
    fn fail_closed_blocks_on_timeout() {
        let mut config = config();
        config.transport_failure = TransportFailurePolicy::FailClosed;
        let gate = AdmissionGate::new(
            ScriptedClient::new().fail(TransportError::Timeout { timeout_ms: 1000 }),
        );

        let admission = gate.decide(&config, &request());

        assert_eq!(
            admission.decision,
            AdmissionDecision::Block("https://cloudfilt.com/stop-198.51.100.20-fk-9".to_string())
        );
    }

    #[test]
    fn handle_injects_asset_on_allow() {
        let gate = AdmissionGate::new(ScriptedClient::new().reply("OK"));
        let mut host = RecordingHost::default();

        gate.handle(&config(), &request(), &mut host);

        assert_eq!(
            host.scripts,
            vec!["https://srv12.cloudfilt.com/analyz.js?render=fk-9".to_string()]
        );
        assert!(host.redirects.is_empty());
    }

    #[test]
    fn handle_redirects_on_block() {
        let gate = AdmissionGate::new(ScriptedClient::new().reply("BLOCKED"));
        let mut host = RecordingHost::default();

        gate.handle(&config(), &request(), &mut host);

        assert!(host.scripts.is_empty());
        assert_eq!(
            host.redirects,
            vec!["https://cloudfilt.com/stop-198.51.100.20-fk-9".to_string()]
        );
    }
}
