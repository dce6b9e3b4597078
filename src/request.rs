use std::collections::BTreeSet;

use crate::config::{ServiceConfig, SiteIdentity};
use crate::error::TransportError;
use crate::ip::{ClientIp, OriginSignals};
use crate::secret::Secret;
use crate::transport::RemoteClient;

/// Everything the gate needs to know about one inbound page request.
///
/// Built by the host (usually through [`web::RequestAdapter`](crate::web::RequestAdapter))
/// for every request and dropped afterwards.
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    /// Host-assigned identifier used to correlate log events.
    pub request_id: String,
    /// Untrusted client-address signals.
    pub origin: OriginSignals,
    /// Full URL the client asked for.
    pub url: String,
    /// Resource type (component) the URL routes to.
    pub resource_type: String,
    /// Roles held by the current user; empty for guests.
    pub user_roles: BTreeSet<String>,
}

/// The payload of one verification call.
///
/// Constructed per decision and never stored.
#[derive(Debug)]
pub struct AdmissionRequest<'a> {
    /// Client address, or `UNKNOWN`.
    pub client_ip: &'a ClientIp,
    /// URL being requested.
    pub requested_url: &'a str,
    /// Server-only key.
    pub back_key: &'a Secret<String>,
    /// Resolved site identifier selecting the verification host.
    pub site: &'a SiteIdentity,
}

impl AdmissionRequest<'_> {
    /// Posts the payload to the site's verification endpoint.
    ///
    /// # Errors
    ///
    /// Propagates the transport failure unchanged; deciding what it means is
    /// up to the caller.
    pub fn send<C: RemoteClient + ?Sized>(
        &self,
        client: &C,
        service: &ServiceConfig,
    ) -> Result<String, TransportError> {
        let ip = self.client_ip.to_string();
        let fields = [
            ("ip", ip.as_str()),
            ("KEY", self.back_key.expose_secret().as_str()),
            ("URL", self.requested_url),
        ];

        client.post(
            &service.verification_url(self.site),
            &fields,
            service.timeout_ms,
        )
    }
}
