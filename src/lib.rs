//! Per-request admission gate backed by an IP reputation service.
//!
//! Before a page is rendered the host asks the gate whether the client may
//! proceed. The gate posts the client address and requested URL to the
//! reputation service and either lets the page through (adding the
//! service's analysis script) or redirects the client to a block page.
//!
//! The gate also owns its credentials: a front/back key pair is resolved to
//! a site identifier whenever the operator saves the configuration, and
//! the gate disables itself when the keys stop being valid.
//!
//! # Core Types
//!
//! - [`AdmissionGate`]: Per-request allow/block decision
//! - [`CredentialResolver`]: Key-pair validation and site resolution
//! - [`GateConfig`]: Configuration value object, reloaded per operation
//! - [`RemoteClient`]: Seam for the outbound HTTP call
//! - [`ConfigStore`]: Seam for configuration persistence
//! - [`Secret<T>`]: Wrapper that redacts the back key in logs/output
//! - [`Tainted<T>`]: Wrapper for untrusted request-origin signals
//!
//! # Examples
//!
//! ```
//! use admission_gate::{
//!     AdmissionDecision, AdmissionGate, Credentials, GateConfig, OriginSignal, OriginSignals,
//!     PageRequest, ScriptedClient,
//! };
//!
//! let config = GateConfig::new(Credentials::new("front-1", "back-1")).with_site("17");
//! let request = PageRequest {
//!     request_id: "req-123".to_string(),
//!     origin: OriginSignals::new().with(OriginSignal::RemoteAddr, "203.0.113.9"),
//!     url: "https://site.test/news".to_string(),
//!     ..PageRequest::default()
//! };
//!
//! let gate = AdmissionGate::new(ScriptedClient::new().reply("OK"));
//! let admission = gate.decide(&config, &request);
//!
//! assert_eq!(admission.decision, AdmissionDecision::Allow);
//! assert_eq!(
//!     admission.asset.unwrap().url,
//!     "https://srv17.cloudfilt.com/analyz.js?render=front-1"
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod credentials;
mod error;
mod exclusion;
mod gate;
mod ip;
mod logging;
mod request;
mod sanitizer;
mod secret;
mod store;
mod tainted;
mod transport;
mod verified;
pub mod web;

pub use config::{
    Credentials, GateConfig, GateState, ServiceConfig, SiteIdentity, TransportFailurePolicy,
    DEFAULT_PLATFORM, DEFAULT_SERVICE_DOMAIN, DEFAULT_TIMEOUT_MS,
};
pub use credentials::{
    parse_registration, ConfigTransition, CredentialResolver, Resolution, REJECTED_STATUS,
};
pub use error::{CredentialError, Error, KeyKind, StoreError, TransportError};
pub use exclusion::{is_excluded, ExclusionRules};
pub use gate::{
    blocks, Admission, AdmissionDecision, AdmissionGate, AssetReference, Bypass, ALLOW_BODY,
};
pub use ip::{extract_client_ip, ClientAddr, ClientIp, OriginSignal, OriginSignals};
pub use logging::GateLog;
pub use request::{AdmissionRequest, PageRequest};
pub use sanitizer::{IpSanitizer, SanitizationError, SanitizationErrorKind, Sanitizer};
pub use secret::Secret;
pub use store::{ConfigStore, MemoryConfigStore};
pub use tainted::Tainted;
pub use transport::{HttpRemoteClient, RecordedCall, RemoteClient, ScriptedClient};
pub use verified::Verified;
