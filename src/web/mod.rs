//! Web framework integration surface.
//!
//! This module is the boundary between a host platform and the gate. It
//! handles:
//! - Mapping host requests to [`PageRequest`](crate::PageRequest)
//! - Keeping origin signals tainted until the IP extractor validates them
//! - The side-effect interface ([`PageHost`]) through which decisions and
//!   operator messages are applied
//!
//! # Integration Model
//!
//! Host-specific code should:
//! 1. Fill a [`RequestAdapter`] (or implement [`ExtractPageRequest`])
//! 2. Load the gate configuration fresh from its store
//! 3. Call `AdmissionGate::handle` with its [`PageHost`] implementation
//! 4. On configuration save, call `CredentialResolver::on_configuration_save`
//!    and refuse the save if it returns an error
//!
//! # Example Flow
//!
//! ```
//! use admission_gate::web::{ExtractPageRequest, RecordingHost, RequestAdapter};
//! use admission_gate::{AdmissionGate, Credentials, GateConfig, ScriptedClient};
//!
//! let mut adapter = RequestAdapter::new("req-1".to_string());
//! adapter.add_server_var("REMOTE_ADDR", "192.0.2.5");
//! adapter.set_url("https://site.test/");
//!
//! let config = GateConfig::new(Credentials::new("fk", "bk")).with_site("2");
//! let gate = AdmissionGate::new(ScriptedClient::new().reply("OK"));
//! let mut host = RecordingHost::default();
//!
//! let admission = gate.handle(&config, &adapter.extract_page_request(), &mut host);
//!
//! assert!(admission.decision.is_allow());
//! assert_eq!(host.scripts, vec!["https://srv2.cloudfilt.com/analyz.js?render=fk".to_string()]);
//! ```

mod adapter;
mod extract;
mod host;

pub use adapter::{RequestAdapter, RESOURCE_TYPE_PARAM};
pub use extract::ExtractPageRequest;
pub use host::{MessageLevel, PageHost, RecordingHost};
