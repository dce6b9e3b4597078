//! Outbound form POSTs to the reputation service.
//!
//! [`RemoteClient`] is the seam between decision logic and the network.
//! [`HttpRemoteClient`] is the production implementation; [`ScriptedClient`]
//! replays canned replies and records every call without touching the
//! network.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use crate::config::ServiceConfig;
use crate::error::TransportError;

/// Executes a single bounded-latency form POST.
///
/// Implementations make exactly one attempt and never retry.
pub trait RemoteClient {
    /// Posts `fields` form-encoded to `url` and returns the raw body.
    ///
    /// The HTTP status is not interpreted: an error page's body is returned
    /// like any other.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the call times out after `timeout_ms`,
    /// cannot connect, or the body cannot be read.
    fn post(
        &self,
        url: &str,
        fields: &[(&str, &str)],
        timeout_ms: u64,
    ) -> Result<String, TransportError>;
}

impl<C: RemoteClient + ?Sized> RemoteClient for &C {
    fn post(
        &self,
        url: &str,
        fields: &[(&str, &str)],
        timeout_ms: u64,
    ) -> Result<String, TransportError> {
        (**self).post(url, fields, timeout_ms)
    }
}

/// Blocking HTTP client backed by `reqwest`.
///
/// Certificate validation is on unless `accept_invalid_certs` is set in the
/// service configuration.
pub struct HttpRemoteClient {
    client: reqwest::blocking::Client,
}

impl HttpRemoteClient {
    /// Builds a client for the given service settings.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Other` if the TLS backend cannot be
    /// initialised.
    pub fn new(service: &ServiceConfig) -> Result<Self, TransportError> {
        if service.accept_invalid_certs {
            tracing::warn!(
                domain = %service.domain,
                "TLS certificate validation disabled for reputation service"
            );
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(service.timeout_ms))
            .danger_accept_invalid_certs(service.accept_invalid_certs)
            .build()
            .map_err(|error| TransportError::Other(error.to_string()))?;

        Ok(Self { client })
    }

    fn classify(error: reqwest::Error, timeout_ms: u64) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout { timeout_ms }
        } else if error.is_connect() {
            TransportError::Connect(error.to_string())
        } else {
            TransportError::Other(error.to_string())
        }
    }
}

impl fmt::Debug for HttpRemoteClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRemoteClient").finish_non_exhaustive()
    }
}

impl RemoteClient for HttpRemoteClient {
    fn post(
        &self,
        url: &str,
        fields: &[(&str, &str)],
        timeout_ms: u64,
    ) -> Result<String, TransportError> {
        let response = self
            .client
            .post(url)
            .form(fields)
            .timeout(Duration::from_millis(timeout_ms))
            .send()
            .map_err(|error| Self::classify(error, timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(
                %url,
                status = status.as_u16(),
                "reputation service answered with a non-success status"
            );
        }

        response
            .text()
            .map_err(|error| Self::classify(error, timeout_ms))
    }
}

/// Metadata about one call made through a [`ScriptedClient`].
#[derive(Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Target URL.
    pub url: String,
    /// Form fields in the order they were sent.
    pub fields: Vec<(String, String)>,
    /// Timeout requested by the caller.
    pub timeout_ms: u64,
}

impl RecordedCall {
    /// Returns the value of a form field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

// Key material stays out of test failure output.
impl fmt::Debug for RecordedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.fields.iter().map(|(key, _)| key.as_str()).collect();
        f.debug_struct("RecordedCall")
            .field("url", &self.url)
            .field("fields", &names)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// An offline [`RemoteClient`] that answers from a queue of canned replies.
///
/// When the queue is exhausted every further call fails with a connect
/// error, so an unexpected call is visible in assertions.
///
/// # Examples
///
/// ```
/// use admission_gate::{RemoteClient, ScriptedClient};
///
/// let client = ScriptedClient::new().reply("OK");
/// let body = client.post("https://api1.example.test/phpcurl", &[("ip", "192.0.2.1")], 1000);
///
/// assert_eq!(body.unwrap(), "OK");
/// assert_eq!(client.call_count(), 1);
/// assert_eq!(client.calls()[0].field("ip"), Some("192.0.2.1"));
/// ```
#[derive(Debug, Default)]
pub struct ScriptedClient {
    replies: RefCell<VecDeque<Result<String, TransportError>>>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl ScriptedClient {
    /// Creates a client with no replies queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful body.
    pub fn reply(self, body: impl Into<String>) -> Self {
        self.replies.borrow_mut().push_back(Ok(body.into()));
        self
    }

    /// Queues a transport failure.
    pub fn fail(self, error: TransportError) -> Self {
        self.replies.borrow_mut().push_back(Err(error));
        self
    }

    /// Returns the number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Returns a snapshot of all recorded calls.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }
}

impl RemoteClient for ScriptedClient {
    fn post(
        &self,
        url: &str,
        fields: &[(&str, &str)],
        timeout_ms: u64,
    ) -> Result<String, TransportError> {
        self.calls.borrow_mut().push(RecordedCall {
            url: url.to_string(),
            fields: fields
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
            timeout_ms,
        });

        self.replies.borrow_mut().pop_front().unwrap_or_else(|| {
            Err(TransportError::Connect(
                "no scripted reply queued".to_string(),
            ))
        })
    }
}
