//! Client address extraction from request-origin signals.

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;

use crate::{IpSanitizer, Sanitizer, Tainted};

/// A request-origin signal, listed in the order it is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OriginSignal {
    /// Peer address reported by the web server.
    RemoteAddr,
    /// `Client-IP` header.
    ClientIp,
    /// `X-Forwarded-For` header.
    XForwardedFor,
    /// `X-Forwarded` header.
    XForwarded,
    /// `Forwarded-For` header.
    ForwardedFor,
    /// `Forwarded` header.
    Forwarded,
}

impl OriginSignal {
    /// All signals, highest priority first.
    pub const PRIORITY: [OriginSignal; 6] = [
        OriginSignal::RemoteAddr,
        OriginSignal::ClientIp,
        OriginSignal::XForwardedFor,
        OriginSignal::XForwarded,
        OriginSignal::ForwardedFor,
        OriginSignal::Forwarded,
    ];

    /// The CGI server-variable name carrying this signal.
    pub fn server_var(self) -> &'static str {
        match self {
            OriginSignal::RemoteAddr => "REMOTE_ADDR",
            OriginSignal::ClientIp => "HTTP_CLIENT_IP",
            OriginSignal::XForwardedFor => "HTTP_X_FORWARDED_FOR",
            OriginSignal::XForwarded => "HTTP_X_FORWARDED",
            OriginSignal::ForwardedFor => "HTTP_FORWARDED_FOR",
            OriginSignal::Forwarded => "HTTP_FORWARDED",
        }
    }

    /// Maps a server-variable name back to a signal.
    ///
    /// Unrelated variables return `None`.
    pub fn from_server_var(name: &str) -> Option<Self> {
        Self::PRIORITY
            .into_iter()
            .find(|signal| signal.server_var().eq_ignore_ascii_case(name))
    }
}

/// The untrusted origin signals observed on one request.
#[derive(Debug, Clone, Default)]
pub struct OriginSignals {
    values: HashMap<OriginSignal, Tainted<String>>,
}

impl OriginSignals {
    /// Creates an empty signal set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a signal value, replacing any earlier one.
    pub fn insert(&mut self, signal: OriginSignal, value: impl Into<String>) {
        self.values.insert(signal, Tainted::new(value.into()));
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with(mut self, signal: OriginSignal, value: impl Into<String>) -> Self {
        self.insert(signal, value);
        self
    }

    /// Collects signals from CGI-style server variables, ignoring unrelated ones.
    pub fn from_server_vars<'a, I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut signals = Self::new();
        for (name, value) in vars {
            if let Some(signal) = OriginSignal::from_server_var(name) {
                signals.insert(signal, value);
            }
        }
        signals
    }

    /// Returns the number of signals present.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no signals were recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn get(&self, signal: OriginSignal) -> Option<&Tainted<String>> {
        self.values.get(&signal)
    }
}

/// A validated client address and the text it was read from.
///
/// The text is the signal value with surrounding whitespace removed, so an
/// IPv6 address is reported in whatever notation the client used.
///
/// # Examples
///
/// ```
/// use admission_gate::{IpSanitizer, Sanitizer, Tainted};
///
/// let addr = IpSanitizer
///     .sanitize(Tainted::new("2001:DB8:0:0::1".to_string()))
///     .unwrap()
///     .into_inner();
///
/// assert_eq!(addr.as_str(), "2001:DB8:0:0::1");
/// assert_eq!(addr.addr().to_string(), "2001:db8::1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddr {
    addr: IpAddr,
    text: String,
}

impl ClientAddr {
    pub(crate) fn new(addr: IpAddr, text: impl Into<String>) -> Self {
        Self {
            addr,
            text: text.into(),
        }
    }

    /// Returns the parsed address.
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    /// Returns the address as the client sent it.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl From<IpAddr> for ClientAddr {
    fn from(addr: IpAddr) -> Self {
        Self::new(addr, addr.to_string())
    }
}

impl fmt::Display for ClientAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// The client address reported to the reputation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientIp {
    /// A syntactically valid address taken from the highest-priority signal.
    Addr(ClientAddr),
    /// No signal carried a valid address.
    Unknown,
}

impl ClientIp {
    /// Returns the address, if one was found.
    pub fn addr(&self) -> Option<IpAddr> {
        match self {
            ClientIp::Addr(addr) => Some(addr.addr()),
            ClientIp::Unknown => None,
        }
    }
}

impl From<IpAddr> for ClientIp {
    fn from(addr: IpAddr) -> Self {
        ClientIp::Addr(addr.into())
    }
}

impl fmt::Display for ClientIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientIp::Addr(addr) => addr.fmt(f),
            ClientIp::Unknown => f.write_str("UNKNOWN"),
        }
    }
}

/// Picks the client address from `signals`.
///
/// Signals are scanned in [`OriginSignal::PRIORITY`] order and the first one
/// that sanitizes to a single IPv4 or IPv6 address wins. Never fails.
///
/// # Examples
///
/// ```
/// use admission_gate::{extract_client_ip, OriginSignal, OriginSignals};
///
/// let signals = OriginSignals::new()
///     .with(OriginSignal::RemoteAddr, "not-an-ip")
///     .with(OriginSignal::XForwardedFor, "203.0.113.7");
///
/// assert_eq!(extract_client_ip(&signals).to_string(), "203.0.113.7");
/// assert_eq!(extract_client_ip(&OriginSignals::new()).to_string(), "UNKNOWN");
/// ```
pub fn extract_client_ip(signals: &OriginSignals) -> ClientIp {
    OriginSignal::PRIORITY
        .into_iter()
        .filter_map(|signal| signals.get(signal))
        .find_map(|value| IpSanitizer.sanitize(value.clone()).ok())
        .map(|verified| ClientIp::Addr(verified.into_inner()))
        .unwrap_or(ClientIp::Unknown)
}
