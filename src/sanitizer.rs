use std::fmt;
use std::net::IpAddr;

use crate::ip::ClientAddr;
use crate::{Tainted, Verified};

/// Error returned when a tainted value fails validation.
///
/// The rejected input is never echoed back in the message.
///
/// # Examples
///
/// ```
/// use admission_gate::{SanitizationError, SanitizationErrorKind};
///
/// let error = SanitizationError::new(SanitizationErrorKind::MalformedInput, "not an address");
/// assert_eq!(error.kind(), SanitizationErrorKind::MalformedInput);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizationError {
    kind: SanitizationErrorKind,
    message: String,
}

impl SanitizationError {
    /// Creates a new sanitization error.
    pub fn new(kind: SanitizationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> SanitizationErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SanitizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sanitization failed ({}): {}", self.kind, self.message)
    }
}

impl std::error::Error for SanitizationError {}

/// Kind of sanitization error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizationErrorKind {
    /// Input is empty or contains only whitespace.
    Empty,
    /// Input format is malformed.
    MalformedInput,
}

impl fmt::Display for SanitizationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty input"),
            Self::MalformedInput => write!(f, "malformed input"),
        }
    }
}

/// Converts tainted values into verified values.
///
/// Implementations MUST only call `Verified::new_unchecked` after the
/// input has passed their rules, and MUST NOT leak the rejected input in
/// the returned error.
pub trait Sanitizer<T> {
    /// The verified type produced on success.
    type Output;

    /// Sanitizes a tainted value.
    ///
    /// # Errors
    ///
    /// Returns `SanitizationError` if the input fails validation.
    fn sanitize(&self, input: Tainted<T>) -> Result<Verified<Self::Output>, SanitizationError>;
}

/// Accepts strings that are a single syntactically valid IPv4 or IPv6 address.
///
/// Surrounding whitespace is ignored and the remaining text is kept as
/// sent. Lists such as `"a, b"`, ports, and bracketed forms are rejected.
///
/// # Examples
///
/// ```
/// use admission_gate::{IpSanitizer, Sanitizer, Tainted};
///
/// let ip = IpSanitizer.sanitize(Tainted::new(" 2001:db8::1 ".to_string())).unwrap();
/// assert_eq!(ip.as_ref().to_string(), "2001:db8::1");
///
/// assert!(IpSanitizer.sanitize(Tainted::new("10.0.0.1:8080".to_string())).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct IpSanitizer;

impl Sanitizer<String> for IpSanitizer {
    type Output = ClientAddr;

    fn sanitize(&self, input: Tainted<String>) -> Result<Verified<ClientAddr>, SanitizationError> {
        let raw = input.into_inner();
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(SanitizationError::new(
                SanitizationErrorKind::Empty,
                "address is empty",
            ));
        }

        trimmed
            .parse::<IpAddr>()
            .map(|addr| Verified::new_unchecked(ClientAddr::new(addr, trimmed)))
            .map_err(|_| {
                SanitizationError::new(
                    SanitizationErrorKind::MalformedInput,
                    "not a valid IPv4 or IPv6 address",
                )
            })
    }
}
