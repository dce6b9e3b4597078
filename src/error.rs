use std::fmt;

use thiserror::Error;

/// Errors that can occur in the admission gate crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Credential resolution failed; the triggering save must be refused.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The outbound call could not be completed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The configuration store refused a write.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration text could not be parsed.
    #[error("invalid gate configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("cannot read gate configuration: {0}")]
    ConfigIo(#[from] std::io::Error),
}

/// Which half of the key pair a message refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// The client-visible front key.
    Front,
    /// The server-only back key.
    Back,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Front => write!(f, "front"),
            KeyKind::Back => write!(f, "back"),
        }
    }
}

/// Reasons a front/back key pair could not be resolved to a site.
///
/// Every variant is terminal for the configuration edit that triggered it.
/// The `Display` text is shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// A key is empty; no remote call was made.
    #[error("Empty {which} key.")]
    EmptyCredential {
        /// The missing key.
        which: KeyKind,
    },

    /// The registration endpoint could not be reached.
    #[error("Could not connect to the reputation service: {reason}")]
    ConnectionFailed {
        /// Transport-level failure text.
        reason: String,
    },

    /// The reputation service does not recognise the key pair.
    #[error("The reputation service rejected the supplied keys.")]
    CredentialsRejected,

    /// The registration endpoint answered with something unusable.
    #[error("Unexpected response from the reputation service: {reason}")]
    MalformedResponse {
        /// What was wrong with the body.
        reason: String,
    },
}

/// A transport-level failure of a single outbound POST.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The call did not finish within the configured timeout.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// The timeout that elapsed.
        timeout_ms: u64,
    },

    /// The remote endpoint could not be connected to.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other failure (TLS, malformed URL, body read, client setup).
    #[error("transport failure: {0}")]
    Other(String),
}

/// A configuration store write failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("configuration store error: {message}")]
pub struct StoreError {
    /// Store-specific failure text.
    pub message: String,
}

impl StoreError {
    /// Creates a store error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
