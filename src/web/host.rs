//! Side effects the gate asks the host platform to perform.

use std::fmt;

/// Severity of an operator-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    /// Something was changed on the operator's behalf.
    Warning,
    /// An action failed.
    Error,
}

impl fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageLevel::Warning => write!(f, "warning"),
            MessageLevel::Error => write!(f, "error"),
        }
    }
}

/// The host page/response being assembled for the current request.
pub trait PageHost {
    /// Adds a script reference to the page, loaded with `async`.
    fn add_async_script(&mut self, url: &str);

    /// Replaces the response with a redirect to `url`.
    fn redirect(&mut self, url: &str);

    /// Queues a message for the operator's next page view.
    fn enqueue_message(&mut self, level: MessageLevel, text: &str);
}

/// A [`PageHost`] that records every call.
///
/// # Examples
///
/// ```
/// use admission_gate::web::{MessageLevel, PageHost, RecordingHost};
///
/// let mut host = RecordingHost::default();
/// host.redirect("https://example.test/stop");
/// host.enqueue_message(MessageLevel::Warning, "disabled");
///
/// assert_eq!(host.redirects, vec!["https://example.test/stop".to_string()]);
/// assert_eq!(host.messages[0].0, MessageLevel::Warning);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingHost {
    /// Async script URLs added, in order.
    pub scripts: Vec<String>,
    /// Redirect targets issued, in order.
    pub redirects: Vec<String>,
    /// Operator messages queued, in order.
    pub messages: Vec<(MessageLevel, String)>,
}

impl PageHost for RecordingHost {
    fn add_async_script(&mut self, url: &str) {
        self.scripts.push(url.to_string());
    }

    fn redirect(&mut self, url: &str) {
        self.redirects.push(url.to_string());
    }

    fn enqueue_message(&mut self, level: MessageLevel, text: &str) {
        self.messages.push((level, text.to_string()));
    }
}
