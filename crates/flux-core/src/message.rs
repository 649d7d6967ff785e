//! User-facing flash messages

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a flash message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Notice,
    Info,
    Ok,
    Warning,
    Error,
}

/// A message shown to the editor after the request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub title: String,
    pub body: String,
    pub severity: Severity,
    /// Keep the message in the session so it survives a redirect
    pub store_in_session: bool,
}

impl FlashMessage {
    pub fn new(title: impl Into<String>, body: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            severity,
            store_in_session: false,
        }
    }

    /// Error message kept across redirects
    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            store_in_session: true,
            ..Self::new(title, body, Severity::Error)
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for FlashMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}: {}", self.severity, self.title, self.body)
    }
}
