//! Structured error types shared across the CCP4 bridge crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`Ccp4Error`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (paths, program names, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the CCP4 bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum Ccp4Error {
    /// Installation root or vendored binaries missing.
    #[error("install error: {0}")]
    Install(ErrorInfo),
    /// Installed suite older than the supported release.
    #[error("version error: {0}")]
    Version(ErrorInfo),
    /// Placeholder substitution failures.
    #[error("template error: {0}")]
    Template(ErrorInfo),
    /// Output ledger (SQLite) failures.
    #[error("ledger error: {0}")]
    Ledger(ErrorInfo),
    /// Density map container I/O failures.
    #[error("map error: {0}")]
    Map(ErrorInfo),
    /// Child process launch failures and non-zero exits.
    #[error("process error: {0}")]
    Process(ErrorInfo),
    /// Session state and run directory failures.
    #[error("session error: {0}")]
    Session(ErrorInfo),
    /// Serialization and configuration parsing errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl Ccp4Error {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            Ccp4Error::Install(info)
            | Ccp4Error::Version(info)
            | Ccp4Error::Template(info)
            | Ccp4Error::Ledger(info)
            | Ccp4Error::Map(info)
            | Ccp4Error::Process(info)
            | Ccp4Error::Session(info)
            | Ccp4Error::Serde(info) => info,
        }
    }

    /// Wraps an I/O failure on `path` as a session error.
    pub fn io(code: &str, path: &std::path::Path, err: std::io::Error) -> Self {
        Ccp4Error::Session(
            ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
        )
    }
}
