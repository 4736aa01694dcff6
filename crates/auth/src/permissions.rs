use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Capability identifier (e.g. `"ledger-access"`).
///
/// Capabilities are opaque strings so new ones can be granted without
/// touching this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(Cow<'static, str>);

impl Capability {
    /// Required for every movement and attachment operation, reads included.
    pub const LEDGER_ACCESS: Capability = Capability(Cow::Borrowed("ledger-access"));

    /// Required to read the audit trail.
    pub const AUDIT_READ: Capability = Capability(Cow::Borrowed("audit-read"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
