use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;

use crate::{Actor, Capability, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: actor '{actor}' lacks capability '{capability}'")]
    Forbidden { actor: String, capability: String },
}

impl From<AuthzError> for cashbook_core::DomainError {
    fn from(value: AuthzError) -> Self {
        cashbook_core::DomainError::unauthorized(value.to_string())
    }
}

/// Authorization contract consumed by the ledger boundary.
///
/// - No IO
/// - No panics
/// - No ledger logic (pure policy check)
pub trait PermissionGate: Send + Sync {
    fn check(&self, actor: &Actor, capability: &Capability) -> bool;

    /// Like [`check`](Self::check), but as a `Result` for `?` at call sites.
    fn require(&self, actor: &Actor, capability: &Capability) -> Result<(), AuthzError> {
        if self.check(actor, capability) {
            Ok(())
        } else {
            tracing::warn!(actor = %actor.id, capability = %capability, "capability check denied");
            Err(AuthzError::Forbidden {
                actor: actor.id.to_string(),
                capability: capability.to_string(),
            })
        }
    }
}

impl<G> PermissionGate for std::sync::Arc<G>
where
    G: PermissionGate + ?Sized,
{
    fn check(&self, actor: &Actor, capability: &Capability) -> bool {
        (**self).check(actor, capability)
    }
}

/// Gate that grants a capability when the actor is an admin, holds the
/// capability directly, or holds a role mapped to it.
#[derive(Debug, Clone, Default)]
pub struct RolePolicyGate {
    role_capabilities: HashMap<Role, HashSet<Capability>>,
}

impl RolePolicyGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `role` to `capability` in addition to any existing mapping.
    pub fn grant(mut self, role: Role, capability: Capability) -> Self {
        self.role_capabilities
            .entry(role)
            .or_default()
            .insert(capability);
        self
    }

    /// Explain the decision for `actor` and `capability`.
    pub fn explain(&self, actor: &Actor, capability: &Capability) -> Decision {
        if actor.is_admin() {
            return Decision::granted(capability, "actor holds the admin role");
        }

        if actor.capabilities.contains(capability) {
            return Decision::granted(capability, "capability granted directly to the actor");
        }

        let via_role = actor.roles.iter().find(|role| {
            self.role_capabilities
                .get(*role)
                .is_some_and(|caps| caps.contains(capability))
        });

        match via_role {
            Some(role) => Decision::granted(capability, format!("capability granted by role '{role}'")),
            None => Decision {
                capability: capability.to_string(),
                granted: false,
                reason: format!(
                    "actor '{}' has no role or direct grant for '{capability}'",
                    actor.id
                ),
            },
        }
    }
}

impl PermissionGate for RolePolicyGate {
    fn check(&self, actor: &Actor, capability: &Capability) -> bool {
        self.explain(actor, capability).granted
    }
}

/// Auditable explanation of an authorization decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub capability: String,
    pub granted: bool,
    pub reason: String,
}

impl Decision {
    fn granted(capability: &Capability, reason: impl Into<String>) -> Self {
        Self {
            capability: capability.to_string(),
            granted: true,
            reason: reason.into(),
        }
    }
}
