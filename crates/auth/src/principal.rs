use serde::{Deserialize, Serialize};

use cashbook_core::ActorId;

use crate::{Capability, Role};

/// An authenticated actor as resolved by the authentication subsystem.
///
/// Carries the roles and the directly granted capabilities; the gate decides
/// from these alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

impl Actor {
    pub fn new(id: impl Into<ActorId>) -> Self {
        Self {
            id: id.into(),
            roles: Vec::new(),
            capabilities: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        self
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(Role::is_admin)
    }
}
