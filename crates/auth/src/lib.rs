//! `cashbook-auth`: the permission gate in front of the ledger.
//!
//! Authentication happens elsewhere; this crate only decides whether an
//! already-authenticated actor may use a capability. It is decoupled from
//! HTTP and storage.

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, PermissionGate, RolePolicyGate};
pub use permissions::Capability;
pub use principal::Actor;
pub use roles::Role;
