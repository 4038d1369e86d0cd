//! # Router
//!
//! Role-to-address resolution table. Components that need to name a peer
//! look up the role here instead of hard-coding an address, so a registry
//! can be rebound (upgraded) without touching its callers. Rebinding a
//! role is an ordinary mutating operation and emits `RouterRebound`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use atr_core::Address;

use crate::event::{EventLog, RegistryEvent};

/// The well-known roles the router resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistryRole {
    /// The schema registry.
    SchemaRegistry,
    /// The module registry.
    ModuleRegistry,
    /// The portal registry.
    PortalRegistry,
    /// The attestation ledger.
    AttestationRegistry,
}

impl std::fmt::Display for RegistryRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RegistryRole::SchemaRegistry => "SCHEMA_REGISTRY",
            RegistryRole::ModuleRegistry => "MODULE_REGISTRY",
            RegistryRole::PortalRegistry => "PORTAL_REGISTRY",
            RegistryRole::AttestationRegistry => "ATTESTATION_REGISTRY",
        };
        f.write_str(name)
    }
}

/// Error during role resolution.
#[derive(Error, Debug)]
pub enum RouterError {
    /// No address is bound to the role.
    #[error("no address bound for role {0}")]
    RoleUnresolved(RegistryRole),
}

/// Role-to-address resolution table.
#[derive(Debug, Default)]
pub struct Router {
    bindings: HashMap<RegistryRole, Address>,
}

impl Router {
    /// Create an empty table with no bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `role` to `address`, replacing any previous binding.
    pub fn bind(&mut self, events: &mut EventLog, role: RegistryRole, address: Address) {
        self.bindings.insert(role, address);
        events.emit(RegistryEvent::RouterRebound { role, address });
        tracing::info!(%role, %address, "router role bound");
    }

    /// Resolve the address currently serving `role`.
    pub fn resolve(&self, role: RegistryRole) -> Result<Address, RouterError> {
        self.bindings
            .get(&role)
            .copied()
            .ok_or(RouterError::RoleUnresolved(role))
    }

    /// Whether `role` has a binding.
    pub fn is_bound(&self, role: RegistryRole) -> bool {
        self.bindings.contains_key(&role)
    }
}
