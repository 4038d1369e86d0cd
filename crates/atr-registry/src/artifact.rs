//! # Installed Artifact Store
//!
//! Models "deployed executable code" at an address: the implementations
//! behind module and portal identities. Registration of a module or portal
//! requires that its address resolves to an installed artifact of the
//! right capability; an address with no artifact fails the
//! `*AddressInvalid` precondition.

use std::collections::HashMap;
use std::sync::Arc;

use atr_core::{Address, PortalContract, ValidationModule};

/// An artifact installed at an address.
#[derive(Clone)]
pub enum InstalledArtifact {
    /// A validation-module implementation.
    Module(Arc<dyn ValidationModule>),
    /// A portal implementation.
    Portal(Arc<dyn PortalContract>),
}

impl std::fmt::Debug for InstalledArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Module(_) => f.write_str("InstalledArtifact::Module"),
            Self::Portal(_) => f.write_str("InstalledArtifact::Portal"),
        }
    }
}

/// Address-keyed table of installed artifacts.
#[derive(Debug, Default)]
pub struct CodeStore {
    artifacts: HashMap<Address, InstalledArtifact>,
}

impl CodeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a validation module at `address`.
    pub fn install_module(&mut self, address: Address, module: Arc<dyn ValidationModule>) {
        self.artifacts.insert(address, InstalledArtifact::Module(module));
    }

    /// Install a portal implementation at `address`.
    pub fn install_portal(&mut self, address: Address, portal: Arc<dyn PortalContract>) {
        self.artifacts.insert(address, InstalledArtifact::Portal(portal));
    }

    /// Remove the artifact at `address`, if any.
    ///
    /// Used to roll back a default-portal deployment whose registration
    /// step fails, keeping the deploy-and-register path all-or-nothing.
    pub fn remove(&mut self, address: Address) {
        self.artifacts.remove(&address);
    }

    /// Whether any artifact is installed at `address`.
    pub fn has_code(&self, address: Address) -> bool {
        self.artifacts.contains_key(&address)
    }

    /// The module installed at `address`, if the artifact is a module.
    pub fn module(&self, address: Address) -> Option<&Arc<dyn ValidationModule>> {
        match self.artifacts.get(&address) {
            Some(InstalledArtifact::Module(m)) => Some(m),
            _ => None,
        }
    }

    /// The portal installed at `address`, if the artifact is a portal.
    pub fn portal(&self, address: Address) -> Option<&Arc<dyn PortalContract>> {
        match self.artifacts.get(&address) {
            Some(InstalledArtifact::Portal(p)) => Some(p),
            _ => None,
        }
    }
}
