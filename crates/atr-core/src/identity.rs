//! # Domain Identity Newtypes
//!
//! Newtype wrappers for every identifier in the Attestation Registry
//! Stack. You cannot pass a `ModuleId` where a `PortalId` is expected, and
//! ledger ids cannot be confused with content-derived schema ids.
//!
//! ## Security Invariant
//!
//! Type-level distinction between identifier namespaces prevents
//! cross-namespace confusion, where one kind of identifier is substituted
//! for another to slip past an access-control check.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::digest::ContentDigest;

/// An account or artifact address in the execution environment.
///
/// Both caller identities and deployed artifacts (modules, portals) are
/// addressed this way. The execution environment verifies the caller
/// address on every mutating call; no separate credential is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    /// Create an address from raw bytes.
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derive a stable address from a label.
    ///
    /// Truncated SHA-256 of the label bytes. Used for well-known registry
    /// role addresses and deterministic test fixtures.
    pub fn derive(label: &str) -> Self {
        let hash = Sha256::digest(label.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[..20]);
        Self(bytes)
    }

    /// Mint a fresh random address.
    ///
    /// Used when deploying a default portal instance.
    pub fn random() -> Self {
        Self(rand::random())
    }

    /// Access the raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x")?;
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// Content-derived identifier of a claim schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaId(pub ContentDigest);

/// Identifier of a registered validation module (its deployed address).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub Address);

/// Identifier of a registered portal (its deployed address).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortalId(pub Address);

/// Ledger-assigned attestation identifier.
///
/// Strictly increasing, 1-based, never reused — including after revoke or
/// replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttestationId(pub u64);

impl ModuleId {
    /// The module's deployed address.
    pub fn address(&self) -> Address {
        self.0
    }
}

impl PortalId {
    /// The portal's deployed address.
    pub fn address(&self) -> Address {
        self.0
    }
}

impl AttestationId {
    /// The raw counter value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SchemaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "schema:{}", self.0)
    }
}

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "module:{}", self.0)
    }
}

impl std::fmt::Display for PortalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "portal:{}", self.0)
    }
}

impl std::fmt::Display for AttestationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "attestation:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_is_stable() {
        assert_eq!(Address::derive("issuer-a"), Address::derive("issuer-a"));
        assert_ne!(Address::derive("issuer-a"), Address::derive("issuer-b"));
    }

    #[test]
    fn test_address_display_is_hex() {
        let addr = Address::new([0xab; 20]);
        let s = addr.to_string();
        assert!(s.starts_with("0x"));
        assert_eq!(s.len(), 2 + 40);
        assert_eq!(&s[2..4], "ab");
    }

    #[test]
    fn test_random_addresses_differ() {
        assert_ne!(Address::random(), Address::random());
    }

    #[test]
    fn test_attestation_id_ordering() {
        assert!(AttestationId(1) < AttestationId(2));
        assert_eq!(AttestationId(7).value(), 7);
    }

    #[test]
    fn test_display_prefixes() {
        let addr = Address::derive("x");
        assert!(ModuleId(addr).to_string().starts_with("module:0x"));
        assert!(PortalId(addr).to_string().starts_with("portal:0x"));
        assert_eq!(AttestationId(3).to_string(), "attestation:3");
    }

    #[test]
    fn test_serde_roundtrip() {
        let addr = Address::derive("roundtrip");
        let json = serde_json::to_string(&addr).unwrap();
        let parsed: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, parsed);
    }
}
