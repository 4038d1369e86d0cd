//! # Attestation Payloads and Operation Context
//!
//! The payload shape a caller submits when issuing or replacing an
//! attestation, the operation-kind tag, and the context handed to
//! validation modules.
//!
//! The operation kind is passed to modules **as data**, not through
//! separate method families. A module that applies operation-specific
//! policy inspects `ModuleContext::operation`; a module that does not can
//! ignore the context entirely. The legacy call shape (value only, no
//! caller identity) is simply a context with the optional fields unset.

use serde::{Deserialize, Serialize};

use crate::identity::{Address, SchemaId};
use crate::temporal::Timestamp;

/// The caller-supplied content of an attestation.
///
/// `subject` and `attestation_data` are opaque bytes: the stack governs
/// schema identity and structural metadata but does not prescribe a claim
/// encoding language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationPayload {
    /// The schema this attestation claims conformance to.
    pub schema_id: SchemaId,
    /// When the attestation expires, if ever.
    pub expiration_date: Option<Timestamp>,
    /// The subject the claim is issued against.
    pub subject: Vec<u8>,
    /// The encoded claim content.
    pub attestation_data: Vec<u8>,
}

/// The semantic kind of a portal operation.
///
/// Forwarded to validation modules and lifecycle hooks so they can apply
/// operation-specific policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// Issue a single new attestation.
    Attest,
    /// Supersede an existing attestation with a new one.
    Replace,
    /// Issue a batch of attestations as one atomic unit.
    BulkAttest,
    /// Supersede a batch of attestations as one atomic unit.
    BulkReplace,
    /// Terminally invalidate a single attestation.
    Revoke,
    /// Terminally invalidate a batch of attestations as one atomic unit.
    BulkRevoke,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Attest => "ATTEST",
            Self::Replace => "REPLACE",
            Self::BulkAttest => "BULK_ATTEST",
            Self::BulkReplace => "BULK_REPLACE",
            Self::Revoke => "REVOKE",
            Self::BulkRevoke => "BULK_REVOKE",
        };
        f.write_str(s)
    }
}

/// Context forwarded to every module in a validation chain.
///
/// The same context instance is handed to each module in the chain; the
/// transferred value is forwarded whole, not split across modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleContext {
    /// Value transferred with the operation.
    pub value: u128,
    /// The identity that invoked the portal, when forwarded.
    pub caller: Option<Address>,
    /// The identity recorded as attester, when forwarded.
    pub attester: Option<Address>,
    /// The semantic operation being validated, when forwarded.
    pub operation: Option<OperationKind>,
}

impl ModuleContext {
    /// The legacy call shape: value only, no identity or operation tag.
    pub fn value_only(value: u128) -> Self {
        Self {
            value,
            caller: None,
            attester: None,
            operation: None,
        }
    }

    /// The full call shape: caller identity, attester identity, and
    /// operation kind forwarded alongside the value.
    pub fn full(value: u128, caller: Address, attester: Address, operation: OperationKind) -> Self {
        Self {
            value,
            caller: Some(caller),
            attester: Some(attester),
            operation: Some(operation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::ContentDigest;

    fn schema_id() -> SchemaId {
        SchemaId(ContentDigest::new([7u8; 32]))
    }

    #[test]
    fn test_payload_serde_roundtrip() {
        let payload = AttestationPayload {
            schema_id: schema_id(),
            expiration_date: None,
            subject: b"did:example:123".to_vec(),
            attestation_data: b"\x01\x02".to_vec(),
        };
        let json = serde_json::to_string(&payload).unwrap();
        let parsed: AttestationPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(payload, parsed);
    }

    #[test]
    fn test_value_only_context_has_no_identity() {
        let ctx = ModuleContext::value_only(42);
        assert_eq!(ctx.value, 42);
        assert!(ctx.caller.is_none());
        assert!(ctx.attester.is_none());
        assert!(ctx.operation.is_none());
    }

    #[test]
    fn test_full_context_carries_operation_tag() {
        let caller = Address::derive("caller");
        let ctx = ModuleContext::full(0, caller, caller, OperationKind::BulkReplace);
        assert_eq!(ctx.operation, Some(OperationKind::BulkReplace));
        assert_eq!(ctx.caller, Some(caller));
    }

    #[test]
    fn test_operation_kind_display() {
        assert_eq!(OperationKind::Attest.to_string(), "ATTEST");
        assert_eq!(OperationKind::Replace.to_string(), "REPLACE");
        assert_eq!(OperationKind::BulkAttest.to_string(), "BULK_ATTEST");
        assert_eq!(OperationKind::BulkReplace.to_string(), "BULK_REPLACE");
        assert_eq!(OperationKind::Revoke.to_string(), "REVOKE");
        assert_eq!(OperationKind::BulkRevoke.to_string(), "BULK_REVOKE");
    }
}
