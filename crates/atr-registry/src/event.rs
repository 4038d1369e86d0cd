//! # Append-Only Event Log
//!
//! Every successful mutating operation emits exactly one event here. The
//! log is the public surface downstream indexers consume: records carry a
//! global monotone sequence number and are never rewritten or deleted.
//!
//! Because registries validate all preconditions before mutating state, an
//! event is appended only when the enclosing operation commits — a failed
//! operation leaves the log untouched.

use serde::{Deserialize, Serialize};

use atr_core::{Address, AttestationId, ModuleId, PortalId, SchemaId, Timestamp};

use crate::router::RegistryRole;

/// An event emitted by a registry operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    /// A schema was registered.
    SchemaRegistered {
        /// Content-derived id of the new schema.
        schema_id: SchemaId,
        /// Display name of the schema.
        name: String,
    },
    /// A validation module was registered.
    ModuleRegistered {
        /// Address identity of the new module.
        module_id: ModuleId,
        /// Display name of the module.
        name: String,
    },
    /// A portal was registered.
    PortalRegistered {
        /// Address identity of the new portal.
        portal_id: PortalId,
        /// Display name of the portal.
        name: String,
        /// The identity that owns the portal.
        owner: Address,
    },
    /// A portal was revoked and removed from the active set.
    PortalRevoked {
        /// The revoked portal.
        portal_id: PortalId,
    },
    /// An address was added to the issuer allowlist.
    IssuerAdded {
        /// The allowlisted address.
        issuer: Address,
    },
    /// An address was removed from the issuer allowlist.
    IssuerRemoved {
        /// The removed address.
        issuer: Address,
    },
    /// The permissive-mode flag changed.
    IsTestnetUpdated {
        /// The new flag value.
        is_testnet: bool,
    },
    /// A new attestation was committed to the ledger.
    AttestationRegistered {
        /// The assigned ledger id.
        attestation_id: AttestationId,
    },
    /// An attestation was superseded by a new one.
    AttestationReplaced {
        /// The superseded record.
        replaced_id: AttestationId,
        /// The new active record.
        replacement_id: AttestationId,
    },
    /// An attestation was terminally revoked.
    AttestationRevoked {
        /// The revoked record.
        attestation_id: AttestationId,
    },
    /// A registry role was bound to a new address.
    RouterRebound {
        /// The role whose binding changed.
        role: RegistryRole,
        /// The address now serving the role.
        address: Address,
    },
}

/// One entry of the append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Global monotone sequence number, 1-based.
    pub seq: u64,
    /// When the event was committed.
    pub timestamp: Timestamp,
    /// The event payload.
    pub event: RegistryEvent,
}

/// The append-only public log.
#[derive(Debug, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, returning its sequence number.
    pub fn emit(&mut self, event: RegistryEvent) -> u64 {
        let seq = self.records.len() as u64 + 1;
        self.records.push(EventRecord {
            seq,
            timestamp: Timestamp::now(),
            event,
        });
        seq
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Number of records in the log.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serialize the full log as a JSON array for indexer export.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(&self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotone() {
        let mut log = EventLog::new();
        let a = log.emit(RegistryEvent::IsTestnetUpdated { is_testnet: true });
        let b = log.emit(RegistryEvent::IsTestnetUpdated { is_testnet: false });
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(log.records()[0].seq, 1);
        assert_eq!(log.records()[1].seq, 2);
    }

    #[test]
    fn test_records_preserve_order() {
        let mut log = EventLog::new();
        log.emit(RegistryEvent::AttestationRegistered {
            attestation_id: AttestationId(1),
        });
        log.emit(RegistryEvent::AttestationRevoked {
            attestation_id: AttestationId(1),
        });
        assert_eq!(log.len(), 2);
        assert!(matches!(
            log.records()[0].event,
            RegistryEvent::AttestationRegistered { .. }
        ));
        assert!(matches!(
            log.records()[1].event,
            RegistryEvent::AttestationRevoked { .. }
        ));
    }

    #[test]
    fn test_json_export() {
        let mut log = EventLog::new();
        log.emit(RegistryEvent::IssuerAdded {
            issuer: Address::derive("issuer"),
        });
        let json = log.to_json().unwrap();
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["seq"], 1);
    }
}
