//! # Attestation Registry — The Ledger
//!
//! Assigns identity to every attestation, stores the records, and
//! implements the replace and revoke transitions. The ledger is
//! append-only: a record is never deleted, revocation sets a flag, and
//! replacement creates a new record while back-linking the superseded one.
//!
//! ## State Machine
//!
//! ```text
//! Active ──revoke()──▶ Revoked   (terminal)
//! Active ──replace()─▶ Replaced  (terminal for that version; a new
//!                                 Active record is created)
//! ```
//!
//! No transition leaves `Revoked` or `Replaced`.
//!
//! ## Id Discipline
//!
//! Ids are strictly increasing, 1-based, and never reused — including
//! after revoke or replace. For bulk operations ids are assigned only at
//! batch commit, after every item's preconditions have been checked, so
//! no module or caller can observe a not-yet-final id mid-batch.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use atr_core::{Address, AttestationId, AttestationPayload, PortalId, SchemaId, Timestamp};

use crate::event::{EventLog, RegistryEvent};
use crate::portal::PortalRegistry;
use crate::schema::SchemaRegistry;
use crate::MAX_BATCH_SIZE;

/// A ledger record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    /// Ledger-assigned identity.
    pub id: AttestationId,
    /// The schema the claim conforms to.
    pub schema_id: SchemaId,
    /// The portal that committed the record.
    pub portal_id: PortalId,
    /// The identity recorded as issuer.
    pub attester: Address,
    /// The subject the claim is issued against.
    pub subject: Vec<u8>,
    /// The encoded claim content.
    pub attestation_data: Vec<u8>,
    /// When the record was committed.
    pub attested_date: Timestamp,
    /// When the attestation expires, if ever.
    pub expiration_date: Option<Timestamp>,
    /// Whether the attestation has been terminally revoked.
    pub revoked: bool,
    /// When the attestation was revoked, if it was.
    pub revocation_date: Option<Timestamp>,
    /// The record that superseded this one, if any.
    pub replaced_by: Option<AttestationId>,
}

/// Errors raised by ledger preconditions.
#[derive(Error, Debug)]
pub enum AttestationError {
    /// No attestation with this id exists.
    #[error("attestation {0} not found")]
    AttestationNotFound(AttestationId),

    /// The attestation is already revoked; revoked records are terminal.
    #[error("attestation {0} is already revoked")]
    AttestationAlreadyRevoked(AttestationId),

    /// The attestation was already superseded; replaced records are
    /// terminal for that version.
    #[error("attestation {0} was already replaced")]
    AttestationAlreadyReplaced(AttestationId),

    /// The owning portal does not permit revocation.
    #[error("portal {0} is not revocable")]
    PortalNotRevocable(PortalId),

    /// The committing portal is not registered.
    #[error("portal {0} is not a registered portal")]
    OnlyPortal(PortalId),

    /// Only the portal that issued an attestation may revoke it.
    #[error("portal {0} did not issue this attestation")]
    OnlyAttestingPortal(PortalId),

    /// The payload references an unregistered schema.
    #[error("schema {0} is not registered")]
    SchemaNotRegistered(SchemaId),

    /// The batch exceeded the resource bound.
    #[error("batch of {size} items exceeds the maximum batch size {max}")]
    BatchTooLarge {
        /// Items submitted.
        size: usize,
        /// The bound.
        max: usize,
    },
}

/// The append-only attestation ledger.
#[derive(Debug, Default)]
pub struct AttestationRegistry {
    attestations: BTreeMap<AttestationId, Attestation>,
    /// Last assigned id; the next record gets `counter + 1`.
    counter: u64,
}

impl AttestationRegistry {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// The last assigned attestation id (0 before the first commit).
    pub fn attestation_id_counter(&self) -> u64 {
        self.counter
    }

    /// Number of records in the ledger.
    pub fn attestation_count(&self) -> usize {
        self.attestations.len()
    }

    /// Commit a single new attestation.
    ///
    /// # Errors
    ///
    /// - `OnlyPortal` if `portal_id` is not a registered portal.
    /// - `SchemaNotRegistered` if the payload's schema is unknown.
    pub fn attest(
        &mut self,
        schemas: &SchemaRegistry,
        portals: &PortalRegistry,
        events: &mut EventLog,
        portal_id: PortalId,
        payload: &AttestationPayload,
        attester: Address,
    ) -> Result<AttestationId, AttestationError> {
        self.check_portal(portals, portal_id)?;
        self.check_schema(schemas, payload)?;
        Ok(self.commit(events, portal_id, payload, attester))
    }

    /// Commit a batch of new attestations as one atomic unit.
    ///
    /// Every payload is validated before the first record is written; ids
    /// are assigned only at commit.
    pub fn bulk_attest(
        &mut self,
        schemas: &SchemaRegistry,
        portals: &PortalRegistry,
        events: &mut EventLog,
        portal_id: PortalId,
        payloads: &[AttestationPayload],
        attester: Address,
    ) -> Result<Vec<AttestationId>, AttestationError> {
        self.check_batch(payloads.len())?;
        self.check_portal(portals, portal_id)?;
        for payload in payloads {
            self.check_schema(schemas, payload)?;
        }
        Ok(payloads
            .iter()
            .map(|payload| self.commit(events, portal_id, payload, attester))
            .collect())
    }

    /// Supersede an attestation with a new record.
    ///
    /// The old record is preserved and back-linked through `replaced_by`;
    /// the new record is active.
    ///
    /// # Errors
    ///
    /// - `OnlyPortal`, `SchemaNotRegistered` as for [`attest`](Self::attest).
    /// - `AttestationNotFound` if the target is missing.
    /// - `AttestationAlreadyRevoked` / `AttestationAlreadyReplaced` if the
    ///   target is terminal.
    pub fn replace(
        &mut self,
        schemas: &SchemaRegistry,
        portals: &PortalRegistry,
        events: &mut EventLog,
        portal_id: PortalId,
        attestation_id: AttestationId,
        payload: &AttestationPayload,
        attester: Address,
    ) -> Result<AttestationId, AttestationError> {
        self.check_portal(portals, portal_id)?;
        self.check_schema(schemas, payload)?;
        self.check_replaceable(attestation_id)?;

        let new_id = self.commit(events, portal_id, payload, attester);
        // check_replaceable guarantees the record exists.
        if let Some(old) = self.attestations.get_mut(&attestation_id) {
            old.replaced_by = Some(new_id);
        }
        events.emit(RegistryEvent::AttestationReplaced {
            replaced_id: attestation_id,
            replacement_id: new_id,
        });
        tracing::info!(
            replaced = %attestation_id,
            replacement = %new_id,
            "attestation replaced"
        );
        Ok(new_id)
    }

    /// Supersede a batch of attestations as one atomic unit.
    ///
    /// All targets are checked — including duplicates within the batch —
    /// before any record is written.
    pub fn bulk_replace(
        &mut self,
        schemas: &SchemaRegistry,
        portals: &PortalRegistry,
        events: &mut EventLog,
        portal_id: PortalId,
        items: &[(AttestationId, AttestationPayload)],
        attester: Address,
    ) -> Result<Vec<AttestationId>, AttestationError> {
        self.check_batch(items.len())?;
        self.check_portal(portals, portal_id)?;
        let mut seen = HashSet::new();
        for (attestation_id, payload) in items {
            self.check_schema(schemas, payload)?;
            self.check_replaceable(*attestation_id)?;
            if !seen.insert(*attestation_id) {
                return Err(AttestationError::AttestationAlreadyReplaced(*attestation_id));
            }
        }

        let mut new_ids = Vec::with_capacity(items.len());
        for (attestation_id, payload) in items {
            let new_id = self.commit(events, portal_id, payload, attester);
            if let Some(old) = self.attestations.get_mut(attestation_id) {
                old.replaced_by = Some(new_id);
            }
            events.emit(RegistryEvent::AttestationReplaced {
                replaced_id: *attestation_id,
                replacement_id: new_id,
            });
            new_ids.push(new_id);
        }
        Ok(new_ids)
    }

    /// Terminally revoke an attestation.
    ///
    /// # Errors
    ///
    /// - `OnlyPortal` if the committing portal is not registered.
    /// - `AttestationNotFound` if the target is missing.
    /// - `AttestationAlreadyRevoked` / `AttestationAlreadyReplaced` if the
    ///   target is terminal.
    /// - `OnlyAttestingPortal` if the target was issued through another
    ///   portal.
    /// - `PortalNotRevocable` if the issuing portal forbids revocation.
    pub fn revoke(
        &mut self,
        portals: &PortalRegistry,
        events: &mut EventLog,
        portal_id: PortalId,
        attestation_id: AttestationId,
    ) -> Result<(), AttestationError> {
        self.check_portal(portals, portal_id)?;
        self.check_revocable(portals, portal_id, attestation_id)?;
        self.mark_revoked(events, attestation_id);
        Ok(())
    }

    /// Terminally revoke a batch of attestations as one atomic unit.
    ///
    /// Every id must independently satisfy the single-item preconditions
    /// (duplicates within the batch count as double revocation) or the
    /// whole call aborts.
    pub fn bulk_revoke(
        &mut self,
        portals: &PortalRegistry,
        events: &mut EventLog,
        portal_id: PortalId,
        attestation_ids: &[AttestationId],
    ) -> Result<(), AttestationError> {
        self.check_batch(attestation_ids.len())?;
        self.check_portal(portals, portal_id)?;
        let mut seen = HashSet::new();
        for attestation_id in attestation_ids {
            self.check_revocable(portals, portal_id, *attestation_id)?;
            if !seen.insert(*attestation_id) {
                return Err(AttestationError::AttestationAlreadyRevoked(*attestation_id));
            }
        }
        for attestation_id in attestation_ids {
            self.mark_revoked(events, *attestation_id);
        }
        Ok(())
    }

    /// Look up a record by id.
    pub fn get_attestation_by_id(
        &self,
        attestation_id: AttestationId,
    ) -> Result<&Attestation, AttestationError> {
        self.attestations
            .get(&attestation_id)
            .ok_or(AttestationError::AttestationNotFound(attestation_id))
    }

    /// Whether a record is revoked.
    pub fn is_revoked(&self, attestation_id: AttestationId) -> Result<bool, AttestationError> {
        Ok(self.get_attestation_by_id(attestation_id)?.revoked)
    }

    /// Whether a record has been superseded.
    pub fn is_replaced(&self, attestation_id: AttestationId) -> Result<bool, AttestationError> {
        Ok(self
            .get_attestation_by_id(attestation_id)?
            .replaced_by
            .is_some())
    }

    // ─── Precondition checks (no state change) ───────────────────────

    fn check_batch(&self, size: usize) -> Result<(), AttestationError> {
        if size > MAX_BATCH_SIZE {
            return Err(AttestationError::BatchTooLarge {
                size,
                max: MAX_BATCH_SIZE,
            });
        }
        Ok(())
    }

    fn check_portal(
        &self,
        portals: &PortalRegistry,
        portal_id: PortalId,
    ) -> Result<(), AttestationError> {
        if !portals.is_registered(portal_id) {
            return Err(AttestationError::OnlyPortal(portal_id));
        }
        Ok(())
    }

    fn check_schema(
        &self,
        schemas: &SchemaRegistry,
        payload: &AttestationPayload,
    ) -> Result<(), AttestationError> {
        if !schemas.is_registered(payload.schema_id) {
            return Err(AttestationError::SchemaNotRegistered(payload.schema_id));
        }
        Ok(())
    }

    /// The target exists and is active (neither revoked nor replaced).
    fn check_replaceable(&self, attestation_id: AttestationId) -> Result<(), AttestationError> {
        let record = self.get_attestation_by_id(attestation_id)?;
        if record.revoked {
            return Err(AttestationError::AttestationAlreadyRevoked(attestation_id));
        }
        if record.replaced_by.is_some() {
            return Err(AttestationError::AttestationAlreadyReplaced(attestation_id));
        }
        Ok(())
    }

    /// The target is active, issued by this portal, and the portal
    /// permits revocation.
    fn check_revocable(
        &self,
        portals: &PortalRegistry,
        portal_id: PortalId,
        attestation_id: AttestationId,
    ) -> Result<(), AttestationError> {
        self.check_replaceable(attestation_id)?;
        let record = self.get_attestation_by_id(attestation_id)?;
        if record.portal_id != portal_id {
            return Err(AttestationError::OnlyAttestingPortal(portal_id));
        }
        let revocable = portals
            .get_portal_revocability(portal_id)
            .map_err(|_| AttestationError::OnlyPortal(portal_id))?;
        if !revocable {
            return Err(AttestationError::PortalNotRevocable(portal_id));
        }
        Ok(())
    }

    // ─── Commit steps (preconditions already satisfied) ──────────────

    fn commit(
        &mut self,
        events: &mut EventLog,
        portal_id: PortalId,
        payload: &AttestationPayload,
        attester: Address,
    ) -> AttestationId {
        self.counter += 1;
        let id = AttestationId(self.counter);
        self.attestations.insert(
            id,
            Attestation {
                id,
                schema_id: payload.schema_id,
                portal_id,
                attester,
                subject: payload.subject.clone(),
                attestation_data: payload.attestation_data.clone(),
                attested_date: Timestamp::now(),
                expiration_date: payload.expiration_date,
                revoked: false,
                revocation_date: None,
                replaced_by: None,
            },
        );
        events.emit(RegistryEvent::AttestationRegistered { attestation_id: id });
        tracing::info!(attestation_id = %id, portal_id = %portal_id, "attestation registered");
        id
    }

    fn mark_revoked(&mut self, events: &mut EventLog, attestation_id: AttestationId) {
        if let Some(record) = self.attestations.get_mut(&attestation_id) {
            record.revoked = true;
            record.revocation_date = Some(Timestamp::now());
        }
        events.emit(RegistryEvent::AttestationRevoked { attestation_id });
        tracing::info!(attestation_id = %attestation_id, "attestation revoked");
    }
}
