//! # atr-registry — Registries and the Attestation Ledger
//!
//! The four interacting registries at the heart of the Attestation
//! Registry Stack:
//!
//! - [`schema::SchemaRegistry`] — immutable claim-schema descriptors keyed
//!   by content-derived id.
//! - [`module::ModuleRegistry`] — validation modules and the execution of
//!   ordered module chains.
//! - [`portal::PortalRegistry`] — issuer endpoints, their allowlist, and
//!   the permissive-mode flag.
//! - [`attestation::AttestationRegistry`] — the append-only ledger with
//!   replace and revoke transitions.
//!
//! Plus the cross-cutting pieces: the [`router::Router`] resolution table,
//! the [`artifact::CodeStore`] of deployed module/portal implementations,
//! the [`balance::Balances`] book, and the [`event::EventLog`] that forms
//! the public append-only log for downstream indexers.
//!
//! ## Atomicity Discipline
//!
//! Every operation validates all of its preconditions before mutating any
//! state, so a returned error implies no state change and no emitted
//! event. Bulk operations validate the entire batch before committing the
//! first item; a single item's failure voids the whole batch.
//!
//! ## Peer Resolution
//!
//! Registries never hold references to each other. An operation that needs
//! a peer (e.g. the ledger checking portal revocability) takes that peer
//! as an explicit argument; the [`context::Registries`] aggregate owns all
//! of them and wires the calls. Any one registry can be swapped without
//! touching the others.

pub mod artifact;
pub mod attestation;
pub mod balance;
pub mod context;
pub mod error;
pub mod event;
pub mod module;
pub mod portal;
pub mod router;
pub mod schema;

pub use artifact::CodeStore;
pub use attestation::{Attestation, AttestationError, AttestationRegistry};
pub use balance::{BalanceError, Balances};
pub use context::Registries;
pub use error::RegistryError;
pub use event::{EventLog, EventRecord, RegistryEvent};
pub use module::{ModuleError, ModuleRecord, ModuleRegistry};
pub use portal::{PortalError, PortalRecord, PortalRegistry};
pub use router::{RegistryRole, Router, RouterError};
pub use schema::{Schema, SchemaError, SchemaRegistry};

/// Upper bound on the number of items in one bulk operation.
///
/// A batch above this bound fails entirely and must be resubmitted
/// smaller; there is no pagination or partial-progress retry.
pub const MAX_BATCH_SIZE: usize = 512;
