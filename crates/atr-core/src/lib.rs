//! # atr-core — Foundational Types for the Attestation Registry Stack
//!
//! This crate is the bedrock of the Attestation Registry Stack. It defines
//! the type-system primitives shared by every registry: identity newtypes,
//! canonical serialization, content digests, UTC-only timestamps, the
//! attestation payload shape, and the capability interfaces that validation
//! modules and portals implement.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain identifiers.** `Address`, `SchemaId`,
//!    `ModuleId`, `PortalId`, `AttestationId` — no bare strings or integers
//!    cross a registry boundary.
//!
//! 2. **`CanonicalBytes` newtype.** ALL digest computation flows through
//!    `CanonicalBytes::new()`. Content-derived identifiers (schema ids)
//!    cannot be computed over non-canonical bytes.
//!
//! 3. **One polymorphic module capability.** A validation module receives a
//!    `ModuleContext` carrying the operation-kind tag as data. There are no
//!    parallel V1/V2 method families; the legacy call shape is a context
//!    with only the transferred value set.
//!
//! 4. **UTC-only timestamps.** The `Timestamp` type enforces UTC with Z
//!    suffix and seconds precision.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `atr-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public data types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod canonical;
pub mod capability;
pub mod digest;
pub mod error;
pub mod identity;
pub mod payload;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use capability::{
    PortalContract, Rejection, ValidationModule, InterfaceId, MODULE_INTERFACE, PORTAL_INTERFACE,
};
pub use digest::{sha256_digest, ContentDigest};
pub use error::CoreError;
pub use identity::{Address, AttestationId, ModuleId, PortalId, SchemaId};
pub use payload::{AttestationPayload, ModuleContext, OperationKind};
pub use temporal::Timestamp;
