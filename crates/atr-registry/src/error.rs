//! Union error over every registry, for callers that drive multiple
//! registries through one fallible path.

use thiserror::Error;

use crate::attestation::AttestationError;
use crate::balance::BalanceError;
use crate::module::ModuleError;
use crate::portal::PortalError;
use crate::router::RouterError;
use crate::schema::SchemaError;

/// Any error a registry operation can raise.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Schema registry precondition failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Module registry or module chain failure.
    #[error(transparent)]
    Module(#[from] ModuleError),

    /// Portal registry precondition failed.
    #[error(transparent)]
    Portal(#[from] PortalError),

    /// Ledger precondition failed.
    #[error(transparent)]
    Attestation(#[from] AttestationError),

    /// Router role resolution failed.
    #[error(transparent)]
    Router(#[from] RouterError),

    /// Balance transfer failed.
    #[error(transparent)]
    Balance(#[from] BalanceError),
}
