//! # Module Registry
//!
//! Registers validation modules and executes ordered chains of them
//! against attestation payloads. A module is trusted only after passing
//! the capability-introspection check, and the check is repeated before
//! every invocation.
//!
//! ## Atomicity
//!
//! Chain execution is read-only with respect to registry state: modules
//! receive the payload and context by reference and cannot reach back into
//! any registry, so a chain that fails partway has no partial effect. For
//! bulk runs the whole batch is one unit — any single item's rejection
//! aborts the entire call.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use atr_core::{AttestationPayload, Address, ModuleContext, ModuleId, OperationKind, MODULE_INTERFACE};

use crate::artifact::CodeStore;
use crate::event::{EventLog, RegistryEvent};
use crate::MAX_BATCH_SIZE;

/// Descriptor of a registered validation module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    /// The module's address identity.
    pub id: ModuleId,
    /// Display name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
}

/// Errors raised by module registry preconditions.
#[derive(Error, Debug)]
pub enum ModuleError {
    /// A module with this address is already registered.
    #[error("module {0} is already registered")]
    ModuleAlreadyExists(ModuleId),

    /// The module address has no installed artifact.
    #[error("module address {0} has no executable code")]
    ModuleAddressInvalid(ModuleId),

    /// The artifact at the module address does not implement the module
    /// capability interface.
    #[error("module {0} does not implement the module interface")]
    ModuleInvalid(ModuleId),

    /// The module is not registered.
    #[error("module {0} is not registered")]
    ModuleNotRegistered(ModuleId),

    /// The number of validation payloads does not match the number of
    /// modules in the chain.
    #[error("validation payload count {payloads} does not match module count {modules}")]
    ModuleValidationPayloadMismatch {
        /// Modules in the chain.
        modules: usize,
        /// Validation payloads supplied.
        payloads: usize,
    },

    /// A module in the chain rejected the payload.
    #[error("module {module} rejected the payload: {reason}")]
    ModulePayloadRejected {
        /// The rejecting module.
        module: ModuleId,
        /// The module's stated reason.
        reason: String,
    },

    /// A bulk run exceeded the batch resource bound.
    #[error("batch of {size} items exceeds the maximum batch size {max}")]
    BatchTooLarge {
        /// Items submitted.
        size: usize,
        /// The bound.
        max: usize,
    },
}

/// Registry of validation modules and executor of module chains.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: HashMap<ModuleId, ModuleRecord>,
}

impl ModuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a validation module.
    ///
    /// # Errors
    ///
    /// - `ModuleAlreadyExists` if the address is already registered.
    /// - `ModuleAddressInvalid` if no artifact is installed at the address.
    /// - `ModuleInvalid` if the artifact fails capability introspection.
    pub fn register(
        &mut self,
        code: &CodeStore,
        events: &mut EventLog,
        module_id: ModuleId,
        name: &str,
        description: &str,
    ) -> Result<(), ModuleError> {
        if self.modules.contains_key(&module_id) {
            return Err(ModuleError::ModuleAlreadyExists(module_id));
        }
        if !code.has_code(module_id.address()) {
            return Err(ModuleError::ModuleAddressInvalid(module_id));
        }
        match code.module(module_id.address()) {
            Some(artifact) if artifact.supports_interface(MODULE_INTERFACE) => {}
            _ => return Err(ModuleError::ModuleInvalid(module_id)),
        }

        self.modules.insert(
            module_id,
            ModuleRecord {
                id: module_id,
                name: name.to_string(),
                description: description.to_string(),
            },
        );
        events.emit(RegistryEvent::ModuleRegistered {
            module_id,
            name: name.to_string(),
        });
        tracing::info!(module_id = %module_id, name, "module registered");
        Ok(())
    }

    /// Whether a module is registered.
    pub fn is_registered(&self, module_id: ModuleId) -> bool {
        self.modules.contains_key(&module_id)
    }

    /// Look up a module descriptor.
    pub fn get_module(&self, module_id: ModuleId) -> Result<&ModuleRecord, ModuleError> {
        self.modules
            .get(&module_id)
            .ok_or(ModuleError::ModuleNotRegistered(module_id))
    }

    /// Number of registered modules.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Run a module chain against one payload, legacy call shape: only the
    /// transferred value is forwarded to the modules.
    pub fn run_modules(
        &self,
        code: &CodeStore,
        module_ids: &[ModuleId],
        payload: &AttestationPayload,
        validation_payloads: &[Vec<u8>],
        value: u128,
    ) -> Result<(), ModuleError> {
        self.run_chain(
            code,
            module_ids,
            payload,
            validation_payloads,
            &ModuleContext::value_only(value),
        )
    }

    /// Run a module chain against one payload, forwarding caller identity,
    /// attester identity, and the semantic operation kind so modules can
    /// apply operation-specific policy.
    #[allow(clippy::too_many_arguments)]
    pub fn run_modules_v2(
        &self,
        code: &CodeStore,
        module_ids: &[ModuleId],
        payload: &AttestationPayload,
        validation_payloads: &[Vec<u8>],
        value: u128,
        caller: Address,
        attester: Address,
        operation: OperationKind,
    ) -> Result<(), ModuleError> {
        self.run_chain(
            code,
            module_ids,
            payload,
            validation_payloads,
            &ModuleContext::full(value, caller, attester, operation),
        )
    }

    /// Run the chain across a batch of payloads, legacy call shape.
    ///
    /// `validation_payloads` carries one per-module payload list per item.
    /// The batch is one atomic unit: any item's rejection aborts the call.
    pub fn bulk_run_modules(
        &self,
        code: &CodeStore,
        module_ids: &[ModuleId],
        payloads: &[AttestationPayload],
        validation_payloads: &[Vec<Vec<u8>>],
        value: u128,
    ) -> Result<(), ModuleError> {
        self.bulk_run_chain(
            code,
            module_ids,
            payloads,
            validation_payloads,
            &ModuleContext::value_only(value),
        )
    }

    /// Run the chain across a batch of payloads with the full context.
    #[allow(clippy::too_many_arguments)]
    pub fn bulk_run_modules_v2(
        &self,
        code: &CodeStore,
        module_ids: &[ModuleId],
        payloads: &[AttestationPayload],
        validation_payloads: &[Vec<Vec<u8>>],
        value: u128,
        caller: Address,
        attester: Address,
        operation: OperationKind,
    ) -> Result<(), ModuleError> {
        self.bulk_run_chain(
            code,
            module_ids,
            payloads,
            validation_payloads,
            &ModuleContext::full(value, caller, attester, operation),
        )
    }

    /// Shared single-payload chain executor.
    fn run_chain(
        &self,
        code: &CodeStore,
        module_ids: &[ModuleId],
        payload: &AttestationPayload,
        validation_payloads: &[Vec<u8>],
        ctx: &ModuleContext,
    ) -> Result<(), ModuleError> {
        if module_ids.len() != validation_payloads.len() {
            return Err(ModuleError::ModuleValidationPayloadMismatch {
                modules: module_ids.len(),
                payloads: validation_payloads.len(),
            });
        }
        for (module_id, validation_payload) in module_ids.iter().zip(validation_payloads) {
            if !self.modules.contains_key(module_id) {
                return Err(ModuleError::ModuleNotRegistered(*module_id));
            }
            let artifact = code
                .module(module_id.address())
                .ok_or(ModuleError::ModuleAddressInvalid(*module_id))?;
            // Capability re-checked before every invocation, not just at
            // registration time.
            if !artifact.supports_interface(MODULE_INTERFACE) {
                return Err(ModuleError::ModuleInvalid(*module_id));
            }
            artifact
                .validate(payload, validation_payload, ctx)
                .map_err(|rejection| ModuleError::ModulePayloadRejected {
                    module: *module_id,
                    reason: rejection.reason,
                })?;
        }
        tracing::debug!(
            modules = module_ids.len(),
            schema_id = %payload.schema_id,
            "module chain accepted payload"
        );
        Ok(())
    }

    /// Shared batch chain executor.
    fn bulk_run_chain(
        &self,
        code: &CodeStore,
        module_ids: &[ModuleId],
        payloads: &[AttestationPayload],
        validation_payloads: &[Vec<Vec<u8>>],
        ctx: &ModuleContext,
    ) -> Result<(), ModuleError> {
        if payloads.len() > MAX_BATCH_SIZE {
            return Err(ModuleError::BatchTooLarge {
                size: payloads.len(),
                max: MAX_BATCH_SIZE,
            });
        }
        if payloads.len() != validation_payloads.len() {
            return Err(ModuleError::ModuleValidationPayloadMismatch {
                modules: payloads.len(),
                payloads: validation_payloads.len(),
            });
        }
        for (payload, item_payloads) in payloads.iter().zip(validation_payloads) {
            self.run_chain(code, module_ids, payload, item_payloads, ctx)?;
        }
        Ok(())
    }
}
