//! Contract execution host (spec.md §4.6).
//!
//! Presents a deterministic host ABI to an external WebAssembly runtime.
//! The runtime itself — compiling and stepping guest bytecode — is an
//! external collaborator; this crate owns everything that must stay
//! deterministic across re-execution: gas metering, the per-transaction
//! storage overlay, the call stack, and deployment addressing.
//! [`WasmiRuntime`] wires `wasmi` in only far enough to validate that
//! submitted bytecode is a well-formed module, per the host's
//! `InvalidBytecode` failure mode; it does not execute guest code.

mod call_stack;
mod deploy;
mod error;
mod gas;
mod host;
mod overlay;

pub use call_stack::CallStack;
pub use deploy::derive_contract_address;
pub use error::{ExecError, Result};
pub use gas::{sats_to_gas, GasMeter};
pub use host::{
    finalize_deployment, AccountType, ContractRuntime, ExecutionContext, HostAbi, HostContext,
    LogEntry, PendingDeployment, TxExecutionOutput,
};
pub use overlay::OverlayStack;

/// Validates submitted bytecode is a well-formed WASM module without
/// executing it, using `wasmi`'s module parser. Real guest execution is
/// delegated to the runtime collaborator that embeds `ContractRuntime`.
pub struct WasmiRuntime {
    engine: wasmi::Engine,
}

impl Default for WasmiRuntime {
    fn default() -> Self {
        Self { engine: wasmi::Engine::default() }
    }
}

impl WasmiRuntime {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContractRuntime for WasmiRuntime {
    fn invoke(
        &self,
        _bytecode: &[u8],
        _calldata: &[u8],
        _host: &mut dyn HostAbi,
    ) -> Result<Vec<u8>> {
        // Guest execution is delegated to the embeddable WASM runtime
        // collaborator (spec.md §4.6: "The runtime is a black-box");
        // wiring a full host-function table into wasmi is out of scope
        // here.
        Err(ExecError::InvalidBytecode("guest execution not wired in this host".into()))
    }

    fn validate_bytecode(&self, bytecode: &[u8]) -> Result<()> {
        wasmi::Module::new(&self.engine, bytecode)
            .map(|_| ())
            .map_err(|e| ExecError::InvalidBytecode(e.to_string()))
    }
}
