use ancora_primitives::{BlockHash, BlockHeight, Buf32, ContractAddress, Word256};
use ancora_storage::{ContractRecord, PointerWrite, Storage};

use crate::call_stack::CallStack;
use crate::deploy::derive_contract_address;
use crate::error::{ExecError, Result};
use crate::gas::GasMeter;
use crate::overlay::OverlayStack;

/// Whether an address names a deployed contract (spec.md §4.6
/// "AccountType").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountType {
    Contract,
    NotDeployed,
}

/// A single transaction-log entry (spec.md §4.6 "Log / Emit").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub emitter: ContractAddress,
    pub topics: Vec<Word256>,
    pub data: Vec<u8>,
}

/// A contract registered by `DeployAt` but not yet instantiated; becomes a
/// [`ContractRecord`] on transaction commit (spec.md §4.6 "DeployAt").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingDeployment {
    pub address: ContractAddress,
    pub deployer: ContractAddress,
    pub bytecode: Vec<u8>,
    pub salt: Buf32,
    pub seed: Buf32,
}

/// The deterministic host ABI a WASM runtime is executed against (spec.md
/// §4.6). Every method is a pure function of `(block context, call stack,
/// calldata, persistent state ≤ reading height)` plus the mutable overlay
/// and gas state threaded through `&mut self`.
pub trait HostAbi {
    fn load(&mut self, pointer: Word256) -> Result<Word256>;
    fn store(&mut self, pointer: Word256, value: Word256) -> Result<()>;
    fn call(
        &mut self,
        target: ContractAddress,
        calldata: &[u8],
        runtime: &dyn ContractRuntime,
    ) -> Result<Vec<u8>>;
    fn deploy_at(&mut self, bytecode: Vec<u8>, salt: Buf32) -> Result<ContractAddress>;
    fn account_type(&self, address: ContractAddress) -> Result<AccountType>;
    fn block_hash(&self, height: BlockHeight) -> Result<BlockHash>;
    fn log(&mut self, topics: Vec<Word256>, data: Vec<u8>) -> Result<()>;
    fn charge_gas(&mut self, amount: u64) -> Result<()>;
}

/// The external WebAssembly runtime collaborator (spec.md §4.6: "The
/// runtime is a black-box"). Bytecode execution itself is out of scope
/// here; `validate_bytecode` is the one piece of runtime behavior the host
/// can exercise deterministically without executing a guest. `Send + Sync`
/// so it can be held across the `.await` points in the async engine and
/// bulk-sync pipelines that drive it.
pub trait ContractRuntime: Send + Sync {
    fn invoke(
        &self,
        bytecode: &[u8],
        calldata: &[u8],
        host: &mut dyn HostAbi,
    ) -> Result<Vec<u8>>;

    fn validate_bytecode(&self, bytecode: &[u8]) -> Result<()>;
}

/// Block/transaction context a [`HostContext`] is pinned to for the
/// duration of a single transaction's execution (spec.md §4.6
/// "Determinism requirements").
#[derive(Clone, Copy, Debug)]
pub struct ExecutionContext {
    pub reading_height: BlockHeight,
    pub block_hash: BlockHash,
    pub median_time: u64,
    pub tx_index: u32,
}

/// Concrete [`HostAbi`] implementation wiring gas metering, the storage
/// overlay, and the call stack together over a shared [`Storage`] snapshot
/// pinned at the transaction's reading height.
pub struct HostContext<'s> {
    storage: &'s dyn Storage,
    ctx: ExecutionContext,
    deployer_of_entry_point: ContractAddress,
    gas: GasMeter,
    overlay: OverlayStack,
    call_stack: CallStack,
    deploy_depth_max: u32,
    pending_deployments: Vec<PendingDeployment>,
    events: Vec<LogEntry>,
}

/// Everything a caller needs to commit one finished transaction, torn down
/// from a [`HostContext`] by [`HostContext::into_parts`].
#[derive(Debug)]
pub struct TxExecutionOutput {
    pub gas_used: u64,
    pub events: Vec<LogEntry>,
    pub pending_deployments: Vec<PendingDeployment>,
    pub overlay_writes: std::collections::HashMap<(ContractAddress, Word256), Word256>,
}

impl<'s> HostContext<'s> {
    pub fn new(
        storage: &'s dyn Storage,
        ctx: ExecutionContext,
        entry_point: ContractAddress,
        gas_budget: u64,
        call_depth_max: u32,
        deploy_depth_max: u32,
    ) -> Self {
        Self {
            storage,
            ctx,
            deployer_of_entry_point: entry_point,
            gas: GasMeter::new(gas_budget),
            overlay: OverlayStack::new(),
            call_stack: CallStack::new(entry_point, call_depth_max),
            deploy_depth_max,
            pending_deployments: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn gas_used(&self) -> u64 {
        self.gas.used()
    }

    pub fn events(&self) -> &[LogEntry] {
        &self.events
    }

    pub fn pending_deployments(&self) -> &[PendingDeployment] {
        &self.pending_deployments
    }

    /// Consumes the context and returns its root-frame overlay writes, for
    /// the caller to persist on successful transaction commit.
    pub fn into_overlay_writes(
        self,
    ) -> std::collections::HashMap<(ContractAddress, Word256), Word256> {
        self.overlay.into_root_writes()
    }

    /// Tears the context down into everything a caller needs to commit a
    /// finished transaction: gas used, emitted events, pending
    /// deployments, and the root-frame overlay writes.
    pub fn into_parts(self) -> TxExecutionOutput {
        TxExecutionOutput {
            gas_used: self.gas.used(),
            events: self.events,
            pending_deployments: self.pending_deployments,
            overlay_writes: self.overlay.into_root_writes(),
        }
    }

    fn current_contract(&self) -> ContractAddress {
        self.call_stack.current()
    }
}

impl HostAbi for HostContext<'_> {
    fn load(&mut self, pointer: Word256) -> Result<Word256> {
        let key = (self.current_contract(), pointer);
        if let Some(value) = self.overlay.get(key) {
            return Ok(value);
        }
        let value = self
            .storage
            .get_pointer(self.current_contract(), pointer, self.ctx.reading_height)
            .map_err(|_| ExecError::InvalidStorageAccess)?
            .unwrap_or([0u8; 32]);
        self.overlay.set(key, value);
        Ok(value)
    }

    fn store(&mut self, pointer: Word256, value: Word256) -> Result<()> {
        let key = (self.current_contract(), pointer);
        self.overlay.set(key, value);
        Ok(())
    }

    fn call(
        &mut self,
        target: ContractAddress,
        calldata: &[u8],
        runtime: &dyn ContractRuntime,
    ) -> Result<Vec<u8>> {
        if self.gas.remaining() == 0 {
            return Err(ExecError::OutOfGas);
        }
        let contract = self
            .storage
            .get_contract(target, self.ctx.reading_height)
            .map_err(|_| ExecError::InvalidStorageAccess)?
            .ok_or(ExecError::UnknownContract)?;

        self.call_stack.push(target)?;
        self.overlay.push_frame();

        let result = runtime.invoke(&contract.bytecode, calldata, self);

        match &result {
            Ok(_) => self.overlay.pop_frame_merge(),
            Err(_) => self.overlay.pop_frame_discard(),
        }
        self.call_stack.pop();
        result
    }

    fn deploy_at(&mut self, bytecode: Vec<u8>, salt: Buf32) -> Result<ContractAddress> {
        if self.pending_deployments.len() as u32 >= self.deploy_depth_max {
            return Err(ExecError::DeployDepthExceeded);
        }
        let bytecode_hash = ancora_primitives::sha256_concat(&[&bytecode]);
        let deployer = self.current_contract();
        let address = derive_contract_address(deployer, salt, bytecode_hash);
        self.pending_deployments.push(PendingDeployment {
            address,
            deployer,
            bytecode,
            salt,
            seed: bytecode_hash,
        });
        Ok(address)
    }

    fn account_type(&self, address: ContractAddress) -> Result<AccountType> {
        let found = self
            .storage
            .get_contract(address, self.ctx.reading_height)
            .map_err(|_| ExecError::InvalidStorageAccess)?
            .is_some();
        Ok(if found { AccountType::Contract } else { AccountType::NotDeployed })
    }

    fn block_hash(&self, height: BlockHeight) -> Result<BlockHash> {
        if height > self.ctx.reading_height {
            return Err(ExecError::InvalidStorageAccess);
        }
        let header = self
            .storage
            .get_header(height)
            .map_err(|_| ExecError::InvalidStorageAccess)?
            .ok_or(ExecError::InvalidStorageAccess)?;
        Ok(header.hash)
    }

    fn log(&mut self, topics: Vec<Word256>, data: Vec<u8>) -> Result<()> {
        self.events.push(LogEntry { emitter: self.current_contract(), topics, data });
        Ok(())
    }

    fn charge_gas(&mut self, amount: u64) -> Result<()> {
        self.gas.charge(amount)
    }
}

/// Materializes a [`PendingDeployment`] into a [`ContractRecord`] plus the
/// [`PointerWrite`] batch needed to commit it, called once per pending
/// deployment on successful transaction commit.
pub fn finalize_deployment(
    pending: &PendingDeployment,
    deployment_txid: ancora_primitives::Txid,
    deployed_at_height: BlockHeight,
) -> ContractRecord {
    ContractRecord {
        address: pending.address,
        bytecode: pending.bytecode.clone(),
        deployer: pending.deployer,
        deployment_txid,
        seed: pending.seed,
        salt: pending.salt,
        deployed_at_height,
    }
}

#[cfg(test)]
mod tests {
    use ancora_primitives::Txid;
    use ancora_storage::InMemoryStorage;

    use super::*;

    fn ctx(height: BlockHeight) -> ExecutionContext {
        ExecutionContext { reading_height: height, block_hash: BlockHash::ZERO, median_time: 0, tx_index: 0 }
    }

    fn addr(b: u8) -> ContractAddress {
        ContractAddress::new([b; 20])
    }

    struct EchoRuntime;

    impl ContractRuntime for EchoRuntime {
        fn invoke(&self, _bytecode: &[u8], calldata: &[u8], host: &mut dyn HostAbi) -> Result<Vec<u8>> {
            host.charge_gas(10)?;
            Ok(calldata.to_vec())
        }

        fn validate_bytecode(&self, bytecode: &[u8]) -> Result<()> {
            if bytecode.is_empty() {
                return Err(ExecError::InvalidBytecode("empty".into()));
            }
            Ok(())
        }
    }

    struct RevertingRuntime;

    impl ContractRuntime for RevertingRuntime {
        fn invoke(&self, _bytecode: &[u8], _calldata: &[u8], host: &mut dyn HostAbi) -> Result<Vec<u8>> {
            host.charge_gas(7)?;
            host.store([1u8; 32], [9u8; 32])?;
            Err(ExecError::Revert { reason: "nope".into() })
        }

        fn validate_bytecode(&self, _bytecode: &[u8]) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn load_falls_back_to_storage_then_caches() {
        let storage = InMemoryStorage::new();
        let target = addr(1);
        storage
            .put_pointer(target, [5u8; 32], PointerWrite { value: [7u8; 32], at_height: 0 })
            .unwrap();
        let mut host = HostContext::new(&storage, ctx(10), target, 1_000, 16, 4);
        assert_eq!(host.load([5u8; 32]).unwrap(), [7u8; 32]);
        assert_eq!(host.load([9u8; 32]).unwrap(), [0u8; 32]);
    }

    #[test]
    fn call_merges_overlay_on_success() {
        let storage = InMemoryStorage::new();
        let caller = addr(1);
        let callee = addr(2);
        storage
            .put_contract(ContractRecord {
                address: callee,
                bytecode: vec![1, 2, 3],
                deployer: caller,
                deployment_txid: Txid::new(Buf32::ZERO),
                seed: Buf32::ZERO,
                salt: Buf32::ZERO,
                deployed_at_height: 0,
            })
            .unwrap();
        let mut host = HostContext::new(&storage, ctx(10), caller, 1_000, 16, 4);
        let out = host.call(callee, b"hi", &EchoRuntime).unwrap();
        assert_eq!(out, b"hi");
        assert_eq!(host.gas_used(), 10);
    }

    #[test]
    fn call_discards_overlay_on_revert_but_keeps_gas_charged() {
        let storage = InMemoryStorage::new();
        let caller = addr(1);
        let callee = addr(2);
        storage
            .put_contract(ContractRecord {
                address: callee,
                bytecode: vec![1],
                deployer: caller,
                deployment_txid: Txid::new(Buf32::ZERO),
                seed: Buf32::ZERO,
                salt: Buf32::ZERO,
                deployed_at_height: 0,
            })
            .unwrap();
        let mut host = HostContext::new(&storage, ctx(10), caller, 1_000, 16, 4);
        let err = host.call(callee, b"hi", &RevertingRuntime).unwrap_err();
        assert!(matches!(err, ExecError::Revert { .. }));
        assert_eq!(host.gas_used(), 7);
        // The nested store must not be visible — it was discarded with the frame.
        assert_eq!(host.load([1u8; 32]).unwrap(), [0u8; 32]);
    }

    #[test]
    fn call_unknown_contract_fails() {
        let storage = InMemoryStorage::new();
        let mut host = HostContext::new(&storage, ctx(10), addr(1), 1_000, 16, 4);
        let err = host.call(addr(9), b"", &EchoRuntime).unwrap_err();
        assert!(matches!(err, ExecError::UnknownContract));
    }

    #[test]
    fn deploy_at_is_deterministic_and_bounded() {
        let storage = InMemoryStorage::new();
        let mut host = HostContext::new(&storage, ctx(10), addr(1), 1_000, 16, 2);
        let a1 = host.deploy_at(vec![1, 2], Buf32::new([3u8; 32])).unwrap();
        let a2 = host.deploy_at(vec![1, 2], Buf32::new([3u8; 32])).unwrap();
        // Same deployer + salt + bytecode in a single pending batch both
        // derive the same address; the pending list does not dedup.
        assert_eq!(a1, a2);
        assert!(host.deploy_at(vec![9], Buf32::ZERO).is_err());
        assert_eq!(host.pending_deployments().len(), 2);
    }

    #[test]
    fn block_hash_rejects_future_heights() {
        let storage = InMemoryStorage::new();
        let mut host = HostContext::new(&storage, ctx(5), addr(1), 1_000, 16, 4);
        assert!(host.block_hash(6).is_err());
    }

    #[test]
    fn log_records_emitter() {
        let storage = InMemoryStorage::new();
        let mut host = HostContext::new(&storage, ctx(5), addr(1), 1_000, 16, 4);
        host.log(vec![[1u8; 32]], vec![9]).unwrap();
        assert_eq!(host.events().len(), 1);
        assert_eq!(host.events()[0].emitter, addr(1));
    }

    #[test]
    fn into_parts_exposes_overlay_writes_and_gas() {
        let storage = InMemoryStorage::new();
        let mut host = HostContext::new(&storage, ctx(10), addr(1), 1_000, 16, 4);
        host.store([2u8; 32], [3u8; 32]).unwrap();
        host.charge_gas(5).unwrap();
        let out = host.into_parts();
        assert_eq!(out.gas_used, 5);
        assert_eq!(out.overlay_writes.get(&(addr(1), [2u8; 32])), Some(&[3u8; 32]));
        assert!(out.pending_deployments.is_empty());
    }

    #[test]
    fn out_of_gas_charge_is_still_recorded() {
        let storage = InMemoryStorage::new();
        let mut host = HostContext::new(&storage, ctx(5), addr(1), 5, 16, 4);
        let err = host.charge_gas(50).unwrap_err();
        assert!(matches!(err, ExecError::OutOfGas));
        assert_eq!(host.gas_used(), 50);
    }
}
