//! Mock chain transport for testing.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::traits::{ChainError, ChainTransport};
use crate::types::{
    BlobTransaction, ContractName, ContractRegistration, ProofTransaction, TransactionId,
};

/// One call observed by [`MockChain`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    ContractExists(ContractName),
    RegisterContract(ContractName),
    /// Carries the hash handed back to the caller
    BroadcastPayload(TransactionId),
    /// Carries the data transaction hash the proof refers to
    BroadcastProof(TransactionId),
}

/// Parks a mocked call until the test opens it.
///
/// Lets a test observe the caller while the call is outstanding.
#[derive(Clone, Default)]
pub struct Gate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until a call is parked at the gate.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let one parked call complete.
    pub fn open(&self) {
        self.release.notify_one();
    }

    /// Park the calling future until [`Gate::open`].
    pub async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[derive(Default)]
struct MockState {
    registered: HashSet<ContractName>,
    calls: Vec<MockCall>,
    registrations: Vec<ContractRegistration>,
    payloads: Vec<BlobTransaction>,
    proofs: Vec<ProofTransaction>,
    scripted_hashes: VecDeque<TransactionId>,
    tx_counter: u64,
    reject_duplicates: bool,
    exists_failure: Option<String>,
    register_failure: Option<String>,
    payload_failure: Option<String>,
    proof_failure: Option<String>,
    payload_gate: Option<Gate>,
    proof_gate: Option<Gate>,
}

/// Mock chain for testing without a node.
///
/// Simulates contract registration and broadcasts in memory and records every
/// call so tests can assert on ordering.
#[derive(Clone, Default)]
pub struct MockChain {
    state: Arc<Mutex<MockState>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start with a contract already registered.
    pub fn with_contract(self, name: impl Into<String>) -> Self {
        self.state().registered.insert(ContractName::new(name));
        self
    }

    /// Hand out these hashes (in order) for the next payload broadcasts.
    pub fn with_tx_hashes<I, S>(self, hashes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state()
            .scripted_hashes
            .extend(hashes.into_iter().map(TransactionId::new));
        self
    }

    /// Reject a registration when the contract already exists.
    pub fn rejecting_duplicates(self) -> Self {
        self.state().reject_duplicates = true;
        self
    }

    /// Park payload broadcasts at `gate` before they reach the chain.
    pub fn with_payload_gate(self, gate: Gate) -> Self {
        self.state().payload_gate = Some(gate);
        self
    }

    /// Park proof broadcasts at `gate` before they reach the chain.
    pub fn with_proof_gate(self, gate: Gate) -> Self {
        self.state().proof_gate = Some(gate);
        self
    }

    pub fn fail_contract_exists(&self, reason: impl Into<String>) {
        self.state().exists_failure = Some(reason.into());
    }

    pub fn fail_registration(&self, reason: impl Into<String>) {
        self.state().register_failure = Some(reason.into());
    }

    pub fn fail_payload(&self, reason: impl Into<String>) {
        self.state().payload_failure = Some(reason.into());
    }

    pub fn fail_proof(&self, reason: impl Into<String>) {
        self.state().proof_failure = Some(reason.into());
    }

    /// Register a contract behind the caller's back (another tab, another client).
    pub fn register_externally(&self, name: impl Into<String>) {
        self.state().registered.insert(ContractName::new(name));
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state().calls.clone()
    }

    pub fn registrations(&self) -> Vec<ContractRegistration> {
        self.state().registrations.clone()
    }

    pub fn payloads(&self) -> Vec<BlobTransaction> {
        self.state().payloads.clone()
    }

    pub fn proofs(&self) -> Vec<ProofTransaction> {
        self.state().proofs.clone()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.state().registered.contains(&ContractName::new(name))
    }
}

impl MockState {
    fn next_tx_hash(&mut self) -> TransactionId {
        if let Some(hash) = self.scripted_hashes.pop_front() {
            return hash;
        }
        self.tx_counter += 1;
        TransactionId::new(format!("{:064x}", self.tx_counter))
    }
}

#[async_trait]
impl ChainTransport for MockChain {
    async fn contract_exists(&self, contract_name: &ContractName) -> Result<bool, ChainError> {
        let mut state = self.state();
        state
            .calls
            .push(MockCall::ContractExists(contract_name.clone()));

        if let Some(reason) = state.exists_failure.clone() {
            return Err(ChainError::Network(reason));
        }

        Ok(state.registered.contains(contract_name))
    }

    async fn register_contract(
        &self,
        registration: ContractRegistration,
    ) -> Result<(), ChainError> {
        let mut state = self.state();
        state.calls.push(MockCall::RegisterContract(
            registration.contract_name.clone(),
        ));

        if let Some(reason) = state.register_failure.clone() {
            return Err(ChainError::Rejected(reason));
        }

        if state.reject_duplicates && state.registered.contains(&registration.contract_name) {
            return Err(ChainError::Rejected(format!(
                "contract {} already registered",
                registration.contract_name
            )));
        }

        state.registered.insert(registration.contract_name.clone());
        state.registrations.push(registration);
        Ok(())
    }

    async fn broadcast_payload(&self, tx: BlobTransaction) -> Result<TransactionId, ChainError> {
        let gate = self.state().payload_gate.clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }

        let mut state = self.state();

        if let Some(reason) = state.payload_failure.clone() {
            return Err(ChainError::Rejected(reason));
        }

        let hash = state.next_tx_hash();
        state.calls.push(MockCall::BroadcastPayload(hash.clone()));
        state.payloads.push(tx);
        Ok(hash)
    }

    async fn broadcast_proof(&self, tx: ProofTransaction) -> Result<TransactionId, ChainError> {
        let gate = self.state().proof_gate.clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }

        let mut state = self.state();
        state.calls.push(MockCall::BroadcastProof(tx.tx_hash.clone()));

        if let Some(reason) = state.proof_failure.clone() {
            return Err(ChainError::Rejected(reason));
        }

        let hash = state.next_tx_hash();
        state.proofs.push(tx);
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Blob, Identity, VerifierKind};

    #[tokio::test]
    async fn test_mock_chain_round_trip() {
        let chain = MockChain::new().with_tx_hashes(["tx_abc"]);
        let name = ContractName::new("sp1_residency");

        assert!(!chain.contract_exists(&name).await.unwrap());

        chain
            .register_contract(ContractRegistration::new(
                VerifierKind::Sp1,
                name.clone(),
                vec![1, 2, 3],
            ))
            .await
            .unwrap();
        assert!(chain.contract_exists(&name).await.unwrap());

        let tx_hash = chain
            .broadcast_payload(BlobTransaction {
                identity: Identity::default(),
                blobs: vec![Blob {
                    contract_name: name.clone(),
                    data: b"Portugal".to_vec(),
                }],
            })
            .await
            .unwrap();
        assert_eq!(tx_hash.as_str(), "tx_abc");

        chain
            .broadcast_proof(ProofTransaction {
                tx_hash: tx_hash.clone(),
                blob_index: 0,
                contract_name: name.clone(),
                proof: vec![0u8; 128],
            })
            .await
            .unwrap();

        assert_eq!(
            chain.calls(),
            vec![
                MockCall::ContractExists(name.clone()),
                MockCall::RegisterContract(name.clone()),
                MockCall::ContractExists(name.clone()),
                MockCall::BroadcastPayload(tx_hash.clone()),
                MockCall::BroadcastProof(tx_hash),
            ]
        );
    }

    #[tokio::test]
    async fn test_gated_payload_waits_for_open() {
        let gate = Gate::new();
        let chain = MockChain::new()
            .with_tx_hashes(["tx_abc"])
            .with_payload_gate(gate.clone());

        let task = tokio::spawn({
            let chain = chain.clone();
            async move {
                chain
                    .broadcast_payload(BlobTransaction {
                        identity: Identity::default(),
                        blobs: vec![],
                    })
                    .await
            }
        });

        gate.entered().await;
        assert!(chain.calls().is_empty());

        gate.open();
        assert_eq!(task.await.unwrap().unwrap().as_str(), "tx_abc");
        assert_eq!(chain.payloads().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_registration_can_be_rejected() {
        let chain = MockChain::new()
            .with_contract("sp1_residency")
            .rejecting_duplicates();

        let err = chain
            .register_contract(ContractRegistration::new(
                VerifierKind::Sp1,
                ContractName::new("sp1_residency"),
                vec![],
            ))
            .await
            .unwrap_err();

        assert!(err.is_rejection());
        assert!(chain.registrations().is_empty());
    }
}
