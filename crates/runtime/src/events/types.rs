//! Event payloads.

use serde::Serialize;

use chain_core::{ContractName, TransactionId};
use prover_client::SessionId;

use crate::api::ErrorKind;
use crate::state::Status;

/// Progress of the submission state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SubmissionEvent {
    StatusChanged {
        from: Status,
        to: Status,
        progress: u8,
        message: String,
    },

    Failed {
        kind: ErrorKind,
        message: String,
    },

    DataBroadcast {
        tx_hash: TransactionId,
    },

    ProofGenerated {
        tx_hash: TransactionId,
        proof_size: usize,
    },

    /// Proof accepted by the chain
    Settled {
        tx_hash: TransactionId,
        proof_tx: TransactionId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionEvent {
    Acquired { session_id: SessionId },
    Released { session_id: SessionId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RegistrationEvent {
    AlreadyRegistered { contract: ContractName },
    Registered { contract: ContractName },
}
