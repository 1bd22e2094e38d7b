//! Error types for multisig operations

use crate::{MemberId, ProposalId, ProposalStatus};

/// Failure reported by the external execution sink
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ExecutionError {
    pub message: String,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors that can occur in multisig operations
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MultisigError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Proposal not found: {0}")]
    NotFound(ProposalId),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Member {voter} already voted on proposal {proposal_id}")]
    AlreadyVoted {
        proposal_id: ProposalId,
        voter: MemberId,
    },

    #[error("Proposal {proposal_id} is closed (status: {status})")]
    ProposalClosed {
        proposal_id: ProposalId,
        status: ProposalStatus,
    },

    #[error("Proposal {proposal_id} is not executable (status: {status})")]
    NotExecutable {
        proposal_id: ProposalId,
        status: ProposalStatus,
    },

    #[error("Proposal {proposal_id} cannot be closed: {reason}")]
    NotClosable {
        proposal_id: ProposalId,
        reason: String,
    },

    #[error("Invalid status transition for proposal {proposal_id}: {from} -> {to}")]
    InvalidTransition {
        proposal_id: ProposalId,
        from: ProposalStatus,
        to: ProposalStatus,
    },

    #[error("Invalid expiration: {0}")]
    InvalidExpiration(String),

    #[error("Invalid quorum configuration: {0}")]
    InvalidConfig(String),

    #[error("Execution of proposal {proposal_id} failed: {source}")]
    ExecutionFailed {
        proposal_id: ProposalId,
        #[source]
        source: ExecutionError,
    },

    #[error("Engine state lock poisoned")]
    LockPoisoned,
}

/// Result type alias for multisig operations
pub type MultisigResult<T> = Result<T, MultisigError>;
