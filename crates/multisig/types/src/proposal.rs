//! Proposals and their status state machine

use crate::threshold;
use crate::{
    Approval, Member, MemberId, MultisigError, MultisigResult, ProposalId, ThresholdRule,
    Timestamp, Vote, Votes,
};
use serde::{Deserialize, Serialize};

/// Status of a proposal
///
/// ```text
/// Open ──► Passed ──► Executed
///  │  │       │
///  │  └──► Expired ◄┘
///  └──► Rejected
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Accepting votes
    Open,
    /// Threshold reached, waiting for execution
    Passed,
    /// Closed without being able to pass
    Rejected,
    /// Voting period elapsed before execution
    Expired,
    /// Actions handed to the sink successfully
    Executed,
}

impl ProposalStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProposalStatus::Rejected | ProposalStatus::Expired | ProposalStatus::Executed
        )
    }

    pub fn can_transition_to(&self, next: ProposalStatus) -> bool {
        use ProposalStatus::*;
        matches!(
            (self, next),
            (Open, Passed) | (Open, Rejected) | (Open, Expired) | (Passed, Executed) | (Passed, Expired)
        )
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProposalStatus::Open => "open",
            ProposalStatus::Passed => "passed",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Expired => "expired",
            ProposalStatus::Executed => "executed",
        };
        write!(f, "{}", s)
    }
}

/// An action carried by a proposal.
///
/// `UpdateQuorum` is interpreted by the engine itself; everything else is
/// opaque and passed through to the action sink.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Replace the quorum's member set and rule after execution
    UpdateQuorum {
        members: Vec<Member>,
        rule: ThresholdRule,
    },
    /// Application-defined payload
    Custom {
        kind: String,
        #[serde(default)]
        payload: serde_json::Value,
    },
}

impl Action {
    pub fn custom(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::Custom {
            kind: kind.into(),
            payload,
        }
    }
}

/// Caller-supplied content of a new proposal
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposalDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl ProposalDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }
}

/// Rule and total power as seen at a point in time
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdInfo {
    pub rule: ThresholdRule,
    pub total_power: u64,
}

/// A proposal record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub description: String,
    pub actions: Vec<Action>,
    pub proposer: MemberId,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    /// Rule snapshotted at creation
    pub rule: ThresholdRule,
    /// Total power snapshotted at creation
    pub total_power: u64,
    pub votes: Votes,
    pub approvals: Vec<Approval>,
    pub status: ProposalStatus,
}

impl Proposal {
    pub fn new(
        id: ProposalId,
        draft: ProposalDraft,
        proposer: MemberId,
        threshold: ThresholdInfo,
        created_at: Timestamp,
        expires_at: Timestamp,
    ) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            actions: draft.actions,
            proposer,
            created_at,
            expires_at,
            rule: threshold.rule,
            total_power: threshold.total_power,
            votes: Votes::default(),
            approvals: Vec::new(),
            status: ProposalStatus::Open,
        }
    }

    /// The expiration instant itself still accepts votes.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }

    pub fn has_voted(&self, voter: &MemberId) -> bool {
        self.approvals.iter().any(|a| &a.voter == voter)
    }

    pub fn ballot_of(&self, voter: &MemberId) -> Option<&Approval> {
        self.approvals.iter().find(|a| &a.voter == voter)
    }

    /// Append an approval and add its power to the tally.
    pub fn record_approval(
        &mut self,
        voter: MemberId,
        vote: Vote,
        power: u64,
        cast_at: Timestamp,
    ) -> MultisigResult<()> {
        if self.has_voted(&voter) {
            return Err(MultisigError::AlreadyVoted {
                proposal_id: self.id,
                voter,
            });
        }
        self.votes.add_vote(vote, power);
        self.approvals.push(Approval {
            voter,
            vote,
            power,
            cast_at,
        });
        Ok(())
    }

    /// Evaluate the snapshotted rule against the current tally.
    pub fn is_passed(&self, now: Timestamp) -> MultisigResult<bool> {
        threshold::is_passed(
            &self.rule,
            &self.votes,
            self.total_power,
            self.is_expired_at(now),
        )
    }

    pub fn can_still_pass(&self) -> MultisigResult<bool> {
        threshold::can_still_pass(&self.rule, &self.votes, self.total_power)
    }

    pub fn transition(&mut self, next: ProposalStatus) -> MultisigResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(MultisigError::InvalidTransition {
                proposal_id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
