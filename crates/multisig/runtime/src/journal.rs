//! Audit journal - append-only record of lifecycle events

use multisig_types::{MemberId, ProposalId, Timestamp, Vote};
use serde::{Deserialize, Serialize};

/// What happened
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JournalEventKind {
    Created,
    VoteCast { vote: Vote, power: u64 },
    Passed,
    Executed,
    ExecutionFailed { reason: String },
    Expired,
    Rejected,
    QuorumUpdated { total_power: u64 },
}

/// A single journal entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEvent {
    pub event_id: String,
    pub proposal_id: ProposalId,
    pub actor: MemberId,
    #[serde(flatten)]
    pub kind: JournalEventKind,
    pub at: Timestamp,
}

#[derive(Clone, Debug, Default)]
pub struct AuditJournal {
    events: Vec<JournalEvent>,
}

impl AuditJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        proposal_id: ProposalId,
        actor: &MemberId,
        kind: JournalEventKind,
        at: Timestamp,
    ) {
        self.events.push(JournalEvent {
            event_id: uuid::Uuid::new_v4().to_string(),
            proposal_id,
            actor: actor.clone(),
            kind,
            at,
        });
    }

    pub fn events(&self) -> &[JournalEvent] {
        &self.events
    }

    pub fn events_for(&self, proposal_id: ProposalId) -> Vec<JournalEvent> {
        self.events
            .iter()
            .filter(|e| e.proposal_id == proposal_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
