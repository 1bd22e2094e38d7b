//! Votes, tallies, and recorded approvals

use crate::{MemberId, Timestamp};
use serde::{Deserialize, Serialize};

/// A member's choice on a proposal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vote {
    Yes,
    No,
    Abstain,
    Veto,
}

impl std::fmt::Display for Vote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Vote::Yes => "yes",
            Vote::No => "no",
            Vote::Abstain => "abstain",
            Vote::Veto => "veto",
        };
        write!(f, "{}", s)
    }
}

/// Accumulated voting power per vote category
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Votes {
    pub yes: u64,
    pub no: u64,
    pub abstain: u64,
    pub veto: u64,
}

impl Votes {
    /// Tally holding a single yes bucket
    pub fn yes(power: u64) -> Self {
        Self {
            yes: power,
            ..Self::default()
        }
    }

    /// Sum of all cast power
    pub fn total(&self) -> u64 {
        self.yes
            .saturating_add(self.no)
            .saturating_add(self.abstain)
            .saturating_add(self.veto)
    }

    pub fn add_vote(&mut self, vote: Vote, power: u64) {
        let bucket = match vote {
            Vote::Yes => &mut self.yes,
            Vote::No => &mut self.no,
            Vote::Abstain => &mut self.abstain,
            Vote::Veto => &mut self.veto,
        };
        *bucket = bucket.saturating_add(power);
    }

    pub fn power_for(&self, vote: Vote) -> u64 {
        match vote {
            Vote::Yes => self.yes,
            Vote::No => self.no,
            Vote::Abstain => self.abstain,
            Vote::Veto => self.veto,
        }
    }
}

/// One recorded vote on a proposal. Never altered once stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub voter: MemberId,
    pub vote: Vote,
    /// Voter's power at the time the vote was cast
    pub power: u64,
    pub cast_at: Timestamp,
}
