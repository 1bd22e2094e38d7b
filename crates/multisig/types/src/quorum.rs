//! Quorum membership and configuration

use crate::{MemberId, MultisigError, MultisigResult, ThresholdRule};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A quorum member and its voting power
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub power: u64,
}

impl Member {
    pub fn new(id: impl Into<MemberId>, power: u64) -> Self {
        Self {
            id: id.into(),
            power,
        }
    }
}

/// Member set plus the rule proposals are evaluated against
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumConfig {
    pub members: Vec<Member>,
    pub rule: ThresholdRule,
}

impl QuorumConfig {
    pub fn new(members: Vec<Member>, rule: ThresholdRule) -> Self {
        Self { members, rule }
    }

    /// Sum of all member power, saturating
    pub fn total_power(&self) -> u64 {
        self.members
            .iter()
            .fold(0u64, |acc, m| acc.saturating_add(m.power))
    }

    /// Reject empty, duplicated or unsatisfiable configurations.
    pub fn validate(&self) -> MultisigResult<()> {
        if self.members.is_empty() {
            return Err(MultisigError::InvalidConfig("no members".into()));
        }

        let mut seen = BTreeSet::new();
        for member in &self.members {
            if !seen.insert(&member.id) {
                return Err(MultisigError::InvalidConfig(format!(
                    "duplicate member: {}",
                    member.id
                )));
            }
        }

        let total = self.total_power();
        if total == 0 {
            return Err(MultisigError::InvalidConfig(
                "total voting power is zero".into(),
            ));
        }

        self.rule.validate(total)
    }
}
