//! Threshold rules and quorum arithmetic
//!
//! A [`ThresholdRule`] decides whether a vote tally authorizes a proposal.
//! Evaluation is pure: the same rule, tally, total power and expiry flag
//! always give the same answer.

use crate::{MultisigError, MultisigResult, Percentage, Votes, PRECISION_FACTOR};
use serde::{Deserialize, Serialize};

/// Passing rule captured by every proposal at creation time
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThresholdRule {
    /// A fixed amount of yes power is needed to pass
    AbsoluteCount {
        /// Minimum yes power
        weight: u64,
    },

    /// A share of the total power, minus abstentions, must vote yes
    AbsolutePercentage {
        /// Share of `total - abstain` that must vote yes
        percentage: Percentage,
    },

    /// A share of the total power must participate before the yes share
    /// is considered at all
    ThresholdQuorum {
        /// Share of the opinions that must be yes
        threshold: Percentage,
        /// Share of the total power that must cast any vote
        quorum: Percentage,
    },
}

impl ThresholdRule {
    pub fn absolute_count(weight: u64) -> Self {
        Self::AbsoluteCount { weight }
    }

    pub fn absolute_percentage(percentage: Percentage) -> Self {
        Self::AbsolutePercentage { percentage }
    }

    pub fn threshold_quorum(threshold: Percentage, quorum: Percentage) -> Self {
        Self::ThresholdQuorum { threshold, quorum }
    }

    /// Check the rule is satisfiable against a quorum of `total_power`.
    pub fn validate(&self, total_power: u64) -> MultisigResult<()> {
        if total_power == 0 {
            return Err(MultisigError::InvalidConfig("total power is zero".into()));
        }
        match self {
            ThresholdRule::AbsoluteCount { weight } => {
                if *weight == 0 {
                    return Err(MultisigError::InvalidConfig(
                        "absolute count weight must be at least 1".into(),
                    ));
                }
                if *weight > total_power {
                    return Err(MultisigError::InvalidConfig(format!(
                        "unreachable weight: {} required, {} available",
                        weight, total_power
                    )));
                }
            }
            ThresholdRule::AbsolutePercentage { percentage } => {
                require_nonzero("percentage", *percentage)?;
            }
            ThresholdRule::ThresholdQuorum { threshold, quorum } => {
                require_nonzero("threshold", *threshold)?;
                require_nonzero("quorum", *quorum)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for ThresholdRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThresholdRule::AbsoluteCount { weight } => write!(f, "absolute count {}", weight),
            ThresholdRule::AbsolutePercentage { percentage } => {
                write!(f, "absolute percentage {}", percentage)
            }
            ThresholdRule::ThresholdQuorum { threshold, quorum } => {
                write!(f, "threshold {} with quorum {}", threshold, quorum)
            }
        }
    }
}

fn require_nonzero(name: &str, value: Percentage) -> MultisigResult<()> {
    if value.is_zero() {
        return Err(MultisigError::InvalidConfig(format!(
            "{} must be greater than zero",
            name
        )));
    }
    Ok(())
}

/// Power needed to reach `percentage` of `weight`, rounded up.
///
/// Half of 15 needs 8, not 7. Computed as
/// `(parts * weight + PRECISION_FACTOR - 1) / PRECISION_FACTOR`.
pub fn votes_needed(weight: u64, percentage: Percentage) -> u64 {
    let precision = u128::from(PRECISION_FACTOR);
    let applied = u128::from(percentage.parts()) * u128::from(weight);
    // percentage <= 1, so the result never exceeds weight
    ((applied + precision - 1) / precision) as u64
}

/// Whether `votes` satisfies `rule` for a proposal that snapshotted
/// `total_power` at creation.
///
/// An empty eligible base (everyone abstained) never passes a percentage
/// rule.
pub fn is_passed(
    rule: &ThresholdRule,
    votes: &Votes,
    total_power: u64,
    is_expired: bool,
) -> MultisigResult<bool> {
    if total_power == 0 {
        return Err(MultisigError::InvalidConfig(
            "cannot evaluate a proposal with zero total power".into(),
        ));
    }

    let passed = match rule {
        ThresholdRule::AbsoluteCount { weight } => votes.yes >= *weight,
        ThresholdRule::AbsolutePercentage { percentage } => {
            meets(votes.yes, total_power.saturating_sub(votes.abstain), *percentage)
        }
        ThresholdRule::ThresholdQuorum { threshold, quorum } => {
            if votes.total() < votes_needed(total_power, *quorum) {
                false
            } else if is_expired {
                // Only the opinions actually cast count once voting has closed
                let opinions = votes.total().saturating_sub(votes.abstain);
                meets(votes.yes, opinions, *threshold)
            } else {
                // Outstanding power may still vote no
                let possible_opinions = total_power.saturating_sub(votes.abstain);
                meets(votes.yes, possible_opinions, *threshold)
            }
        }
    };
    Ok(passed)
}

/// Whether the proposal could still pass if every uncast unit of power
/// voted yes.
pub fn can_still_pass(rule: &ThresholdRule, votes: &Votes, total_power: u64) -> MultisigResult<bool> {
    let outstanding = total_power.saturating_sub(votes.total());
    let optimistic = Votes {
        yes: votes.yes.saturating_add(outstanding),
        ..*votes
    };
    is_passed(rule, &optimistic, total_power, false)
}

fn meets(yes: u64, base: u64, percentage: Percentage) -> bool {
    base > 0 && yes >= votes_needed(base, percentage)
}
