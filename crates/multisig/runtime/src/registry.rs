//! Quorum Registry - current members and passing rule

use multisig_types::{
    Member, MemberId, MultisigError, MultisigResult, QuorumConfig, ThresholdInfo, ThresholdRule,
};
use std::collections::BTreeMap;
use std::ops::Bound;
use tracing::info;

/// Member set and rule new proposals are created against
#[derive(Clone, Debug)]
pub struct QuorumRegistry {
    members: BTreeMap<MemberId, u64>,
    rule: ThresholdRule,
    total_power: u64,
}

impl QuorumRegistry {
    pub fn new(config: QuorumConfig) -> MultisigResult<Self> {
        config.validate()?;
        let total_power = config.total_power();
        Ok(Self {
            members: config
                .members
                .into_iter()
                .map(|m| (m.id, m.power))
                .collect(),
            rule: config.rule,
            total_power,
        })
    }

    pub fn is_member(&self, id: &MemberId) -> bool {
        self.members.contains_key(id)
    }

    pub fn power_of(&self, id: &MemberId) -> Option<u64> {
        self.members.get(id).copied()
    }

    pub fn total_power(&self) -> u64 {
        self.total_power
    }

    pub fn rule(&self) -> &ThresholdRule {
        &self.rule
    }

    pub fn threshold(&self) -> ThresholdInfo {
        ThresholdInfo {
            rule: self.rule.clone(),
            total_power: self.total_power,
        }
    }

    /// Members ordered by id
    pub fn members(&self) -> Vec<Member> {
        self.members
            .iter()
            .map(|(id, power)| Member {
                id: id.clone(),
                power: *power,
            })
            .collect()
    }

    /// Members with ids strictly after `start_after`
    pub fn voters(&self, start_after: Option<&MemberId>, limit: usize) -> Vec<Member> {
        let lower = match start_after {
            Some(id) => Bound::Excluded(id),
            None => Bound::Unbounded,
        };
        self.members
            .range::<MemberId, _>((lower, Bound::Unbounded))
            .take(limit)
            .map(|(id, power)| Member {
                id: id.clone(),
                power: *power,
            })
            .collect()
    }

    pub fn config(&self) -> QuorumConfig {
        QuorumConfig::new(self.members(), self.rule.clone())
    }

    /// Replace members and rule wholesale. Existing proposals keep their
    /// snapshots.
    pub(crate) fn update_quorum(&mut self, members: Vec<Member>, rule: ThresholdRule) -> MultisigResult<()> {
        let replacement = Self::new(QuorumConfig::new(members, rule))?;
        *self = replacement;
        info!(
            members = self.members.len(),
            total_power = self.total_power,
            rule = %self.rule,
            "Quorum updated"
        );
        Ok(())
    }
}

/// Validate a prospective quorum without building it.
pub(crate) fn check_quorum(members: &[Member], rule: &ThresholdRule) -> MultisigResult<()> {
    QuorumConfig::new(members.to_vec(), rule.clone())
        .validate()
        .map_err(|err| match err {
            MultisigError::InvalidConfig(msg) => {
                MultisigError::InvalidConfig(format!("quorum update rejected: {}", msg))
            }
            other => other,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use multisig_types::Percentage;

    fn registry() -> QuorumRegistry {
        QuorumRegistry::new(QuorumConfig::new(
            vec![
                Member::new("carol", 3),
                Member::new("alice", 1),
                Member::new("bob", 2),
            ],
            ThresholdRule::absolute_count(3),
        ))
        .unwrap()
    }

    #[test]
    fn test_lookup() {
        let registry = registry();
        assert!(registry.is_member(&MemberId::new("bob")));
        assert!(!registry.is_member(&MemberId::new("mallory")));
        assert_eq!(registry.power_of(&MemberId::new("carol")), Some(3));
        assert_eq!(registry.power_of(&MemberId::new("mallory")), None);
        assert_eq!(registry.total_power(), 6);
    }

    #[test]
    fn test_members_sorted_by_id() {
        let ids: Vec<_> = registry()
            .members()
            .into_iter()
            .map(|m| m.id.0)
            .collect();
        assert_eq!(ids, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_voters_pagination() {
        let registry = registry();
        let page = registry.voters(None, 2);
        assert_eq!(page.len(), 2);
        assert_eq!(page[1].id, MemberId::new("bob"));

        let rest = registry.voters(Some(&MemberId::new("bob")), 10);
        assert_eq!(rest, vec![Member::new("carol", 3)]);

        assert!(registry.voters(Some(&MemberId::new("zed")), 10).is_empty());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = QuorumRegistry::new(QuorumConfig::new(
            vec![Member::new("alice", 1)],
            ThresholdRule::absolute_count(2),
        ));
        assert!(matches!(result, Err(MultisigError::InvalidConfig(_))));
    }

    #[test]
    fn test_update_quorum_replaces_wholesale() {
        let mut registry = registry();
        registry
            .update_quorum(
                vec![Member::new("dave", 5)],
                ThresholdRule::absolute_percentage(Percentage::ONE),
            )
            .unwrap();
        assert!(!registry.is_member(&MemberId::new("alice")));
        assert_eq!(registry.total_power(), 5);
        assert_eq!(
            registry.threshold().rule,
            ThresholdRule::absolute_percentage(Percentage::ONE)
        );
    }

    #[test]
    fn test_failed_update_leaves_registry_intact() {
        let mut registry = registry();
        let err = registry
            .update_quorum(vec![], ThresholdRule::absolute_count(1))
            .unwrap_err();
        assert!(matches!(err, MultisigError::InvalidConfig(_)));
        assert_eq!(registry.total_power(), 6);
    }

    #[test]
    fn test_check_quorum_prefixes_message() {
        let err = check_quorum(&[], &ThresholdRule::absolute_count(1)).unwrap_err();
        assert!(err.to_string().contains("quorum update rejected"));
    }
}
