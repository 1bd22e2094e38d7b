//! Proposal Store - ordered, append-only proposal collection
//!
//! Proposals are stored densely: proposal `n` lives at index `n - 1`, so
//! ids are assigned sequentially from 1 and never reused.

use multisig_types::{MultisigError, MultisigResult, Proposal, ProposalId};

#[derive(Clone, Debug, Default)]
pub struct ProposalStore {
    proposals: Vec<Proposal>,
}

impl ProposalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn next_id(&self) -> ProposalId {
        ProposalId(self.proposals.len() as u64 + 1)
    }

    /// Allocate the next id and store the proposal built for it.
    pub fn create(&mut self, build: impl FnOnce(ProposalId) -> Proposal) -> ProposalId {
        let id = self.next_id();
        self.proposals.push(build(id));
        id
    }

    pub fn get(&self, id: ProposalId) -> MultisigResult<&Proposal> {
        self.index_of(id)
            .and_then(|idx| self.proposals.get(idx))
            .ok_or(MultisigError::NotFound(id))
    }

    pub fn get_mut(&mut self, id: ProposalId) -> MultisigResult<&mut Proposal> {
        self.index_of(id)
            .and_then(|idx| self.proposals.get_mut(idx))
            .ok_or(MultisigError::NotFound(id))
    }

    /// Proposals with ids greater than `start_after`, ascending.
    pub fn list(&self, start_after: u64, limit: usize) -> MultisigResult<Vec<Proposal>> {
        let len = self.proposals.len() as u64;
        if start_after > len {
            return Err(MultisigError::InvalidRange(format!(
                "start_after {} is beyond the last proposal {}",
                start_after, len
            )));
        }
        Ok(self
            .proposals
            .iter()
            .skip(start_after as usize)
            .take(limit)
            .cloned()
            .collect())
    }

    /// Proposals with ids less than `start_before`, descending. `None`
    /// starts from the newest proposal.
    pub fn reverse(&self, start_before: Option<u64>, limit: usize) -> MultisigResult<Vec<Proposal>> {
        let len = self.proposals.len() as u64;
        let end = match start_before {
            None => len,
            Some(0) => {
                return Err(MultisigError::InvalidRange(
                    "start_before must be at least 1".into(),
                ))
            }
            Some(before) if before > len + 1 => {
                return Err(MultisigError::InvalidRange(format!(
                    "start_before {} is beyond the last proposal {}",
                    before, len
                )))
            }
            Some(before) => before - 1,
        };
        Ok(self.proposals[..end as usize]
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    fn index_of(&self, id: ProposalId) -> Option<usize> {
        id.value().checked_sub(1).map(|idx| idx as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multisig_types::{
        MemberId, ProposalDraft, ThresholdInfo, ThresholdRule, Timestamp,
    };

    fn store_with(n: usize) -> ProposalStore {
        let mut store = ProposalStore::new();
        for i in 0..n {
            store.create(|id| {
                Proposal::new(
                    id,
                    ProposalDraft::new(format!("p{}", i + 1), ""),
                    MemberId::new("alice"),
                    ThresholdInfo {
                        rule: ThresholdRule::absolute_count(1),
                        total_power: 1,
                    },
                    Timestamp(0),
                    Timestamp(100),
                )
            });
        }
        store
    }

    fn ids(page: &[Proposal]) -> Vec<u64> {
        page.iter().map(|p| p.id.value()).collect()
    }

    #[test]
    fn test_ids_are_sequential() {
        let store = store_with(3);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(ProposalId(2)).unwrap().title, "p2");
        assert_eq!(store.next_id(), ProposalId(4));
    }

    #[test]
    fn test_get_unknown() {
        let store = store_with(2);
        assert_eq!(
            store.get(ProposalId(3)).unwrap_err(),
            MultisigError::NotFound(ProposalId(3))
        );
        assert!(store.get(ProposalId(0)).is_err());
    }

    #[test]
    fn test_list_pages() {
        let store = store_with(5);
        assert_eq!(ids(&store.list(0, 2).unwrap()), vec![1, 2]);
        assert_eq!(ids(&store.list(2, 10).unwrap()), vec![3, 4, 5]);
        assert!(store.list(5, 10).unwrap().is_empty());
    }

    #[test]
    fn test_list_beyond_end_is_invalid() {
        let store = store_with(3);
        assert!(matches!(
            store.list(5, 10),
            Err(MultisigError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_reverse_pages() {
        let store = store_with(5);
        assert_eq!(ids(&store.reverse(None, 2).unwrap()), vec![5, 4]);
        assert_eq!(ids(&store.reverse(Some(4), 10).unwrap()), vec![3, 2, 1]);
        assert_eq!(ids(&store.reverse(Some(6), 1).unwrap()), vec![5]);
        assert!(store.reverse(Some(1), 10).unwrap().is_empty());
    }

    #[test]
    fn test_reverse_out_of_range() {
        let store = store_with(3);
        assert!(store.reverse(Some(0), 10).is_err());
        assert!(store.reverse(Some(5), 10).is_err());
    }
}
