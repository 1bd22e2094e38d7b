//! Multisig Engine - proposal lifecycle behind a single lock
//!
//! Every mutating operation takes the write lock for its whole duration,
//! including the synchronous call into the [`ActionSink`]. Duplicate vote
//! and threshold checks therefore never race. Reads take the read lock and
//! return owned snapshots.
//!
//! Expiration is evaluated lazily: a proposal past its deadline is moved to
//! `Expired` by the next operation that touches it.

use crate::collaborators::{ActionSink, Clock, IdentitySource};
use crate::config::{EngineConfig, ListingConfig, VotingConfig};
use crate::journal::{AuditJournal, JournalEvent, JournalEventKind};
use crate::registry::{check_quorum, QuorumRegistry};
use crate::store::ProposalStore;
use multisig_types::{
    Action, Approval, Member, MemberId, MultisigError, MultisigResult, Proposal, ProposalDraft,
    ProposalId, ProposalStatus, QuorumConfig, ThresholdInfo, Timestamp, Vote,
};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

struct EngineState {
    registry: QuorumRegistry,
    store: ProposalStore,
    journal: AuditJournal,
}

/// The multisig approval engine
pub struct MultisigEngine {
    state: RwLock<EngineState>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn ActionSink>,
    voting: VotingConfig,
    listing: ListingConfig,
}

impl MultisigEngine {
    pub fn new(
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn ActionSink>,
    ) -> MultisigResult<Self> {
        config.validate()?;
        let registry = QuorumRegistry::new(config.quorum)?;

        info!(
            members = registry.members().len(),
            total_power = registry.total_power(),
            rule = %registry.rule(),
            "Multisig engine initialized"
        );

        Ok(Self {
            state: RwLock::new(EngineState {
                registry,
                store: ProposalStore::new(),
                journal: AuditJournal::new(),
            }),
            clock,
            sink,
            voting: config.voting,
            listing: config.listing,
        })
    }

    /// Engine with default voting and listing limits
    pub fn with_quorum(
        quorum: QuorumConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn ActionSink>,
    ) -> MultisigResult<Self> {
        Self::new(EngineConfig::new(quorum), clock, sink)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Create a proposal. `expires_at = None` uses the default voting
    /// period.
    pub fn create_proposal(
        &self,
        caller: &impl IdentitySource,
        draft: ProposalDraft,
        expires_at: Option<Timestamp>,
    ) -> MultisigResult<ProposalId> {
        let mut guard = self.write()?;
        let now = self.clock.now();
        let state = &mut *guard;

        let (proposer, _) = authorize(&state.registry, caller)?;
        let expires_at = self.resolve_expiration(now, expires_at)?;
        validate_governed_actions(&draft.actions)?;

        let threshold = state.registry.threshold();
        let id = state.store.create(|id| {
            Proposal::new(id, draft, proposer.clone(), threshold, now, expires_at)
        });

        state
            .journal
            .record(id, &proposer, JournalEventKind::Created, now);
        info!(
            proposal_id = %id,
            proposer = %proposer,
            expires_at = %expires_at,
            "Proposal created"
        );

        Ok(id)
    }

    /// Cast `caller`'s vote and return the resulting status.
    ///
    /// With `auto_execute`, a proposal that ends up `Passed` is executed in
    /// the same transaction. If execution fails the vote stands, the proposal
    /// stays `Passed` and the execution error is returned.
    pub fn approve(
        &self,
        caller: &impl IdentitySource,
        id: ProposalId,
        vote: Vote,
        auto_execute: bool,
    ) -> MultisigResult<ProposalStatus> {
        let mut guard = self.write()?;
        let now = self.clock.now();
        let state = &mut *guard;

        state.store.get(id)?;
        let (voter, power) = authorize(&state.registry, caller)?;
        let proposal = state.store.get_mut(id)?;

        if proposal.has_voted(&voter) {
            return Err(MultisigError::AlreadyVoted {
                proposal_id: id,
                voter,
            });
        }
        if proposal.status.is_terminal() {
            return Err(MultisigError::ProposalClosed {
                proposal_id: id,
                status: proposal.status,
            });
        }

        if proposal.is_expired_at(now) {
            proposal.transition(ProposalStatus::Expired)?;
            state
                .journal
                .record(id, &voter, JournalEventKind::Expired, now);
            info!(proposal_id = %id, "Proposal expired; vote not recorded");
            return Ok(ProposalStatus::Expired);
        }

        proposal.record_approval(voter.clone(), vote, power, now)?;
        state
            .journal
            .record(id, &voter, JournalEventKind::VoteCast { vote, power }, now);
        debug!(
            proposal_id = %id,
            voter = %voter,
            vote = %vote,
            power = power,
            yes = proposal.votes.yes,
            "Vote recorded"
        );

        if proposal.status == ProposalStatus::Open && proposal.is_passed(now)? {
            proposal.transition(ProposalStatus::Passed)?;
            state
                .journal
                .record(id, &voter, JournalEventKind::Passed, now);
            info!(proposal_id = %id, "Proposal passed");
        }

        let status = proposal.status;
        if auto_execute && status == ProposalStatus::Passed {
            return self.execute_locked(state, id, &voter, now).map_err(|err| {
                warn!(
                    proposal_id = %id,
                    error = %err,
                    "Auto-execution failed; vote stands and proposal remains passed"
                );
                err
            });
        }

        Ok(status)
    }

    /// Hand a passed proposal's actions to the sink.
    pub fn execute(
        &self,
        caller: &impl IdentitySource,
        id: ProposalId,
    ) -> MultisigResult<ProposalStatus> {
        let mut guard = self.write()?;
        let now = self.clock.now();
        let state = &mut *guard;

        state.store.get(id)?;
        let (actor, _) = authorize(&state.registry, caller)?;
        self.execute_locked(state, id, &actor, now)
    }

    /// Settle a proposal that can no longer change outcome.
    ///
    /// Expired proposals become `Expired`; open proposals that cannot reach
    /// the threshold even with every outstanding vote become `Rejected`.
    pub fn close(
        &self,
        caller: &impl IdentitySource,
        id: ProposalId,
    ) -> MultisigResult<ProposalStatus> {
        let mut guard = self.write()?;
        let now = self.clock.now();
        let state = &mut *guard;

        state.store.get(id)?;
        let (actor, _) = authorize(&state.registry, caller)?;
        let proposal = state.store.get_mut(id)?;

        if proposal.status.is_terminal() {
            return Err(MultisigError::ProposalClosed {
                proposal_id: id,
                status: proposal.status,
            });
        }

        let (next, kind) = if proposal.is_expired_at(now) {
            (ProposalStatus::Expired, JournalEventKind::Expired)
        } else if proposal.status == ProposalStatus::Passed {
            return Err(MultisigError::NotClosable {
                proposal_id: id,
                reason: "proposal has passed and awaits execution".into(),
            });
        } else if !proposal.can_still_pass()? {
            (ProposalStatus::Rejected, JournalEventKind::Rejected)
        } else {
            return Err(MultisigError::NotClosable {
                proposal_id: id,
                reason: "proposal is open and can still pass".into(),
            });
        };

        proposal.transition(next)?;
        state.journal.record(id, &actor, kind, now);
        info!(proposal_id = %id, status = %next, "Proposal closed");

        Ok(next)
    }

    fn execute_locked(
        &self,
        state: &mut EngineState,
        id: ProposalId,
        actor: &MemberId,
        now: Timestamp,
    ) -> MultisigResult<ProposalStatus> {
        let proposal = state.store.get_mut(id)?;

        if proposal.status != ProposalStatus::Passed {
            return Err(MultisigError::NotExecutable {
                proposal_id: id,
                status: proposal.status,
            });
        }

        if proposal.is_expired_at(now) {
            proposal.transition(ProposalStatus::Expired)?;
            state
                .journal
                .record(id, actor, JournalEventKind::Expired, now);
            info!(proposal_id = %id, "Proposal expired before execution");
            return Ok(ProposalStatus::Expired);
        }

        validate_governed_actions(&proposal.actions)?;

        if let Err(source) = self.sink.run_actions(id, &proposal.actions) {
            warn!(proposal_id = %id, error = %source, "Action sink failed");
            state.journal.record(
                id,
                actor,
                JournalEventKind::ExecutionFailed {
                    reason: source.to_string(),
                },
                now,
            );
            return Err(MultisigError::ExecutionFailed {
                proposal_id: id,
                source,
            });
        }

        for action in &proposal.actions {
            if let Action::UpdateQuorum { members, rule } = action {
                state.registry.update_quorum(members.clone(), rule.clone())?;
                state.journal.record(
                    id,
                    actor,
                    JournalEventKind::QuorumUpdated {
                        total_power: state.registry.total_power(),
                    },
                    now,
                );
            }
        }

        proposal.transition(ProposalStatus::Executed)?;
        state
            .journal
            .record(id, actor, JournalEventKind::Executed, now);
        info!(
            proposal_id = %id,
            actions = proposal.actions.len(),
            "Proposal executed"
        );

        Ok(ProposalStatus::Executed)
    }

    fn resolve_expiration(
        &self,
        now: Timestamp,
        requested: Option<Timestamp>,
    ) -> MultisigResult<Timestamp> {
        let latest = now.plus_secs(self.voting.max_voting_period_secs);
        match requested {
            None => Ok(now.plus_secs(self.voting.default_voting_period_secs)),
            Some(at) if at <= now => Err(MultisigError::InvalidExpiration(format!(
                "expiration {} is not after now ({})",
                at, now
            ))),
            Some(at) if at > latest => Err(MultisigError::InvalidExpiration(format!(
                "expiration {} exceeds the maximum voting period (latest {})",
                at, latest
            ))),
            Some(at) => Ok(at),
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn get_proposal(&self, id: ProposalId) -> MultisigResult<Proposal> {
        Ok(self.read()?.store.get(id)?.clone())
    }

    /// Proposals after `start_after`, ascending by id
    pub fn list_proposals(
        &self,
        start_after: Option<u64>,
        limit: Option<u32>,
    ) -> MultisigResult<Vec<Proposal>> {
        let limit = self.page_limit(limit)?;
        self.read()?.store.list(start_after.unwrap_or(0), limit)
    }

    /// Proposals before `start_before`, descending by id
    pub fn reverse_proposals(
        &self,
        start_before: Option<u64>,
        limit: Option<u32>,
    ) -> MultisigResult<Vec<Proposal>> {
        let limit = self.page_limit(limit)?;
        self.read()?.store.reverse(start_before, limit)
    }

    pub fn proposal_count(&self) -> MultisigResult<usize> {
        Ok(self.read()?.store.len())
    }

    /// Current rule and total power
    pub fn threshold(&self) -> MultisigResult<ThresholdInfo> {
        Ok(self.read()?.registry.threshold())
    }

    pub fn quorum(&self) -> MultisigResult<QuorumConfig> {
        Ok(self.read()?.registry.config())
    }

    /// Power of `id` in the current quorum, if a member
    pub fn voter(&self, id: &MemberId) -> MultisigResult<Option<u64>> {
        Ok(self.read()?.registry.power_of(id))
    }

    pub fn list_voters(
        &self,
        start_after: Option<&MemberId>,
        limit: Option<u32>,
    ) -> MultisigResult<Vec<Member>> {
        let limit = self.page_limit(limit)?;
        Ok(self.read()?.registry.voters(start_after, limit))
    }

    pub fn get_vote(&self, id: ProposalId, voter: &MemberId) -> MultisigResult<Option<Approval>> {
        Ok(self.read()?.store.get(id)?.ballot_of(voter).cloned())
    }

    /// Approvals on a proposal ordered by voter id
    pub fn list_votes(
        &self,
        id: ProposalId,
        start_after: Option<&MemberId>,
        limit: Option<u32>,
    ) -> MultisigResult<Vec<Approval>> {
        let limit = self.page_limit(limit)?;
        let state = self.read()?;
        let mut approvals: Vec<Approval> = state
            .store
            .get(id)?
            .approvals
            .iter()
            .filter(|a| start_after.map_or(true, |after| &a.voter > after))
            .cloned()
            .collect();
        approvals.sort_by(|a, b| a.voter.cmp(&b.voter));
        approvals.truncate(limit);
        Ok(approvals)
    }

    pub fn journal(&self) -> MultisigResult<Vec<JournalEvent>> {
        Ok(self.read()?.journal.events().to_vec())
    }

    pub fn journal_for(&self, id: ProposalId) -> MultisigResult<Vec<JournalEvent>> {
        Ok(self.read()?.journal.events_for(id))
    }

    fn page_limit(&self, limit: Option<u32>) -> MultisigResult<usize> {
        match limit {
            Some(0) => Err(MultisigError::InvalidRange("limit must be positive".into())),
            Some(n) => Ok(n.min(self.listing.max_limit) as usize),
            None => Ok(self.listing.default_limit as usize),
        }
    }

    fn read(&self) -> MultisigResult<RwLockReadGuard<'_, EngineState>> {
        self.state.read().map_err(|_| MultisigError::LockPoisoned)
    }

    fn write(&self) -> MultisigResult<RwLockWriteGuard<'_, EngineState>> {
        self.state.write().map_err(|_| MultisigError::LockPoisoned)
    }
}

/// Resolve the caller to a current member, rejecting relayed calls.
fn authorize(
    registry: &QuorumRegistry,
    caller: &impl IdentitySource,
) -> MultisigResult<(MemberId, u64)> {
    let ctx = caller.caller();
    if !ctx.is_direct() {
        return Err(MultisigError::Unauthorized(format!(
            "{} cannot act on behalf of {}",
            ctx.immediate, ctx.origin
        )));
    }
    match registry.power_of(&ctx.origin) {
        Some(power) => Ok((ctx.origin, power)),
        None => Err(MultisigError::Unauthorized(format!(
            "{} is not a quorum member",
            ctx.origin
        ))),
    }
}

fn validate_governed_actions(actions: &[Action]) -> MultisigResult<()> {
    for action in actions {
        if let Action::UpdateQuorum { members, rule } = action {
            check_quorum(members, rule)?;
        }
    }
    Ok(())
}
