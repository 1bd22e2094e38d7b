//! Injected collaborators: caller identity, time, and action execution

use multisig_types::{Action, ExecutionError, MemberId, ProposalId, Timestamp};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;

/// Authenticated identity of the party invoking an operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallerContext {
    /// Identity that authenticated the request
    pub origin: MemberId,
    /// Identity that actually made the call, if relayed
    pub immediate: MemberId,
}

impl CallerContext {
    /// A call made directly by `id`
    pub fn direct(id: impl Into<MemberId>) -> Self {
        let id = id.into();
        Self {
            origin: id.clone(),
            immediate: id,
        }
    }

    /// A call authenticated as `origin` but submitted by `immediate`
    pub fn relayed(origin: impl Into<MemberId>, immediate: impl Into<MemberId>) -> Self {
        Self {
            origin: origin.into(),
            immediate: immediate.into(),
        }
    }

    pub fn is_direct(&self) -> bool {
        self.origin == self.immediate
    }
}

/// Capability that yields the caller of the current operation
pub trait IdentitySource {
    fn caller(&self) -> CallerContext;
}

impl IdentitySource for CallerContext {
    fn caller(&self) -> CallerContext {
        self.clone()
    }
}

impl IdentitySource for MemberId {
    fn caller(&self) -> CallerContext {
        CallerContext::direct(self.clone())
    }
}

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock backed by chrono
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_datetime(chrono::Utc::now())
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start.as_secs()),
        }
    }

    pub fn set(&self, at: Timestamp) {
        self.now.store(at.as_secs(), Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) -> Timestamp {
        let prev = self
            .now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| {
                Some(t.saturating_add(secs))
            })
            .unwrap_or_else(|t| t);
        Timestamp(prev.saturating_add(secs))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.load(Ordering::SeqCst))
    }
}

/// Receives the action list of a passed proposal.
///
/// Called synchronously while the engine holds its write lock; it must
/// not call back into the engine.
pub trait ActionSink: Send + Sync {
    fn run_actions(&self, proposal_id: ProposalId, actions: &[Action])
        -> Result<(), ExecutionError>;
}

/// Sink that accepts everything and does nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl ActionSink for NoopSink {
    fn run_actions(&self, _: ProposalId, _: &[Action]) -> Result<(), ExecutionError> {
        Ok(())
    }
}

/// Sink that records every successful run and can be told to fail
#[derive(Debug, Default)]
pub struct RecordingSink {
    executed: Mutex<Vec<(ProposalId, Vec<Action>)>>,
    failures_left: AtomicU32,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` runs
    pub fn fail_next(&self, n: u32) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    /// Successful runs in order
    pub fn executed(&self) -> Vec<(ProposalId, Vec<Action>)> {
        match self.executed.lock() {
            Ok(log) => log.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ActionSink for RecordingSink {
    fn run_actions(
        &self,
        proposal_id: ProposalId,
        actions: &[Action],
    ) -> Result<(), ExecutionError> {
        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(ExecutionError::new(format!(
                "sink rejected proposal {}",
                proposal_id
            )));
        }

        let mut log = self
            .executed
            .lock()
            .map_err(|_| ExecutionError::new("recording sink poisoned"))?;
        log.push((proposal_id, actions.to_vec()));
        Ok(())
    }
}
