//! Scenario replay against an in-memory engine
//!
//! A scenario is a TOML file of timed steps. Each step names a caller and
//! an operation; the clock is moved to `start + at` before the step runs.
//! Operation failures are part of the outcome, not fatal to the replay.

use crate::error::{CliError, CliResult};
use multisig_runtime::{
    CallerContext, EngineConfig, JournalEvent, ManualClock, MultisigEngine, RecordingSink,
};
use multisig_types::{
    Action, MemberId, Proposal, ProposalDraft, ProposalId, ProposalStatus, QuorumConfig,
    Timestamp, Vote,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// A replayable sequence of operations
#[derive(Clone, Debug, Deserialize)]
pub struct Scenario {
    /// Clock value at offset zero, in Unix seconds
    #[serde(default)]
    pub start: u64,

    #[serde(default)]
    pub sink: SinkSettings,

    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_toml_str(raw: &str) -> CliResult<Self> {
        Ok(toml::from_str(raw)?)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SinkSettings {
    /// Number of sink runs that fail before it starts accepting
    #[serde(default)]
    pub fail_first: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Step {
    /// Seconds after `start`
    #[serde(default)]
    pub at: u64,

    pub caller: String,

    /// Submit on behalf of `caller` through another identity
    #[serde(default)]
    pub relayer: Option<String>,

    #[serde(flatten)]
    pub op: Operation,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Propose {
        title: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        actions: Vec<Action>,
        /// Seconds until expiration; the configured default when absent
        #[serde(default)]
        expires_in: Option<u64>,
    },
    Vote {
        proposal: u64,
        vote: Vote,
        #[serde(default)]
        auto_execute: bool,
    },
    Execute {
        proposal: u64,
    },
    Close {
        proposal: u64,
    },
}

impl Operation {
    fn name(&self) -> &'static str {
        match self {
            Operation::Propose { .. } => "propose",
            Operation::Vote { .. } => "vote",
            Operation::Execute { .. } => "execute",
            Operation::Close { .. } => "close",
        }
    }
}

/// Result of one step
#[derive(Clone, Debug, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub at: Timestamp,
    pub caller: MemberId,
    pub op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposal_id: Option<ProposalId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProposalStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final state after a replay
#[derive(Clone, Debug, Serialize)]
pub struct SimulationReport {
    pub steps: Vec<StepOutcome>,
    pub proposals: Vec<Proposal>,
    pub quorum: QuorumConfig,
    pub journal: Vec<JournalEvent>,
}

/// Replay `scenario` against a fresh engine built from `config`.
pub fn run_scenario(config: EngineConfig, scenario: &Scenario) -> CliResult<SimulationReport> {
    let start = Timestamp::from_secs(scenario.start);
    let clock = Arc::new(ManualClock::new(start));
    let sink = Arc::new(RecordingSink::new());
    sink.fail_next(scenario.sink.fail_first);
    let engine = MultisigEngine::new(config, clock.clone(), sink.clone())?;

    let mut outcomes = Vec::with_capacity(scenario.steps.len());
    let mut last_at = 0;
    for (index, step) in scenario.steps.iter().enumerate() {
        if step.at < last_at {
            return Err(CliError::InvalidInput(format!(
                "step {} at +{}s moves time backwards (previous step at +{}s)",
                index, step.at, last_at
            )));
        }
        last_at = step.at;

        let now = start.plus_secs(step.at);
        clock.set(now);
        let outcome = run_step(&engine, index, now, step);
        debug!(
            step = index,
            op = outcome.op,
            ok = outcome.error.is_none(),
            "Scenario step replayed"
        );
        outcomes.push(outcome);
    }

    let report = SimulationReport {
        steps: outcomes,
        proposals: all_proposals(&engine)?,
        quorum: engine.quorum()?,
        journal: engine.journal()?,
    };
    info!(
        steps = report.steps.len(),
        proposals = report.proposals.len(),
        executed = sink.executed().len(),
        "Scenario complete"
    );
    Ok(report)
}

fn run_step(engine: &MultisigEngine, index: usize, now: Timestamp, step: &Step) -> StepOutcome {
    let caller = match &step.relayer {
        Some(relayer) => CallerContext::relayed(step.caller.as_str(), relayer.as_str()),
        None => CallerContext::direct(step.caller.as_str()),
    };

    let result = match &step.op {
        Operation::Propose {
            title,
            description,
            actions,
            expires_in,
        } => {
            let draft = ProposalDraft {
                title: title.clone(),
                description: description.clone(),
                actions: actions.clone(),
            };
            let expires_at = expires_in.map(|secs| now.plus_secs(secs));
            engine
                .create_proposal(&caller, draft, expires_at)
                .map(|id| (id, ProposalStatus::Open))
        }
        Operation::Vote {
            proposal,
            vote,
            auto_execute,
        } => {
            let id = ProposalId::new(*proposal);
            engine
                .approve(&caller, id, *vote, *auto_execute)
                .map(|status| (id, status))
        }
        Operation::Execute { proposal } => {
            let id = ProposalId::new(*proposal);
            engine.execute(&caller, id).map(|status| (id, status))
        }
        Operation::Close { proposal } => {
            let id = ProposalId::new(*proposal);
            engine.close(&caller, id).map(|status| (id, status))
        }
    };

    let mut outcome = StepOutcome {
        index,
        at: now,
        caller: MemberId::new(step.caller.as_str()),
        op: step.op.name(),
        proposal_id: None,
        status: None,
        error: None,
    };
    match result {
        Ok((id, status)) => {
            outcome.proposal_id = Some(id);
            outcome.status = Some(status);
        }
        Err(err) => outcome.error = Some(err.to_string()),
    }
    outcome
}

fn all_proposals(engine: &MultisigEngine) -> CliResult<Vec<Proposal>> {
    let mut proposals = Vec::new();
    loop {
        let start_after = proposals.len() as u64;
        let page = engine.list_proposals(Some(start_after), None)?;
        if page.is_empty() {
            return Ok(proposals);
        }
        proposals.extend(page);
    }
}
