//! Multisig Runtime
//!
//! Runtime components for the multisig approval engine:
//!
//! - **QuorumRegistry**: current member set and passing rule
//! - **ProposalStore**: ordered, append-only proposal collection
//! - **AuditJournal**: append-only record of every lifecycle event
//! - **MultisigEngine**: proposal lifecycle (create, approve, execute,
//!   close) behind a single lock
//!
//! Identity, time and execution are injected through the traits in
//! [`collaborators`], so the engine never reaches for ambient state.

#![deny(unsafe_code)]

pub mod collaborators;
pub mod config;
pub mod engine;
pub mod journal;
pub mod registry;
pub mod store;

pub use collaborators::{
    ActionSink, CallerContext, Clock, IdentitySource, ManualClock, NoopSink, RecordingSink,
    SystemClock,
};
pub use config::{ConfigError, EngineConfig, ListingConfig, VotingConfig};
pub use engine::MultisigEngine;
pub use journal::{AuditJournal, JournalEvent, JournalEventKind};
pub use registry::QuorumRegistry;
pub use store::ProposalStore;
