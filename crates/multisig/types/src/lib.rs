//! Multisig Domain Types
//!
//! This crate defines the domain types for the multisig approval engine:
//! a group of members that collectively authorizes actions by proposing,
//! voting, and executing once a threshold is reached.
//!
//! # Key Concepts
//!
//! - **Quorum**: the current member set (identity → voting power) and the
//!   [`ThresholdRule`] proposals must satisfy.
//! - **Threshold evaluation**: pure functions ([`is_passed`],
//!   [`votes_needed`]) over a vote tally. Percentages are fixed-point
//!   integers ([`Percentage`]) and always round *up*.
//! - **Proposal**: an append-only record with a creation-time snapshot of
//!   the rule and total power, a tally, individual approvals, and a
//!   [`ProposalStatus`].
//!
//! # Architecture
//!
//! This is a pure types crate with no runtime dependencies. The lifecycle
//! engine that mutates proposals lives in `multisig-runtime`.

#![deny(unsafe_code)]

mod errors;
mod ids;
mod percentage;
mod proposal;
mod quorum;
mod threshold;
mod votes;

pub use errors::*;
pub use ids::*;
pub use percentage::*;
pub use proposal::*;
pub use quorum::*;
pub use threshold::*;
pub use votes::*;
