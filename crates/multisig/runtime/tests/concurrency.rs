//! Concurrent access to a shared engine

use multisig_runtime::*;
use multisig_types::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

fn council(size: usize, weight: u64) -> (Arc<MultisigEngine>, Arc<RecordingSink>) {
    let members = (0..size).map(|i| Member::new(format!("m{:03}", i), 1)).collect();
    let sink = Arc::new(RecordingSink::new());
    let engine = MultisigEngine::with_quorum(
        QuorumConfig::new(members, ThresholdRule::absolute_count(weight)),
        Arc::new(ManualClock::new(Timestamp(1_000))),
        sink.clone(),
    )
    .unwrap();
    (Arc::new(engine), sink)
}

#[test]
fn duplicate_votes_race_to_one_approval() {
    let (engine, _) = council(3, 3);
    let id = engine
        .create_proposal(&MemberId::new("m000"), ProposalDraft::new("t", ""), None)
        .unwrap();

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                engine.approve(&MemberId::new("m001"), id, Vote::Yes, false)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(MultisigError::AlreadyVoted { .. })))
        .count();

    assert_eq!(accepted, 1);
    assert_eq!(duplicates, threads - 1);
    assert_eq!(engine.get_proposal(id).unwrap().approvals.len(), 1);
}

#[test]
fn concurrent_votes_execute_exactly_once() {
    let size = 16;
    let (engine, sink) = council(size, 10);
    let id = engine
        .create_proposal(&MemberId::new("m000"), ProposalDraft::new("t", ""), None)
        .unwrap();

    let barrier = Arc::new(Barrier::new(size));
    let handles: Vec<_> = (0..size)
        .map(|i| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                engine.approve(&MemberId::new(format!("m{:03}", i)), id, Vote::Yes, true)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let executed = results
        .iter()
        .filter(|r| matches!(r, Ok(ProposalStatus::Executed)))
        .count();
    let closed = results
        .iter()
        .filter(|r| matches!(r, Err(MultisigError::ProposalClosed { .. })))
        .count();

    // The tenth vote executes; later votes find the proposal closed.
    assert_eq!(executed, 1);
    assert_eq!(closed, size - 10);
    assert_eq!(sink.executed().len(), 1);
    assert_eq!(engine.get_proposal(id).unwrap().approvals.len(), 10);
}

/// Advances one second on every read
struct TickingClock(AtomicU64);

impl Clock for TickingClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.0.fetch_add(1, Ordering::SeqCst))
    }
}

#[test]
fn vote_timestamps_follow_commit_order() {
    let size = 16;
    let members = (0..size).map(|i| Member::new(format!("m{:03}", i), 1)).collect();
    let engine = Arc::new(
        MultisigEngine::with_quorum(
            QuorumConfig::new(members, ThresholdRule::absolute_count(size as u64)),
            Arc::new(TickingClock(AtomicU64::new(1_000))),
            Arc::new(NoopSink),
        )
        .unwrap(),
    );
    let id = engine
        .create_proposal(&MemberId::new("m000"), ProposalDraft::new("t", ""), None)
        .unwrap();

    let barrier = Arc::new(Barrier::new(size));
    let handles: Vec<_> = (0..size)
        .map(|i| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                engine.approve(&MemberId::new(format!("m{:03}", i)), id, Vote::Yes, false)
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let proposal = engine.get_proposal(id).unwrap();
    assert_eq!(proposal.status, ProposalStatus::Passed);
    assert_eq!(proposal.approvals.len(), size);
    for pair in proposal.approvals.windows(2) {
        assert!(pair[0].cast_at < pair[1].cast_at);
    }

    let journal = engine.journal_for(id).unwrap();
    for pair in journal.windows(2) {
        assert!(pair[0].at <= pair[1].at);
    }
}

#[test]
fn readers_run_alongside_writers() {
    let (engine, _) = council(4, 4);
    let writer = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for _ in 0..50 {
                engine
                    .create_proposal(&MemberId::new("m000"), ProposalDraft::new("t", ""), None)
                    .unwrap();
            }
        })
    };
    let reader = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            let mut last = 0;
            for _ in 0..50 {
                let count = engine.proposal_count().unwrap();
                assert!(count >= last);
                last = count;
            }
        })
    };
    writer.join().unwrap();
    reader.join().unwrap();
    assert_eq!(engine.proposal_count().unwrap(), 50);
}
