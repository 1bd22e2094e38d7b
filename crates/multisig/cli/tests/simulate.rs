//! Scenario replay and command entry point tests

use multisig_cli::*;
use multisig_runtime::{EngineConfig, JournalEventKind};
use multisig_types::{ProposalId, ProposalStatus};

const COUNCIL: &str = include_str!("../fixtures/council.toml");
const SCENARIO: &str = include_str!("../fixtures/scenario.toml");

fn fixture(name: &str) -> String {
    format!("{}/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn replay() -> SimulationReport {
    let config = EngineConfig::from_toml_str(COUNCIL).unwrap();
    let scenario = Scenario::from_toml_str(SCENARIO).unwrap();
    run_scenario(config, &scenario).unwrap()
}

#[test]
fn council_fixture_is_valid() {
    let config = EngineConfig::from_toml_str(COUNCIL).unwrap();
    let summary = config_summary(&config);
    assert_eq!(summary["members"], 5);
    assert_eq!(summary["total_power"], 6);
    assert_eq!(summary["rule"]["kind"], "absolute_percentage");
    assert_eq!(summary["rule"]["percentage"], "0.5");
}

#[test]
fn scenario_step_outcomes() {
    let report = replay();
    let statuses: Vec<Option<ProposalStatus>> = report.steps.iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        vec![
            Some(ProposalStatus::Open),
            Some(ProposalStatus::Open),
            // sink fails once: the vote stands and the failure is reported
            None,
            Some(ProposalStatus::Executed),
            Some(ProposalStatus::Open),
            None,
            Some(ProposalStatus::Open),
            Some(ProposalStatus::Expired),
            None,
        ]
    );

    let failed_payout = report.steps[2].error.as_deref().unwrap();
    assert!(failed_payout.contains("Execution of proposal 1 failed"));
    assert_eq!(report.proposals[0].approvals.len(), 2);

    let mallory = report.steps[5].error.as_deref().unwrap();
    assert!(mallory.contains("mallory is not a quorum member"));
    let late_close = report.steps[8].error.as_deref().unwrap();
    assert!(late_close.contains("is closed (status: expired)"));
}

#[test]
fn scenario_final_state() {
    let report = replay();

    assert_eq!(report.proposals.len(), 2);
    assert_eq!(report.proposals[0].status, ProposalStatus::Executed);
    assert_eq!(report.proposals[1].id, ProposalId(2));
    assert_eq!(report.proposals[1].status, ProposalStatus::Expired);
    // The vote after expiry was not recorded
    assert_eq!(report.proposals[1].approvals.len(), 1);

    // The quorum change never executed
    assert_eq!(report.quorum.members.len(), 5);

    let failures = report
        .journal
        .iter()
        .filter(|e| matches!(e.kind, JournalEventKind::ExecutionFailed { .. }))
        .count();
    assert_eq!(failures, 1);
}

#[test]
fn report_serializes_to_json() {
    let json = serde_json::to_value(replay()).unwrap();
    assert_eq!(json["steps"][3]["status"], "executed");
    assert_eq!(json["proposals"][0]["actions"][0]["kind"], "transfer");
    assert_eq!(json["proposals"][0]["actions"][0]["payload"]["amount"], 1200);
    assert!(json["steps"][5].get("status").is_none());
}

#[tokio::test]
async fn check_config_command() {
    let config = fixture("council.toml");
    let result = run_with_args(["multisigctl", "--config", config.as_str(), "check-config"]).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn simulate_command() {
    let config = fixture("council.toml");
    let script = fixture("scenario.toml");
    let result = run_with_args([
        "multisigctl",
        "--config",
        config.as_str(),
        "simulate",
        script.as_str(),
    ])
    .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn missing_config_is_an_io_error() {
    let result = run_with_args([
        "multisigctl",
        "--config",
        "/nonexistent/multisig.toml",
        "check-config",
    ])
    .await;
    assert!(matches!(result, Err(CliError::Io(_))));
}
