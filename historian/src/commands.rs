use std::fs;

use histree::{hash::Digest, ledger::Ledger, Commitment, HistoryTree, InclusionProof};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    config::{Config, HistorianCommand},
    errors::{AppError, Result},
    events::EventLog,
    salt::Salt,
};

/// Run the configured command, returning what it should print
pub(crate) fn run(config: &Config) -> Result<Value> {
    match &config.command {
        HistorianCommand::Commit { value, salt } => commit(value, salt),
        HistorianCommand::Replay => replay(&load_events(config)?),
        HistorianCommand::Prove { value, salt, root } => {
            prove(&load_events(config)?, value, salt, root.as_deref())
        }
        HistorianCommand::Verify { proof } => verify(&fs::read_to_string(proof)?),
    }
}

fn load_events(config: &Config) -> Result<EventLog> {
    let path = config.events.as_ref().ok_or(AppError::MissingEventLog)?;
    Ok(EventLog::load(path)?)
}

fn commitment(value: &str, salt: &str) -> Result<Commitment> {
    Ok(Commitment::new(value, Salt::parse(salt)?))
}

fn commit(value: &str, salt: &str) -> Result<Value> {
    Ok(serde_json::to_value(commitment(value, salt)?)?)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplaySummary {
    root: Digest,
    running_count: u64,
    commitments: u64,
    edge_levels: Vec<usize>,
    matches_log: bool,
}

#[tracing::instrument(skip_all)]
fn replay(log: &EventLog) -> Result<Value> {
    let mut tree = HistoryTree::new();
    let root = tree.sync(log)?;

    let summary = ReplaySummary {
        root,
        running_count: tree.running_count(),
        commitments: tree.commitment_count(),
        edge_levels: tree.edges().occupied_levels().collect(),
        matches_log: root == log.root()?,
    };

    tracing::info!(%root, running_count = summary.running_count, "replayed event log");

    Ok(serde_json::to_value(summary)?)
}

#[derive(Debug, Serialize)]
struct ProofOutput {
    proof: InclusionProof,
    siblings: Vec<Digest>,
}

#[tracing::instrument(skip(log, salt))]
fn prove(log: &EventLog, value: &str, salt: &str, root: Option<&str>) -> Result<Value> {
    let mut tree = HistoryTree::new();
    tree.record_commitment(commitment(value, salt)?)?;
    tree.sync(log)?;

    let root = match root {
        Some(root) => root.parse()?,
        None => tree.root(),
    };

    let proof = tree.prove_value(root, value)?;
    tracing::info!(steps = proof.steps().len(), "proved inclusion");

    let siblings = proof.siblings();
    Ok(serde_json::to_value(ProofOutput { proof, siblings })?)
}

/// Accepts either a bare proof or the output of `prove`
fn verify(json: &str) -> Result<Value> {
    let value = match serde_json::from_str(json)? {
        Value::Object(mut output) if output.contains_key("proof") => {
            output.remove("proof").unwrap_or_default()
        }
        other => other,
    };

    let proof: InclusionProof = serde_json::from_value(value)?;
    let valid = proof.verify();

    if valid {
        tracing::info!(root = %proof.root(), "proof is valid");
    } else {
        tracing::warn!(root = %proof.root(), "proof does not lead to its root");
    }

    Ok(json!({
        "valid": valid,
        "root": proof.root(),
        "leaf": proof.leaf(),
    }))
}
