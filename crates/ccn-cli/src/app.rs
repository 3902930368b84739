//! The hook invocation: read one event, validate it, route it.

use std::io::Read;

use anyhow::{Context, Result};
use ccn_core::{HookEvent, HookPayload, TerminalSession, validate};
use ccn_db::Database;
use serde_json::Value;

use crate::Config;
use crate::notify::Dispatcher;
use crate::router::{EventRouter, Outcome};

/// Handles one hook invocation end to end.
///
/// Returns `Ok(None)` when stdin was empty; there is nothing to do, and that
/// is not a failure.
pub fn run<R: Read>(
    event: &str,
    config: &Config,
    session: Option<TerminalSession>,
    mut input: R,
) -> Result<Option<Outcome>> {
    let kind: HookEvent = event.parse().context("invalid hook type")?;

    let mut raw = String::new();
    input
        .read_to_string(&mut raw)
        .context("failed to read stdin")?;
    let Some(payload) = parse_payload(kind, &raw)? else {
        tracing::warn!(event = %kind, "no input data received");
        return Ok(None);
    };

    let mut ledger = open_database(config)?;
    let dispatcher = Dispatcher::from_config(config, session);
    let outcome = EventRouter::new(&mut ledger, &dispatcher, &config.fallback_title)
        .handle(&payload)
        .with_context(|| format!("failed to handle {kind}"))?;
    Ok(Some(outcome))
}

/// Decodes and validates stdin. `None` means there was no input at all.
fn parse_payload(kind: HookEvent, raw: &str) -> Result<Option<HookPayload>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let record: Value = serde_json::from_str(raw).context("JSON decode error")?;
    validate(&record, kind.as_str()).context("validation error")?;
    let payload = HookPayload::decode(kind, record).context("validation error")?;
    Ok(Some(payload))
}

/// Opens the ledger, ensuring the parent directory exists.
fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Database::open(&config.database_path).with_context(|| {
        format!("failed to open {}", config.database_path.display())
    })
}
