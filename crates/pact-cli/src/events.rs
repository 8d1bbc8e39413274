//! # Events Subcommand
//!
//! Prints the notification log, optionally only records after a given
//! sequence number so a follower can resume where it left off.

use anyhow::Result;
use clap::Args;

use crate::{store, Workspace};

/// Arguments for `pact events`.
#[derive(Args, Debug)]
pub struct EventsArgs {
    /// Only records with a sequence greater than this.
    #[arg(long, default_value_t = 0)]
    pub since: u64,
    /// Print records as JSON lines.
    #[arg(long)]
    pub json: bool,
}

/// Execute `pact events`.
pub fn run_events(args: &EventsArgs, ws: &Workspace) -> Result<u8> {
    let ledger = store::load(&ws.state_file)?;
    let records = ledger.events_since(args.since);
    for record in records {
        if args.json {
            println!("{}", serde_json::to_string(record)?);
        } else {
            println!(
                "#{} {} {}",
                record.sequence,
                record.emitted_at.to_rfc3339(),
                record.event
            );
        }
    }
    tracing::debug!(
        since = args.since,
        count = records.len(),
        last = ledger.last_event_sequence(),
        "events listed"
    );
    Ok(0)
}
