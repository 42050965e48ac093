//! The save-and-copy pipeline
//!
//! ```text
//! Idle -> RequestSent -> AwaitingResponse -> Cancelled | Completed | Failed
//! ```
//!
//! Each step either succeeds once or the whole flow fails; the caller decides
//! how to exit.

use std::fmt;
use std::path::PathBuf;

use futures_util::future::{AbortRegistration, Abortable};
use tracing::{debug, info, warn};

use crate::Error;
use crate::bus::Bus;
use crate::files;
use crate::job::CopyJob;
use crate::portal::file_chooser::parse_file_chooser_results;
use crate::portal::response::await_response;
use crate::portal::{DialogSettings, Portal, ResponseCode};

/// Where the flow is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    RequestSent,
    AwaitingResponse,
    Cancelled,
    Completed,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::RequestSent => "request-sent",
            Stage::AwaitingResponse => "awaiting-response",
            Stage::Cancelled => "cancelled",
            Stage::Completed => "completed",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// How a flow that did not fail ended
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The user picked a destination and the file was copied there
    Completed { destination: PathBuf, bytes: u64 },
    /// The dialog was dismissed; nothing was copied
    Cancelled(ResponseCode),
}

/// Run one save-and-copy flow on `bus`.
///
/// The wait for the user's answer stops when `abort` is triggered; the
/// pending request is then closed and the flow fails with
/// [`Error::Interrupted`].
pub async fn save_copy<B: Bus>(
    bus: &B,
    job: &CopyJob,
    dialog: DialogSettings,
    abort: AbortRegistration,
) -> Result<Outcome, Error> {
    let mut stage = Stage::Idle;
    let result = run(bus, job, dialog, abort, &mut stage).await;
    let end = match &result {
        Ok(Outcome::Completed { .. }) => Stage::Completed,
        Ok(Outcome::Cancelled(_)) => Stage::Cancelled,
        Err(_) => Stage::Failed,
    };
    advance(&mut stage, end);
    result
}

async fn run<B: Bus>(
    bus: &B,
    job: &CopyJob,
    dialog: DialogSettings,
    abort: AbortRegistration,
    stage: &mut Stage,
) -> Result<Outcome, Error> {
    let portal = Portal::open(bus).with_dialog(dialog);

    let mut pending = portal.request_save_file(&job.folder, &job.name).await?;
    advance(stage, Stage::RequestSent);
    advance(stage, Stage::AwaitingResponse);

    let wait = await_response(&mut pending.signals, &pending.path);
    let response = match Abortable::new(wait, abort).await {
        Ok(response) => response?,
        Err(_aborted) => {
            info!(request = %pending.path, "Interrupted, closing request");
            if let Err(e) = portal.close(&pending.path).await {
                warn!(error = %e, "Failed to close portal request");
            }
            return Err(Error::Interrupted);
        }
    };

    if !response.code.is_success() {
        info!(code = %response.code, "Dialog dismissed, nothing copied");
        return Ok(Outcome::Cancelled(response.code));
    }

    let destination = parse_file_chooser_results(&response.results)?;
    let bytes = files::copy_file(&job.source, &destination)?;
    info!(source = %job.source.display(), destination = %destination.display(), bytes, "Copied");

    Ok(Outcome::Completed { destination, bytes })
}

fn advance(stage: &mut Stage, next: Stage) {
    debug!(from = %stage, to = %next, "Flow transition");
    *stage = next;
}
