//! Following a run from the command line
//!
//! Drains a [`ProgressStream`] until the run ends or the user interrupts it.

use crate::research::{ProgressEvent, ProgressStream};
use crate::types::Result;
use futures::StreamExt;
use std::future::Future;

/// How a followed run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// Interrupted before the report arrived
    Cancelled,
}

impl RunOutcome {
    /// Process exit status; 130 is the shell convention for SIGINT
    pub fn exit_code(self) -> i32 {
        match self {
            RunOutcome::Completed => 0,
            RunOutcome::Cancelled => 130,
        }
    }
}

/// Hand every event of `progress` to `on_event` until the stream ends.
///
/// If `shutdown` resolves first the run is cancelled and no further search
/// calls are made. A terminal run error, or an error from `on_event`, is
/// returned as `Err`.
pub async fn follow<S, F>(
    mut progress: ProgressStream,
    shutdown: S,
    mut on_event: F,
) -> Result<RunOutcome>
where
    S: Future<Output = ()>,
    F: FnMut(&ProgressEvent) -> Result<()>,
{
    tokio::pin!(shutdown);
    let interrupted = loop {
        tokio::select! {
            event = progress.next() => match event {
                Some(event) => on_event(&event?)?,
                None => break false,
            },
            _ = &mut shutdown => break true,
        }
    };

    if interrupted {
        progress.cancel();
        return Ok(RunOutcome::Cancelled);
    }
    Ok(RunOutcome::Completed)
}
