//! Subcommand implementations

pub mod benchmark;
pub mod compare;
pub mod run;
pub mod tasks;

use indicatif::ProgressBar;
use prompt_lab_workflow::ExperimentRunner;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::context::Context;

/// Drive a progress bar from the runner's trial events until aborted.
pub(crate) async fn track_progress(
    ctx: &Context,
    runner: &ExperimentRunner,
    label: &str,
) -> (ProgressBar, JoinHandle<()>) {
    let pb = ctx.output.progress_bar(0, label);
    let mut rx = runner.executor().enable_progress_tracking().await;
    let bar = pb.clone();

    let handle = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    bar.set_length(event.total as u64);
                    bar.set_position(event.completed as u64);
                    bar.set_message(format!("{} / {}", event.strategy, event.case_id));
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    (pb, handle)
}
