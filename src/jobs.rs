// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Run independent jobs over a fixed-size pool of workers.
//!
//! Jobs don't talk to each other. A failed job is logged and counted, but it
//! doesn't stop any other job; only once everything has finished is the
//! failure reported.

use std::{fmt::Display, num::NonZeroUsize};

use indicatif::{ParallelProgressIterator, ProgressBar, ProgressDrawTarget, ProgressStyle};
use itertools::Itertools;
use log::{error, info};
use rayon::prelude::*;
use thiserror::Error;

use crate::{miriad::MiriadError, noise::NoiseError, PROGRESS_BARS};

/// What happened to a job that didn't fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JobOutcome {
    /// MIRIAD was run.
    Completed,

    /// Everything the job would make already exists (or its inputs don't).
    Skipped,
}

#[derive(Error, Debug)]
pub(crate) enum JobError {
    #[error(transparent)]
    Miriad(#[from] MiriadError),

    #[error(transparent)]
    Noise(#[from] NoiseError),

    #[error("Stokes {stokes} failed; the first error was: {first}")]
    Stokes { stokes: String, first: MiriadError },
}

/// A tally of finished jobs.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct JobSummary {
    pub(crate) completed: usize,
    pub(crate) skipped: usize,
    /// The labels of jobs that failed.
    pub(crate) failed: Vec<String>,
}

/// Run `job_fn` on every job, with at most `num_workers` jobs running at once.
/// `description` is shown next to the progress bar.
pub(crate) fn run_jobs<J, F>(
    jobs: &[J],
    num_workers: NonZeroUsize,
    description: &'static str,
    job_fn: F,
) -> Result<JobSummary, PoolError>
where
    J: Display + Sync,
    F: Fn(&J) -> Result<JobOutcome, JobError> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_workers.get())
        .thread_name(|i| format!("worker-{i}"))
        .build()?;

    let progress = ProgressBar::with_draw_target(
        Some(jobs.len() as _),
        if PROGRESS_BARS.load() {
            ProgressDrawTarget::stdout()
        } else {
            ProgressDrawTarget::hidden()
        },
    )
    .with_style(
        ProgressStyle::default_bar()
            .template("{msg:17}: [{wide_bar:.blue}] {pos:3}/{len:3} jobs ({elapsed_precise}<{eta_precise})")
            .unwrap()
            .progress_chars("=> "),
    )
    .with_position(0)
    .with_message(description);

    info!(
        "Running {} jobs on {} worker{}",
        jobs.len(),
        num_workers,
        if num_workers.get() == 1 { "" } else { "s" }
    );
    // Errors are rendered on the worker, as they don't all cross threads.
    let results: Vec<(String, Result<JobOutcome, String>)> = pool.install(|| {
        jobs.par_iter()
            .progress_with(progress.clone())
            .map(|job| (job.to_string(), job_fn(job).map_err(|e| e.to_string())))
            .collect()
    });
    progress.abandon_with_message(format!("Finished {description}"));

    let mut summary = JobSummary::default();
    for (label, result) in results {
        match result {
            Ok(JobOutcome::Completed) => summary.completed += 1,
            Ok(JobOutcome::Skipped) => summary.skipped += 1,
            Err(e) => {
                error!("{label}: {e}");
                summary.failed.push(label);
            }
        }
    }
    info!(
        "{} jobs completed, {} skipped, {} failed",
        summary.completed,
        summary.skipped,
        summary.failed.len()
    );

    if summary.failed.is_empty() {
        Ok(summary)
    } else {
        Err(PoolError::JobsFailed {
            num_failed: summary.failed.len(),
            num_jobs: jobs.len(),
            labels: summary.failed.iter().join(", "),
        })
    }
}

#[derive(Error, Debug)]
pub(crate) enum PoolError {
    #[error("Couldn't build the worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("{num_failed} of {num_jobs} jobs failed: {labels}")]
    JobsFailed {
        num_failed: usize,
        num_jobs: usize,
        labels: String,
    },
}
