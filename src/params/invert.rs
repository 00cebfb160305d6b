// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Make dirty maps and beams from visibilities with MIRIAD's `invert`.

use std::{num::NonZeroUsize, path::PathBuf};

use itertools::Itertools;
use log::{debug, info};
use vec1::Vec1;

use super::{job_stems, ChannelRange};
use crate::{
    constants::{CELL_SIZE_ARCSEC, ROBUST},
    filenames::ProductStem,
    io::remove_best_effort,
    jobs::{run_jobs, JobError, JobOutcome, PoolError},
    miriad::{Miriad, MiriadTask},
    stokes::Stokes,
};

pub(crate) struct InvertParams {
    pub(crate) source: String,
    pub(crate) freq: u32,
    /// If this is `None`, a single MFS image is made from all channels.
    pub(crate) channels: Option<ChannelRange>,
    pub(crate) field_size: u32,
    pub(crate) vis: Vec1<PathBuf>,
    pub(crate) num_workers: NonZeroUsize,
    /// Remove existing maps and beams and make them again.
    pub(crate) redo: bool,
    pub(crate) miriad: Miriad,
}

impl InvertParams {
    pub(crate) fn jobs(&self) -> Vec<ProductStem> {
        job_stems(&self.source, self.freq, self.channels.as_ref())
    }

    /// The `invert` call for a job.
    pub(crate) fn invert_task(&self, stem: &ProductStem) -> MiriadTask {
        let maps = Stokes::ALL
            .iter()
            .map(|&s| stem.map(s).display().to_string())
            .join(",");
        let mut task = MiriadTask::new("invert")
            .arg("vis", self.vis.iter().map(|v| v.display()).join(","))
            .arg("map", maps)
            .path_arg("beam", stem.beam());
        let options = match (stem.chan(), &self.channels) {
            (Some(chan), Some(range)) => {
                task = task.arg("line", format!("chan,{},{chan}", range.step));
                "double,mfs"
            }
            _ => "double,sdb,mfs",
        };
        task.arg("imsize", format!("{0},{0}", self.field_size))
            .arg("cell", CELL_SIZE_ARCSEC)
            .arg("robust", ROBUST)
            .arg("stokes", Stokes::keyword_value(&Stokes::ALL))
            .arg("options", options)
    }

    fn outputs(stem: &ProductStem) -> Vec<PathBuf> {
        let mut outputs: Vec<PathBuf> = Stokes::ALL.iter().map(|&s| stem.map(s)).collect();
        outputs.push(stem.beam());
        outputs
    }

    /// MIRIAD won't write over either of these.
    fn already_made(stem: &ProductStem) -> bool {
        stem.map(Stokes::I).exists() || stem.beam().exists()
    }

    /// The `invert` call a job would make, or `None` if it's skipped.
    fn planned_task(&self, stem: &ProductStem) -> Option<MiriadTask> {
        if !self.redo && Self::already_made(stem) {
            None
        } else {
            Some(self.invert_task(stem))
        }
    }

    /// The jobs that will be skipped because they've already been made.
    pub(crate) fn finished_jobs(&self) -> Vec<ProductStem> {
        self.jobs()
            .into_iter()
            .filter(|stem| self.planned_task(stem).is_none())
            .collect()
    }

    fn run_job(&self, stem: &ProductStem) -> Result<JobOutcome, JobError> {
        let task = match self.planned_task(stem) {
            Some(task) => task,
            None => {
                debug!(
                    "{stem}: {} or {} already exists; skipping",
                    stem.map(Stokes::I).display(),
                    stem.beam().display()
                );
                return Ok(JobOutcome::Skipped);
            }
        };
        if Self::already_made(stem) {
            for output in Self::outputs(stem) {
                remove_best_effort(&output);
            }
        }

        self.miriad.run(&task)?;
        Ok(JobOutcome::Completed)
    }

    /// Log every `invert` call that would be made, without making it.
    pub(crate) fn dry_run(&self) {
        for stem in self.jobs() {
            match self.planned_task(&stem) {
                Some(task) => info!("{stem}: {task}"),
                None => info!("{stem}: already made; skipping"),
            }
        }
    }

    pub(crate) fn run(&self) -> Result<(), PoolError> {
        let jobs = self.jobs();
        // A single job gets nothing from a pool bigger than one worker.
        let num_workers = if jobs.len() == 1 {
            NonZeroUsize::MIN
        } else {
            self.num_workers
        };
        run_jobs(&jobs, num_workers, "Making dirty maps", |stem| {
            self.run_job(stem)
        })?;
        Ok(())
    }
}
