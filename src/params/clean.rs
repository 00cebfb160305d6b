// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Deconvolve dirty maps and convert them to FITS.
//!
//! For each Stokes parameter of a channel, a chain of MIRIAD tasks is run; the
//! first failing task ends that Stokes parameter's chain. The clean cutoff
//! comes from the noise in the channel's Stokes V dirty map.

use std::{fmt::Display, num::NonZeroUsize, path::PathBuf};

use itertools::Itertools;
use log::{debug, error, info, warn};

use super::{job_stems, ChannelRange};
use crate::{
    constants::NO_CUTOFF,
    filenames::{fits_name_for, ProductStem},
    io::remove_best_effort,
    jobs::{run_jobs, JobError, JobOutcome, PoolError},
    miriad::{Miriad, MiriadError, MiriadTask},
    noise::{estimate_cutoff, fits_conversion_task},
    stokes::Stokes,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StokesState {
    /// The map or the beam is missing.
    NoDirtyMap,
    Finished,
    Pending,
}

pub(crate) struct CleanParams {
    pub(crate) source: String,
    pub(crate) freq: u32,
    /// If this is `None`, the single MFS image is cleaned.
    pub(crate) channels: Option<ChannelRange>,
    pub(crate) num_iters: u32,
    /// The percentage of the image to clean.
    pub(crate) region: f64,
    pub(crate) num_workers: NonZeroUsize,
    /// Remove existing clean products and make them again.
    pub(crate) redo: bool,
    pub(crate) miriad: Miriad,
}

impl CleanParams {
    pub(crate) fn jobs(&self) -> Vec<ProductStem> {
        job_stems(&self.source, self.freq, self.channels.as_ref())
    }

    fn is_mfs(&self) -> bool {
        self.channels.is_none()
    }

    /// The Stokes parameters that get cleaned.
    pub(crate) fn stokes(&self) -> &'static [Stokes] {
        if self.is_mfs() {
            &Stokes::MFS_CLEANED
        } else {
            &Stokes::ALL
        }
    }

    /// The MIRIAD tasks taking a dirty map to a clean FITS image, in order.
    pub(crate) fn chain<C: Display>(
        &self,
        stem: &ProductStem,
        stokes: Stokes,
        cutoff: C,
    ) -> Vec<MiriadTask> {
        let map = stem.map(stokes);
        let beam = stem.beam();
        let model = stem.model(stokes);
        let clean = stem.clean(stokes);

        let deconvolve = MiriadTask::new(if self.is_mfs() { "mfclean" } else { "clean" })
            .path_arg("map", &map)
            .path_arg("beam", &beam)
            .arg("region", format!("percentage({})", self.region))
            .arg("niters", self.num_iters)
            .arg("cutoff", cutoff)
            .path_arg("out", &model);

        if self.is_mfs() {
            vec![
                deconvolve,
                MiriadTask::new("restor")
                    .path_arg("map", &map)
                    .path_arg("beam", &beam)
                    .path_arg("model", &model)
                    .path_arg("out", &clean),
                fits_conversion_task(&clean, &stem.clean_fits(stokes)),
            ]
        } else {
            let pbcorr = stem.pbcorr(stokes);
            let rms = stem.rms_log(stokes);
            vec![
                deconvolve,
                MiriadTask::new("restor")
                    .path_arg("map", &map)
                    .path_arg("beam", &beam)
                    .path_arg("model", &model)
                    .path_arg("out", &pbcorr),
                // Primary beam correction.
                MiriadTask::new("linmos")
                    .path_arg("in", &pbcorr)
                    .path_arg("out", &clean),
                // linmos drops the "rms" header item; copy it across.
                MiriadTask::new("gethd")
                    .path_arg("in", pbcorr.join("rms"))
                    .path_arg("log", &rms),
                MiriadTask::new("puthd")
                    .path_arg("in", clean.join("rms"))
                    .arg("value", format!("@{}", rms.display())),
                fits_conversion_task(&clean, &stem.clean_fits(stokes)),
            ]
        }
    }

    /// Everything a chain writes. MIRIAD refuses to overwrite any of these.
    fn products(stem: &ProductStem, stokes: Stokes) -> Vec<PathBuf> {
        vec![
            stem.model(stokes),
            stem.pbcorr(stokes),
            stem.clean(stokes),
            stem.rms_log(stokes),
            stem.clean_fits(stokes),
        ]
    }

    fn state(&self, stem: &ProductStem, stokes: Stokes) -> StokesState {
        if !stem.map(stokes).exists() || !stem.beam().exists() {
            StokesState::NoDirtyMap
        } else if !self.redo && stem.clean_fits(stokes).exists() {
            StokesState::Finished
        } else {
            StokesState::Pending
        }
    }

    /// The Stokes parameters of a job that still need cleaning.
    fn pending(&self, stem: &ProductStem) -> Vec<Stokes> {
        let mut pending = vec![];
        for &stokes in self.stokes() {
            match self.state(stem, stokes) {
                StokesState::NoDirtyMap => warn!(
                    "{stem}: {} or {} doesn't exist; not cleaning Stokes {stokes}",
                    stem.map(stokes).display(),
                    stem.beam().display()
                ),
                StokesState::Finished => debug!(
                    "{stem}: {} already exists; skipping Stokes {stokes}",
                    stem.clean_fits(stokes).display()
                ),
                StokesState::Pending => pending.push(stokes),
            }
        }
        pending
    }

    /// The jobs whose every Stokes parameter has already been cleaned.
    pub(crate) fn finished_jobs(&self) -> Vec<ProductStem> {
        self.jobs()
            .into_iter()
            .filter(|stem| {
                self.stokes()
                    .iter()
                    .all(|&s| self.state(stem, s) == StokesState::Finished)
            })
            .collect()
    }

    /// Every MIRIAD task a job would run, in order. The cutoff can't be known
    /// without running MIRIAD, so the noise measurement stands in for it.
    fn planned_tasks(&self, stem: &ProductStem) -> Vec<MiriadTask> {
        let pending = self.pending(stem);
        if pending.is_empty() {
            return vec![];
        }

        let v_map = stem.map(Stokes::V);
        let mut tasks = vec![];
        let cutoff = if v_map.is_dir() {
            tasks.push(fits_conversion_task(&v_map, &fits_name_for(&v_map)));
            format!("<noise of {}>", v_map.display())
        } else {
            NO_CUTOFF.to_string()
        };
        for stokes in pending {
            tasks.extend(self.chain(stem, stokes, &cutoff));
        }
        tasks
    }

    fn run_job(&self, stem: &ProductStem) -> Result<JobOutcome, JobError> {
        let pending = self.pending(stem);
        if pending.is_empty() {
            return Ok(JobOutcome::Skipped);
        }

        let cutoff = estimate_cutoff(&self.miriad, &stem.map(Stokes::V))?;

        let mut failed: Vec<(Stokes, MiriadError)> = vec![];
        for stokes in pending {
            // Anything left here is from an interrupted run or is being redone.
            for product in Self::products(stem, stokes) {
                remove_best_effort(&product);
            }

            if let Err(e) = self
                .chain(stem, stokes, cutoff)
                .iter()
                .try_for_each(|task| self.miriad.run(task))
            {
                error!("{stem}: Stokes {stokes}: {e}");
                failed.push((stokes, e));
            }
        }

        if failed.is_empty() {
            Ok(JobOutcome::Completed)
        } else {
            let stokes = failed.iter().map(|(s, _)| s).join(",");
            let (_, first) = failed.remove(0);
            Err(JobError::Stokes { stokes, first })
        }
    }

    /// Log every task that would be run, without running any.
    pub(crate) fn dry_run(&self) {
        for stem in self.jobs() {
            let tasks = self.planned_tasks(&stem);
            if tasks.is_empty() {
                info!("{stem}: nothing to clean; skipping");
            }
            for task in tasks {
                info!("{stem}: {task}");
            }
        }
    }

    pub(crate) fn run(&self) -> Result<(), PoolError> {
        let jobs = self.jobs();
        let num_workers = if jobs.len() == 1 {
            NonZeroUsize::MIN
        } else {
            self.num_workers
        };
        run_jobs(&jobs, num_workers, "Cleaning", |stem| self.run_job(stem))?;
        Ok(())
    }
}
