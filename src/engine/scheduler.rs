//! Job scheduling and execution.
//!
//! A [`Scheduler`] owns the jobs of one [`JobKind`] together with their
//! query plans. Jobs run sequentially in registration order; each sees the
//! outputs committed by the jobs before it.
//!
//! ## Planning
//!
//! Plans are built once when jobs are added, against the scene's registry. A
//! job whose declaration cannot be planned is rejected up front with
//! [`SceneError::InvalidJob`], so running a schedule never fails on a bad
//! declaration.

use log::debug;

use crate::engine::error::{SceneError, SceneResult};
use crate::engine::job::Job;
use crate::engine::query::{Inputs, QueryPlan};
use crate::engine::resource::ResourceRegistry;
use crate::engine::scene::SceneData;
use crate::engine::scratch::Outputs;
use crate::engine::types::JobKind;
use crate::profiling;


/// A job paired with its precomputed plan.
struct Scheduled {
    job: Box<dyn Job>,
    plan: QueryPlan,
}

/// Ordered list of jobs of a single kind.
pub struct Scheduler {
    kind: JobKind,
    jobs: Vec<Scheduled>,
}

impl Scheduler {
    /// Creates an empty scheduler for jobs of `kind`.
    pub fn new(kind: JobKind) -> Self {
        Self { kind, jobs: Vec::new() }
    }

    /// Splits `jobs` into a setup and an update scheduler, preserving order.
    ///
    /// ## Errors
    /// Returns [`SceneError::InvalidJob`] for the first job that cannot be planned.
    pub fn partition(
        registry: &ResourceRegistry,
        jobs: Vec<Box<dyn Job>>,
    ) -> SceneResult<(Scheduler, Scheduler)> {
        let mut setup = Scheduler::new(JobKind::Setup);
        let mut update = Scheduler::new(JobKind::Update);
        for job in jobs {
            match job.kind() {
                JobKind::Setup => setup.add_job(registry, job)?,
                JobKind::Update => update.add_job(registry, job)?,
            }
        }
        Ok((setup, update))
    }

    /// Plans and appends `job`.
    ///
    /// ## Panics
    /// Panics if the job's kind differs from the scheduler's.
    ///
    /// ## Errors
    /// Returns [`SceneError::InvalidJob`] if the job's resources cannot be joined.
    pub fn add_job(&mut self, registry: &ResourceRegistry, job: Box<dyn Job>) -> SceneResult<()> {
        assert_eq!(
            job.kind(),
            self.kind,
            "job `{}` added to the {} scheduler",
            job.name(),
            self.kind
        );
        let plan = QueryPlan::new(registry, job.inputs(), job.outputs())
            .map_err(|source| SceneError::InvalidJob { job: job.name(), source })?;
        self.jobs.push(Scheduled { job, plan });
        Ok(())
    }

    /// Kind of the jobs held.
    #[inline]
    pub fn kind(&self) -> JobKind {
        self.kind
    }

    /// Number of jobs held.
    #[inline]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns `true` if no job is held.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Job names in run order.
    pub fn job_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.jobs.iter().map(|scheduled| scheduled.job.name())
    }

    /// Runs every job once, in order, against `data`.
    pub fn run_jobs(&mut self, data: &mut SceneData) {
        for Scheduled { job, plan } in &mut self.jobs {
            let _span = profiling::span(job.name());
            let completed = data.run_plan(plan, &mut |inputs: &Inputs<'_>, outputs: &mut Outputs| {
                job.run(inputs, outputs)
            });
            if !completed {
                debug!("{} job `{}` aborted", self.kind, job.name());
            }
        }
    }
}
