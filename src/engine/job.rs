//! Job abstractions.
//!
//! A **job** is a unit of logic the scene runs over its resources. A job:
//! - declares which resources it reads (inputs) and writes (outputs),
//! - is either a setup job (run once when the scene is built) or an update
//!   job (run once per tick),
//! - is invoked once per match through a callback that sees an [`Inputs`]
//!   view and fills an [`Outputs`] scratch.
//!
//! Returning `false` from the callback aborts the rest of that job's
//! iteration for the current run. Matches committed before the abort stay.
//!
//! ## Function-backed jobs
//!
//! [`FnJob`] wraps a closure so most jobs need no dedicated type:
//!
//! ```ignore
//! let integrate = FnJob::update("integrate", vec![position, velocity], vec![position],
//!     |inputs, outputs| {
//!         outputs.set(0, inputs.get::<f32>(0) + inputs.get::<f32>(1));
//!         true
//!     });
//! ```

use crate::engine::query::Inputs;
use crate::engine::scratch::Outputs;
use crate::engine::types::{JobKind, ResourceID};


/// A unit of executable logic operating on scene resources.
///
/// Jobs must be `Send` so a scene can be moved between threads.
pub trait Job: Send {
    /// Human-readable name used in logs, errors and profiles.
    fn name(&self) -> &'static str;

    /// When the job runs.
    fn kind(&self) -> JobKind;

    /// Resources read by the job, in callback order.
    fn inputs(&self) -> &[ResourceID];

    /// Resources written by the job, in callback order.
    fn outputs(&self) -> &[ResourceID];

    /// Processes one match. Return `false` to stop iterating.
    fn run(&mut self, inputs: &Inputs<'_>, outputs: &mut Outputs) -> bool;
}

/// A concrete [`Job`] backed by a closure.
pub struct FnJob<F>
where
    F: FnMut(&Inputs<'_>, &mut Outputs) -> bool + Send + 'static,
{
    name: &'static str,
    kind: JobKind,
    inputs: Vec<ResourceID>,
    outputs: Vec<ResourceID>,
    f: F,
}

impl<F> FnJob<F>
where
    F: FnMut(&Inputs<'_>, &mut Outputs) -> bool + Send + 'static,
{
    /// Creates a new function-backed job.
    ///
    /// # Parameters
    /// - `name`: Human-readable name, useful for debugging and profiling.
    /// - `kind`: Whether the job runs at setup or on every tick.
    /// - `inputs` / `outputs`: Declared resources, positional in the callback.
    /// - `f`: The closure invoked once per match.
    pub fn new(
        name: &'static str,
        kind: JobKind,
        inputs: Vec<ResourceID>,
        outputs: Vec<ResourceID>,
        f: F,
    ) -> Self {
        Self { name, kind, inputs, outputs, f }
    }

    /// A job run once when the scene is built.
    pub fn setup(name: &'static str, inputs: Vec<ResourceID>, outputs: Vec<ResourceID>, f: F) -> Self {
        Self::new(name, JobKind::Setup, inputs, outputs, f)
    }

    /// A job run on every tick.
    pub fn update(name: &'static str, inputs: Vec<ResourceID>, outputs: Vec<ResourceID>, f: F) -> Self {
        Self::new(name, JobKind::Update, inputs, outputs, f)
    }

    /// Boxes the job for handing to a scene.
    pub fn boxed(self) -> Box<dyn Job> {
        Box::new(self)
    }
}

impl<F> Job for FnJob<F>
where
    F: FnMut(&Inputs<'_>, &mut Outputs) -> bool + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> JobKind {
        self.kind
    }

    fn inputs(&self) -> &[ResourceID] {
        &self.inputs
    }

    fn outputs(&self) -> &[ResourceID] {
        &self.outputs
    }

    fn run(&mut self, inputs: &Inputs<'_>, outputs: &mut Outputs) -> bool {
        (self.f)(inputs, outputs)
    }
}
