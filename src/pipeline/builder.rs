use futures_util::future::join_all;
use tracing::{debug, error};

use super::channel::{bounded, Inlet, RENDEZVOUS_CAPACITY};
use super::stage::{spawn_stage, Stage, StageHandle};
use crate::error::Result;

type Launch = Box<dyn FnOnce() -> StageHandle + Send>;

/// Fluent pipeline builder with automatic channel wiring.
///
/// Nothing runs until [`into_inlet`](Self::into_inlet) is called.
///
/// ```ignore
/// let (seed, first) = pipepool::pipeline::channel();
/// let (last, handle) = Pipeline::from_inlet(first)
///     .pipe(source)
///     .pipe(rate_limiter)
///     .pipe(pool)
///     .into_inlet();
/// ```
pub struct Pipeline<T: Send + 'static> {
    tasks: Vec<Launch>,
    names: Vec<&'static str>,
    inlet: Inlet<T>,
}

impl<T: Send + 'static> Pipeline<T> {
    /// Start a pipeline reading from `inlet`. The caller keeps the matching
    /// outlet and seeds the pipeline through it.
    pub fn from_inlet(inlet: Inlet<T>) -> Self {
        Self {
            tasks: Vec::new(),
            names: Vec::new(),
            inlet,
        }
    }

    /// Append a stage connected by a rendezvous channel.
    pub fn pipe<S>(self, stage: S) -> Pipeline<S::Output>
    where
        S: Stage<Input = T>,
    {
        self.pipe_with_capacity(stage, RENDEZVOUS_CAPACITY)
    }

    /// Append a stage whose output channel buffers `capacity` items.
    pub fn pipe_with_capacity<S>(mut self, stage: S, capacity: usize) -> Pipeline<S::Output>
    where
        S: Stage<Input = T>,
    {
        let (output, next_inlet) = bounded(capacity);
        let input = self.inlet;

        self.tasks
            .push(Box::new(move || spawn_stage(stage, input, output)));
        self.names.push(S::NAME);

        Pipeline {
            tasks: self.tasks,
            names: self.names,
            inlet: next_inlet,
        }
    }

    /// Names of the stages added so far, upstream first.
    pub fn stage_names(&self) -> &[&'static str] {
        &self.names
    }

    /// Spawn every stage and return the terminal inlet plus a handle for
    /// joining the stages.
    pub fn into_inlet(self) -> (Inlet<T>, PipelineHandle) {
        debug!(stages = ?self.names, "Spawning pipeline");
        let stages = self.tasks.into_iter().map(|launch| launch()).collect();
        (self.inlet, PipelineHandle { stages })
    }
}

/// Handle to a running pipeline.
///
/// Stage errors are not propagated between stages; collecting them is the
/// job of whoever joins this handle.
#[derive(Debug)]
pub struct PipelineHandle {
    stages: Vec<StageHandle>,
}

impl PipelineHandle {
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Wait for every stage and return each stage's result, upstream first.
    pub async fn join(self) -> Vec<(&'static str, Result<()>)> {
        let names: Vec<_> = self.stages.iter().map(StageHandle::name).collect();
        let results = join_all(self.stages.into_iter().map(StageHandle::join)).await;
        names.into_iter().zip(results).collect()
    }

    /// Wait for every stage, returning the first error in pipeline order.
    ///
    /// # Errors
    ///
    /// Returns the most upstream stage failure; the rest are logged.
    pub async fn join_all(self) -> Result<()> {
        let mut first = None;
        for (stage, result) in self.join().await {
            if let Err(e) = result {
                error!(stage, error = %e, "Stage returned an error");
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }

    /// Cancel every stage.
    pub fn abort(&self) {
        for stage in &self.stages {
            stage.abort();
        }
    }
}
