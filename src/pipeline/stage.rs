//! The stage contract and task spawning.

use std::marker::PhantomData;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::channel::{Inlet, Outlet};
use crate::error::{PipelineError, Result};

/// A processing unit that turns an input stream into an output stream.
///
/// `serve` reads from `input` until it is closed by its upstream owner,
/// writing results to `output`. The stage owns `output`: it is closed when
/// `serve` returns (or earlier, by [`Outlet::close`]), which is the signal
/// for the downstream stage to finish. A stage never closes its input.
///
/// Each stage runs on its own task and coordinates with its neighbours only
/// through the two channels.
#[async_trait]
pub trait Stage: Send + 'static {
    /// Items this stage consumes.
    type Input: Send + 'static;

    /// Items this stage produces.
    type Output: Send + 'static;

    /// Human-readable name for logging.
    const NAME: &'static str;

    /// Run the stage to completion.
    async fn serve(
        &mut self,
        input: Inlet<Self::Input>,
        output: Outlet<Self::Output>,
    ) -> Result<()>;
}

/// Handle to a spawned stage.
#[derive(Debug)]
pub struct StageHandle {
    name: &'static str,
    handle: tokio::task::JoinHandle<Result<()>>,
}

impl StageHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the stage to finish and return what `serve` returned.
    ///
    /// # Errors
    ///
    /// Returns the stage's own error, or [`PipelineError::StageAborted`] if the
    /// task panicked or was cancelled.
    pub async fn join(self) -> Result<()> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(PipelineError::StageAborted {
                stage: self.name,
                reason: e.to_string(),
            }
            .into()),
        }
    }

    /// Cancel the stage task. Its output closes as the task is dropped.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

/// Run `stage` on its own task.
pub fn spawn_stage<S: Stage>(
    mut stage: S,
    input: Inlet<S::Input>,
    output: Outlet<S::Output>,
) -> StageHandle {
    let output = output.bind(S::NAME);
    let handle = tokio::spawn(async move {
        debug!(stage = S::NAME, "Stage starting");
        let result = stage.serve(input, output).await;
        match &result {
            Ok(()) => debug!(stage = S::NAME, "Stage finished"),
            Err(e) => warn!(stage = S::NAME, error = %e, "Stage failed"),
        }
        result
    });
    StageHandle {
        name: S::NAME,
        handle,
    }
}

/// Stage that applies a function to every item.
pub struct MapStage<F, I, O> {
    f: F,
    _types: PhantomData<fn(I) -> O>,
}

impl<F, I, O> MapStage<F, I, O>
where
    F: FnMut(I) -> O + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _types: PhantomData,
        }
    }
}

#[async_trait]
impl<F, I, O> Stage for MapStage<F, I, O>
where
    F: FnMut(I) -> O + Send + 'static,
    I: Send + 'static,
    O: Send + 'static,
{
    type Input = I;
    type Output = O;
    const NAME: &'static str = "map";

    async fn serve(&mut self, input: Inlet<I>, output: Outlet<O>) -> Result<()> {
        while let Some(item) = input.recv().await {
            output.send((self.f)(item)).await?;
        }
        output.close();
        Ok(())
    }
}

/// Stage that applies a function to every item and forwards only the
/// `Some` results.
pub struct FilterMapStage<F, I, O> {
    f: F,
    _types: PhantomData<fn(I) -> O>,
}

impl<F, I, O> FilterMapStage<F, I, O>
where
    F: FnMut(I) -> Option<O> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _types: PhantomData,
        }
    }
}

#[async_trait]
impl<F, I, O> Stage for FilterMapStage<F, I, O>
where
    F: FnMut(I) -> Option<O> + Send + 'static,
    I: Send + 'static,
    O: Send + 'static,
{
    type Input = I;
    type Output = O;
    const NAME: &'static str = "filter_map";

    async fn serve(&mut self, input: Inlet<I>, output: Outlet<O>) -> Result<()> {
        while let Some(item) = input.recv().await {
            if let Some(mapped) = (self.f)(item) {
                output.send(mapped).await?;
            }
        }
        output.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::pipeline::channel::{bounded, channel};

    #[tokio::test]
    async fn map_stage_transforms_and_closes() {
        let (in_tx, in_rx) = bounded(8);
        let (out_tx, out_rx) = bounded(8);
        let handle = spawn_stage(MapStage::new(|x: u32| x * 10), in_rx, out_tx);

        for i in 1..=3 {
            in_tx.send(i).await.unwrap();
        }
        in_tx.close();

        let mut got = Vec::new();
        while let Some(v) = out_rx.recv().await {
            got.push(v);
        }
        assert_eq!(got, vec![10, 20, 30]);
        handle.join().await.unwrap();
    }

    #[tokio::test]
    async fn filter_map_skips_none() {
        let (in_tx, in_rx) = bounded(8);
        let (out_tx, out_rx) = bounded(8);
        let handle = spawn_stage(
            FilterMapStage::new(|x: u32| (x % 2 == 0).then_some(x)),
            in_rx,
            out_tx,
        );

        for i in 0..6 {
            in_tx.send(i).await.unwrap();
        }
        in_tx.close();

        let mut got = Vec::new();
        while let Some(v) = out_rx.recv().await {
            got.push(v);
        }
        assert_eq!(got, vec![0, 2, 4]);
        handle.join().await.unwrap();
    }

    #[tokio::test]
    async fn dropped_downstream_fails_the_stage() {
        let (in_tx, in_rx) = channel();
        let (out_tx, out_rx) = channel::<u32>();
        drop(out_rx);
        let handle = spawn_stage(MapStage::new(|x: u32| x), in_rx, out_tx);

        in_tx.send(1).await.unwrap();
        in_tx.close();

        match handle.join().await {
            Err(Error::Pipeline(PipelineError::DownstreamClosed { stage })) => {
                assert_eq!(stage, "map");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn aborted_stage_reports_abort() {
        let (_in_tx, in_rx) = channel::<u32>();
        let (out_tx, _out_rx) = channel::<u32>();
        let handle = spawn_stage(MapStage::new(|x: u32| x), in_rx, out_tx);
        handle.abort();

        assert!(matches!(
            handle.join().await,
            Err(Error::Pipeline(PipelineError::StageAborted { stage: "map", .. }))
        ));
    }
}
