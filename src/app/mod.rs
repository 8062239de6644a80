//! Demo application: generate requests, rate-limit them, and send them over
//! pooled HTTP connections.
//!
//! ```text
//! trigger -> generator_source -> rate_limiter -> template -> connection_pool -> stats_reporter
//! ```

mod http;
mod report;
mod request;
mod source;
mod template;

pub use http::{HttpConnection, HttpDialer};
pub use report::{StatsReporter, Summary};
pub use request::{fill_template, Request};
pub use source::{GeneratorSource, NameGenerator};
pub use template::TemplateStage;

use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::domain::Message;
use crate::error::{PipelineError, Result};
use crate::limiter::{new_rate_limiter, TimeSource};
use crate::pipeline::{channel, Pipeline, Stage};
use crate::pool::{ConnectionPool, Dialer, PoolStats};

/// What one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub summary: Summary,
    pub pool: PoolStats,
}

/// The wired demo pipeline.
pub struct App<D> {
    config: Config,
    dialer: D,
    time_source: Option<TimeSource>,
}

impl App<HttpDialer> {
    /// An app sending real HTTP requests.
    pub fn new(config: Config) -> Self {
        let dialer = HttpDialer::new(&config.transport);
        Self {
            config,
            dialer,
            time_source: None,
        }
    }
}

impl<D: Dialer<Request> + 'static> App<D> {
    /// Swap the transport.
    pub fn with_dialer<E: Dialer<Request> + 'static>(self, dialer: E) -> App<E> {
        App {
            config: self.config,
            dialer,
            time_source: self.time_source,
        }
    }

    /// Replace the rate limiter's clock.
    #[must_use]
    pub fn with_time_source(mut self, time_source: TimeSource) -> Self {
        self.time_source = Some(time_source);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the pipeline to completion.
    ///
    /// # Errors
    ///
    /// Returns a configuration error before any stage starts, or the most
    /// upstream stage failure once the run ends.
    pub async fn run(self) -> Result<RunReport> {
        let Self {
            config,
            dialer,
            time_source,
        } = self;
        config.validate()?;

        let source_seed = config.source.seed;
        let template_seed = source_seed.map(|s| s.wrapping_add(1));
        let source = GeneratorSource::from_config(&config.source, source_seed)?;
        let template = TemplateStage::new(NameGenerator::new(
            config.source.names.clone(),
            template_seed,
        )?);

        let mut limiter = new_rate_limiter::<Message<Request>>(&config.limiter)?;
        if let Some(time_source) = time_source {
            limiter = limiter.with_time_source(time_source);
        }

        let pool = ConnectionPool::new(config.pool.clone(), dialer)?;
        let monitor = pool.monitor();

        info!(
            messages = config.source.messages,
            rate = config.limiter.rate,
            max_connections = config.pool.max_connections,
            "Starting pipeline"
        );

        let (trigger, head) = channel::<()>();
        let (results, handle) = Pipeline::from_inlet(head)
            .pipe(source)
            .pipe(limiter)
            .pipe(template)
            .pipe(pool)
            .pipe(StatsReporter::new())
            .into_inlet();

        trigger.send(()).await?;
        trigger.close();

        let summary = results.recv().await;
        handle.join_all().await?;
        let summary = summary.ok_or_else(|| PipelineError::StageAborted {
            stage: StatsReporter::NAME,
            reason: "finished without a summary".into(),
        })?;

        Ok(RunReport {
            summary,
            pool: monitor.stats(),
        })
    }
}
