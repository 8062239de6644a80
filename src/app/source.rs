//! Workload generation.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::request::{fill_template, Request};
use crate::config::SourceConfig;
use crate::domain::Message;
use crate::error::{ConfigError, Result};
use crate::pipeline::{Inlet, Outlet, Stage};

/// Picks names uniformly at random from a fixed list.
#[derive(Debug, Clone)]
pub struct NameGenerator {
    names: Vec<String>,
    rng: StdRng,
}

impl NameGenerator {
    /// Create a generator. Without a seed the RNG is seeded from entropy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `names` is empty.
    pub fn new(names: Vec<String>, seed: Option<u64>) -> std::result::Result<Self, ConfigError> {
        if names.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "source.names",
                reason: "must not be empty".into(),
            });
        }
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { names, rng })
    }

    pub fn next_name(&mut self) -> &str {
        let idx = self.rng.gen_range(0..self.names.len());
        &self.names[idx]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Head stage: waits for one trigger, then emits `count` requests.
pub struct GeneratorSource {
    count: usize,
    names: NameGenerator,
    destination_template: String,
    data_template: String,
}

impl GeneratorSource {
    pub fn new(
        count: usize,
        names: NameGenerator,
        destination_template: impl Into<String>,
        data_template: impl Into<String>,
    ) -> Self {
        Self {
            count,
            names,
            destination_template: destination_template.into(),
            data_template: data_template.into(),
        }
    }

    /// Build from the `[source]` section, using `seed` for name selection.
    pub fn from_config(
        config: &SourceConfig,
        seed: Option<u64>,
    ) -> std::result::Result<Self, ConfigError> {
        Ok(Self::new(
            config.messages,
            NameGenerator::new(config.names.clone(), seed)?,
            config.destination_template.clone(),
            config.data_template.clone(),
        ))
    }
}

#[async_trait]
impl Stage for GeneratorSource {
    type Input = ();
    type Output = Message<Request>;
    const NAME: &'static str = "generator_source";

    async fn serve(&mut self, input: Inlet<()>, output: Outlet<Message<Request>>) -> Result<()> {
        if input.recv().await.is_none() {
            debug!("Trigger channel closed before start, emitting nothing");
            output.close();
            return Ok(());
        }

        info!(count = self.count, "Generating messages");
        for seq in 0..self.count as u64 {
            let destination = fill_template(&self.destination_template, self.names.next_name());
            let request = Request::new(destination, self.data_template.clone());
            output.send(Message::new(seq, request)).await?;
        }

        output.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{channel, spawn_stage};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn empty_name_list_is_rejected() {
        assert!(matches!(
            NameGenerator::new(Vec::new(), Some(1)),
            Err(ConfigError::InvalidValue { field: "source.names", .. })
        ));
    }

    #[test]
    fn every_name_can_be_picked() {
        let mut generator = NameGenerator::new(names(&["Alice", "Bob", "Carol"]), Some(7)).unwrap();
        let picked: std::collections::HashSet<String> =
            (0..200).map(|_| generator.next_name().to_string()).collect();
        assert_eq!(picked.len(), 3);
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = NameGenerator::new(names(&["Alice", "Bob"]), Some(42)).unwrap();
        let mut b = NameGenerator::new(names(&["Alice", "Bob"]), Some(42)).unwrap();
        for _ in 0..20 {
            assert_eq!(a.next_name(), b.next_name());
        }
    }

    #[tokio::test]
    async fn emits_count_messages_after_trigger() {
        let source = GeneratorSource::new(
            3,
            NameGenerator::new(names(&["Alice"]), Some(1)).unwrap(),
            "http://localhost/?q={name}",
            "Hi, {name}",
        );
        let (trigger, input) = channel();
        let (output, results) = channel();
        let handle = spawn_stage(source, input, output);

        trigger.send(()).await.unwrap();
        let mut got = Vec::new();
        while let Some(m) = results.recv().await {
            got.push(m);
        }
        handle.join().await.unwrap();

        assert_eq!(got.iter().map(Message::seq).collect::<Vec<_>>(), vec![0, 1, 2]);
        for m in &got {
            assert_eq!(m.payload().destination, "http://localhost/?q=Alice");
            assert_eq!(m.payload().data_template, "Hi, {name}");
            assert!(m.outcome().is_pending());
        }
        trigger.close();
    }

    #[tokio::test]
    async fn closed_trigger_emits_nothing() {
        let source = GeneratorSource::new(
            5,
            NameGenerator::new(names(&["Alice"]), None).unwrap(),
            "http://localhost/",
            "",
        );
        let (trigger, input) = channel();
        let (output, results) = channel();
        let handle = spawn_stage(source, input, output);

        trigger.close();
        assert!(results.recv().await.is_none());
        handle.join().await.unwrap();
    }
}
