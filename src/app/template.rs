//! Request body templating.

use async_trait::async_trait;

use super::request::{fill_template, Request};
use super::source::NameGenerator;
use crate::domain::Message;
use crate::error::Result;
use crate::pipeline::{Inlet, Outlet, Stage};

/// Fills each request's body template with a generated name.
pub struct TemplateStage {
    names: NameGenerator,
}

impl TemplateStage {
    pub fn new(names: NameGenerator) -> Self {
        Self { names }
    }
}

#[async_trait]
impl Stage for TemplateStage {
    type Input = Message<Request>;
    type Output = Message<Request>;
    const NAME: &'static str = "template";

    async fn serve(
        &mut self,
        input: Inlet<Message<Request>>,
        output: Outlet<Message<Request>>,
    ) -> Result<()> {
        while let Some(mut message) = input.recv().await {
            let name = self.names.next_name();
            let request = message.payload_mut();
            request.templated_data = fill_template(&request.data_template, name);
            output.send(message).await?;
        }
        output.close();
        Ok(())
    }
}
