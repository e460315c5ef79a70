//! Stand-in provider
//!
//! Wraps a working provider and marks everything it returns, so output produced
//! on behalf of an unintegrated provider is never mistaken for the real thing.

use async_trait::async_trait;
use log::debug;

use crate::error::Result;
use crate::provider::{LlmProvider, LlmRequest, LlmResponse};

/// Provider that answers through `inner` and prefixes the text with `marker`
pub struct FallbackProvider {
    inner: Box<dyn LlmProvider>,
    marker: String,
    name: &'static str,
}

impl FallbackProvider {
    pub fn new(inner: Box<dyn LlmProvider>, marker: &str, name: &'static str) -> Self {
        Self {
            inner,
            marker: marker.to_string(),
            name,
        }
    }
}

#[async_trait]
impl LlmProvider for FallbackProvider {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        debug!("{}: delegating to {}", self.name, self.inner.name());

        let mut response = self.inner.complete(request).await?;
        response.content.insert_str(0, &self.marker);
        Ok(response)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
