use applify_pipe::Pipe;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque configuration handed to a plugin by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginConfig(Value);

impl PluginConfig {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }
}

/// Contract every plugin exposes to the host composition root. Plugins talk
/// to each other only through the channels of the [`Pipe`].
#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
    async fn init(&self, config: PluginConfig, pipe: Pipe) -> anyhow::Result<()>;

    fn pipe(&self) -> Pipe;

    fn set_pipe(&self, pipe: Pipe);

    async fn run(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
