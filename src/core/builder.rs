use std::sync::Arc;

use crate::core::{Config, Registry, application::Application};
use crate::hub::Hub;

/// Builder for constructing an [`Application`] with optional collaborators.
pub struct ApplicationBuilder {
    cfg: Config,
    hub: Option<Hub>,
    registry: Option<Arc<Registry>>,
}

impl ApplicationBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            hub: None,
            registry: None,
        }
    }

    /// Shares an existing hub instead of creating one from `cfg.hub_runner`.
    pub fn with_hub(mut self, hub: Hub) -> Self {
        self.hub = Some(hub);
        self
    }

    /// Shares an existing registry.
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Builds the application.
    ///
    /// When the `logging` feature is enabled, a [`LogWriter`](crate::LogWriter)
    /// is attached to the hub.
    pub fn build(self) -> Application {
        let hub = self
            .hub
            .unwrap_or_else(|| Hub::with_runner(self.cfg.hub_runner.runner()));
        let registry = self.registry.unwrap_or_else(Registry::new);

        #[cfg(feature = "logging")]
        if let Err(err) = crate::observers::LogWriter::new().attach(&hub) {
            tracing::warn!(error = %err, "log writer not attached");
        }

        Application::new_internal(self.cfg, hub, registry)
    }
}

impl std::fmt::Debug for ApplicationBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationBuilder")
            .field("cfg", &self.cfg)
            .field("hub", &self.hub.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::runners::RunnerKind;

    #[tokio::test]
    async fn test_builder_shares_hub() {
        let hub = Hub::new();
        let app = ApplicationBuilder::new(Config::default()).with_hub(hub.clone()).build();
        hub.publish("shared", vec![json!(1)]).await.unwrap();
        assert_eq!(app.hub().peek("shared", vec![]), vec![json!(1)]);
    }

    #[tokio::test]
    async fn test_builder_uses_configured_hub_runner() {
        let mut cfg = Config::default();
        cfg.hub_runner = RunnerKind::Sequence;
        let app = ApplicationBuilder::new(cfg).build();
        assert_eq!(app.hub().emitter().runner().name(), "sequence");
    }
}
