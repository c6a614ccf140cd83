//! Generation backend implementations.

use std::sync::Arc;

use tracing::info;

use crate::config::{BackendConfig, ConfigError};
use crate::interfaces::GenerationBackend;

pub mod anthropic;
pub mod scripted;

pub use anthropic::AnthropicBackend;
pub use scripted::{ScriptedBackend, ScriptedCall};

/// Initialize the generation backend based on configuration.
pub async fn init_backend(
    config: &BackendConfig,
) -> Result<Arc<dyn GenerationBackend>, Box<dyn std::error::Error>> {
    info!("Backend: {}", config.backend_type);

    match config.backend_type.as_str() {
        "anthropic" => Ok(Arc::new(AnthropicBackend::from_config(&config.anthropic)?)),
        "scripted" => {
            let backend = match &config.scripted.path {
                Some(path) => ScriptedBackend::from_file(path).await?,
                None => ScriptedBackend::new(Vec::new()),
            };
            Ok(Arc::new(backend))
        }
        other => Err(Box::new(ConfigError::UnknownType {
            kind: "backend",
            value: other.to_string(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_scripted_without_path() {
        let config = BackendConfig {
            backend_type: "scripted".to_string(),
            ..Default::default()
        };
        assert!(init_backend(&config).await.is_ok());
    }

    #[tokio::test]
    async fn test_init_unknown_backend_fails() {
        let config = BackendConfig {
            backend_type: "oracle".to_string(),
            ..Default::default()
        };
        let err = init_backend(&config).await.err().unwrap();
        assert_eq!(err.to_string(), "Unknown backend type: oracle");
    }
}
