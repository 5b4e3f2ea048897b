mod base;
pub mod http;

// Re-export public types and traits
pub use base::{BaseSTT, STTConfig, STTError};

pub use http::HttpSTT;

/// Supported STT providers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum STTProvider {
    /// Utterance recognizer behind a plain HTTP POST endpoint
    Http,
}

impl std::fmt::Display for STTProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            STTProvider::Http => write!(f, "http"),
        }
    }
}

impl std::str::FromStr for STTProvider {
    type Err = STTError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(STTProvider::Http),
            _ => Err(STTError::ConfigurationError(format!(
                "Unsupported STT provider: {s}. Supported providers: http"
            ))),
        }
    }
}

/// Factory function to create STT providers by name
///
/// # Arguments
/// * `provider` - The name of the STT provider (e.g., "http")
/// * `config` - Configuration for the STT provider
pub fn create_stt_provider(provider: &str, config: STTConfig) -> Result<Box<dyn BaseSTT>, STTError> {
    let provider_enum: STTProvider = provider.parse()?;

    match provider_enum {
        STTProvider::Http => Ok(Box::new(HttpSTT::new(config)?)),
    }
}

/// Get the names of all supported STT providers
pub fn get_supported_stt_providers() -> Vec<&'static str> {
    vec!["http"]
}
