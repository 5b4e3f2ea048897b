//! Configuration module for the NeuralLink server
//!
//! This module handles server configuration from various sources: YAML files and
//! environment variables. Environment variables always override YAML values.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use neurallink::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::core::llm::LLMConfig;
use crate::core::stt::STTConfig;
use crate::core::tts::TTSConfig;
use crate::core::turn::TurnSettings;

mod env;
mod merge;
pub mod utils;
mod validation;
mod yaml;

pub use yaml::YamlConfig;

/// Server configuration
///
/// Contains all configuration needed to run the server:
/// - Server settings (host, port)
/// - Client authentication
/// - Recognition, synthesis and generation collaborators
/// - Turn timing (latency mask, filler phrase)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // Authentication
    pub access_token: Option<String>,
    pub auth_required: bool,

    // Recognition
    pub stt_provider: String,
    pub stt_url: String,
    pub stt_language: String,
    pub stt_timeout_seconds: u64,

    // Synthesis
    pub tts_provider: String,
    pub tts_url: String,
    pub tts_sentence_timeout_ms: u64,
    pub tts_filler_timeout_ms: u64,

    // Generation
    pub llm_provider: String,
    pub llm_url: String,
    pub llm_model: String,
    pub llm_api_key: Option<String>,
    pub assistant_name: String,

    // Turn timing
    pub filler_phrase: String,
    pub latency_mask_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            access_token: None,
            auth_required: false,
            stt_provider: "http".to_string(),
            stt_url: "http://127.0.0.1:9870/asr".to_string(),
            stt_language: "zh".to_string(),
            stt_timeout_seconds: 30,
            tts_provider: "http".to_string(),
            tts_url: "http://127.0.0.1:9880/tts".to_string(),
            tts_sentence_timeout_ms: 15_000,
            tts_filler_timeout_ms: 3_000,
            llm_provider: "openai".to_string(),
            llm_url: "http://127.0.0.1:11434".to_string(),
            llm_model: "qwen2.5:7b".to_string(),
            llm_api_key: None,
            assistant_name: "Xiaozhi".to_string(),
            filler_phrase: "嗯……".to_string(),
            latency_mask_ms: 600,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable overrides
    ///
    /// Priority order (highest to lowest):
    /// 1. Environment variables
    /// 2. YAML file values
    /// 3. Default values
    ///
    /// After loading and merging, performs validation on the final configuration.
    ///
    /// # Arguments
    /// * `path` - Path to the YAML configuration file
    ///
    /// # Returns
    /// * `Result<Self, Box<dyn std::error::Error>>` - The loaded configuration or an error
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // The .env file is not loaded here; only real environment variables override the file.
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate_config(&config)?;
        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether clients must present a matching access token
    pub fn has_access_token(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn stt_config(&self) -> STTConfig {
        STTConfig {
            provider: self.stt_provider.clone(),
            url: self.stt_url.clone(),
            language: self.stt_language.clone(),
            request_timeout: self.stt_timeout_seconds,
        }
    }

    /// The HTTP request timeout is the sentence timeout; the filler applies its own tighter bound.
    pub fn tts_config(&self) -> TTSConfig {
        TTSConfig {
            provider: self.tts_provider.clone(),
            url: self.tts_url.clone(),
            request_timeout_ms: self.tts_sentence_timeout_ms,
        }
    }

    pub fn llm_config(&self) -> LLMConfig {
        LLMConfig {
            provider: self.llm_provider.clone(),
            url: self.llm_url.clone(),
            model: self.llm_model.clone(),
            api_key: self.llm_api_key.clone(),
        }
    }

    pub fn turn_settings(&self) -> TurnSettings {
        TurnSettings {
            assistant_name: self.assistant_name.clone(),
            latency_mask: Duration::from_millis(self.latency_mask_ms),
            filler_phrase: self.filler_phrase.clone(),
            filler_timeout: Duration::from_millis(self.tts_filler_timeout_ms),
            sentence_timeout: Duration::from_millis(self.tts_sentence_timeout_ms),
        }
    }
}
