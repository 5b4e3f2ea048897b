use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Environment
/// variables can override any values specified here.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 8000
///
/// auth:
///   required: true
///   access_token: "neural_link_secret"
///
/// stt:
///   provider: "http"
///   url: "http://127.0.0.1:9870/asr"
///   language: "zh"
///   timeout_seconds: 30
///
/// tts:
///   provider: "http"
///   url: "http://127.0.0.1:9880/tts"
///   sentence_timeout_ms: 15000
///   filler_timeout_ms: 3000
///
/// llm:
///   provider: "openai"
///   url: "http://127.0.0.1:11434"
///   model: "qwen2.5:7b"
///   api_key: "sk-..."
///   assistant_name: "Xiaozhi"
///
/// turn:
///   filler_phrase: "嗯……"
///   latency_mask_ms: 600
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub auth: Option<AuthYaml>,
    pub stt: Option<SttYaml>,
    pub tts: Option<TtsYaml>,
    pub llm: Option<LlmYaml>,
    pub turn: Option<TurnYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Client authentication from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AuthYaml {
    pub required: Option<bool>,
    pub access_token: Option<String>,
}

/// Recognition collaborator from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SttYaml {
    pub provider: Option<String>,
    pub url: Option<String>,
    pub language: Option<String>,
    pub timeout_seconds: Option<u64>,
}

/// Synthesis collaborator from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TtsYaml {
    pub provider: Option<String>,
    pub url: Option<String>,
    pub sentence_timeout_ms: Option<u64>,
    pub filler_timeout_ms: Option<u64>,
}

/// Generation collaborator from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LlmYaml {
    pub provider: Option<String>,
    pub url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub assistant_name: Option<String>,
}

/// Turn timing from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TurnYaml {
    pub filler_phrase: Option<String>,
    pub latency_mask_ms: Option<u64>,
}

impl YamlConfig {
    /// Load YAML configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the YAML configuration file
    ///
    /// # Returns
    /// * `Result<Self, Box<dyn std::error::Error>>` - The parsed configuration or an error
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file {}: {e}", path.display()))?;
        Ok(config)
    }
}
