use std::env;
use std::str::FromStr;

use super::ServerConfig;
use super::utils::{parse_bool, parse_duration_ms};
use super::yaml::YamlConfig;

/// Read and parse a numeric environment variable, naming the variable on failure
fn env_number<T>(key: &str) -> Result<Option<T>, Box<dyn std::error::Error>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid {key} environment variable: {e}").into()),
        Err(_) => Ok(None),
    }
}

/// Read a duration-in-milliseconds environment variable ("600", "600ms", "2s")
fn env_duration_ms(key: &str) -> Result<Option<u64>, Box<dyn std::error::Error>> {
    match env::var(key) {
        Ok(raw) => parse_duration_ms(&raw)
            .map(Some)
            .ok_or_else(|| format!("Invalid {key} environment variable: {raw}").into()),
        Err(_) => Ok(None),
    }
}

/// Merge YAML configuration with environment variables
///
/// Priority order (highest to lowest):
/// 1. Environment variables
/// 2. YAML configuration values
/// 3. Default values
///
/// # Arguments
/// * `yaml_config` - Optional YAML configuration providing base values
///
/// # Returns
/// * `Result<ServerConfig, Box<dyn std::error::Error>>` - The merged configuration or an error
pub fn merge_config(
    yaml_config: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let yaml = yaml_config.unwrap_or_default();
    let defaults = ServerConfig::default();

    // Helper macro to get value with priority: ENV > YAML > Default
    macro_rules! get_value {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            env::var($env_var)
                .ok()
                .or($yaml_value)
                .unwrap_or($default)
        };
    }

    // Helper macro for optional values: ENV > YAML
    macro_rules! get_optional {
        ($env_var:expr, $yaml_value:expr) => {
            env::var($env_var)
                .ok()
                .or($yaml_value)
                .filter(|v: &String| !v.is_empty())
        };
    }

    let server = yaml.server.unwrap_or_default();
    let auth = yaml.auth.unwrap_or_default();
    let stt = yaml.stt.unwrap_or_default();
    let tts = yaml.tts.unwrap_or_default();
    let llm = yaml.llm.unwrap_or_default();
    let turn = yaml.turn.unwrap_or_default();

    // Server configuration
    let host = get_value!("HOST", server.host, defaults.host);
    let port = env_number::<u16>("PORT")?
        .or(server.port)
        .unwrap_or(defaults.port);

    // Authentication
    let access_token = get_optional!("AUTH_ACCESS_TOKEN", auth.access_token);
    let auth_required = match env::var("AUTH_REQUIRED") {
        Ok(raw) => parse_bool(&raw)
            .ok_or_else(|| format!("Invalid AUTH_REQUIRED environment variable: {raw}"))?,
        Err(_) => auth.required.unwrap_or(defaults.auth_required),
    };

    // Recognition
    let stt_provider = get_value!("STT_PROVIDER", stt.provider, defaults.stt_provider);
    let stt_url = get_value!("STT_URL", stt.url, defaults.stt_url);
    let stt_language = get_value!("STT_LANGUAGE", stt.language, defaults.stt_language);
    let stt_timeout_seconds = env_number::<u64>("STT_TIMEOUT_SECONDS")?
        .or(stt.timeout_seconds)
        .unwrap_or(defaults.stt_timeout_seconds);

    // Synthesis
    let tts_provider = get_value!("TTS_PROVIDER", tts.provider, defaults.tts_provider);
    let tts_url = get_value!("TTS_URL", tts.url, defaults.tts_url);
    let tts_sentence_timeout_ms = env_duration_ms("TTS_SENTENCE_TIMEOUT_MS")?
        .or(tts.sentence_timeout_ms)
        .unwrap_or(defaults.tts_sentence_timeout_ms);
    let tts_filler_timeout_ms = env_duration_ms("TTS_FILLER_TIMEOUT_MS")?
        .or(tts.filler_timeout_ms)
        .unwrap_or(defaults.tts_filler_timeout_ms);

    // Generation
    let llm_provider = get_value!("LLM_PROVIDER", llm.provider, defaults.llm_provider);
    let llm_url = get_value!("LLM_URL", llm.url, defaults.llm_url);
    let llm_model = get_value!("LLM_MODEL", llm.model, defaults.llm_model);
    let llm_api_key = get_optional!("LLM_API_KEY", llm.api_key);
    let assistant_name = get_value!("ASSISTANT_NAME", llm.assistant_name, defaults.assistant_name);

    // Turn timing
    let filler_phrase = get_value!("FILLER_PHRASE", turn.filler_phrase, defaults.filler_phrase);
    let latency_mask_ms = env_duration_ms("LATENCY_MASK_MS")?
        .or(turn.latency_mask_ms)
        .unwrap_or(defaults.latency_mask_ms);

    Ok(ServerConfig {
        host,
        port,
        access_token,
        auth_required,
        stt_provider,
        stt_url,
        stt_language,
        stt_timeout_seconds,
        tts_provider,
        tts_url,
        tts_sentence_timeout_ms,
        tts_filler_timeout_ms,
        llm_provider,
        llm_url,
        llm_model,
        llm_api_key,
        assistant_name,
        filler_phrase,
        latency_mask_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::yaml::{AuthYaml, LlmYaml, ServerYaml, TurnYaml};
    use serial_test::serial;

    fn cleanup_env_vars() {
        for key in [
            "HOST",
            "PORT",
            "AUTH_ACCESS_TOKEN",
            "AUTH_REQUIRED",
            "LLM_PROVIDER",
            "LLM_API_KEY",
            "LATENCY_MASK_MS",
            "TTS_FILLER_TIMEOUT_MS",
        ] {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    #[test]
    #[serial]
    fn test_merge_defaults_only() {
        cleanup_env_vars();
        let config = merge_config(None).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.llm_provider, "openai");
        assert!(config.access_token.is_none());
        assert!(!config.auth_required);
    }

    #[test]
    #[serial]
    fn test_env_overrides_yaml() {
        cleanup_env_vars();
        let yaml = YamlConfig {
            server: Some(ServerYaml {
                host: Some("10.0.0.1".to_string()),
                port: Some(7000),
            }),
            llm: Some(LlmYaml {
                provider: Some("gemini".to_string()),
                api_key: Some("yaml-key".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        unsafe {
            env::set_var("PORT", "7100");
            env::set_var("LLM_API_KEY", "env-key");
        }

        let config = merge_config(Some(yaml)).unwrap();
        assert_eq!(config.host, "10.0.0.1");
        assert_eq!(config.port, 7100);
        assert_eq!(config.llm_provider, "gemini");
        assert_eq!(config.llm_api_key.as_deref(), Some("env-key"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_duration_suffixes_in_env() {
        cleanup_env_vars();
        let yaml = YamlConfig {
            turn: Some(TurnYaml {
                latency_mask_ms: Some(900),
                ..Default::default()
            }),
            ..Default::default()
        };
        unsafe {
            env::set_var("TTS_FILLER_TIMEOUT_MS", "2s");
        }

        let config = merge_config(Some(yaml)).unwrap();
        assert_eq!(config.latency_mask_ms, 900);
        assert_eq!(config.tts_filler_timeout_ms, 2000);

        unsafe {
            env::set_var("LATENCY_MASK_MS", "soon");
        }
        let err = merge_config(None).unwrap_err();
        assert!(err.to_string().contains("LATENCY_MASK_MS"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_invalid_port_and_auth_flag() {
        cleanup_env_vars();
        unsafe {
            env::set_var("PORT", "not-a-port");
        }
        assert!(merge_config(None).unwrap_err().to_string().contains("PORT"));

        unsafe {
            env::remove_var("PORT");
            env::set_var("AUTH_REQUIRED", "perhaps");
        }
        assert!(
            merge_config(None)
                .unwrap_err()
                .to_string()
                .contains("AUTH_REQUIRED")
        );
        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_empty_token_is_none() {
        cleanup_env_vars();
        let yaml = YamlConfig {
            auth: Some(AuthYaml {
                required: Some(true),
                access_token: Some(String::new()),
            }),
            ..Default::default()
        };
        let config = merge_config(Some(yaml)).unwrap();
        assert!(config.auth_required);
        assert!(config.access_token.is_none());
    }
}
