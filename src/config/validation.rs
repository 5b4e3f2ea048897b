use super::ServerConfig;

/// Validate the fully merged configuration
pub fn validate_config(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    validate_collaborator_url("STT_URL", &config.stt_url)?;
    validate_collaborator_url("TTS_URL", &config.tts_url)?;
    validate_collaborator_url("LLM_URL", &config.llm_url)?;
    validate_timeouts(config)?;
    validate_turn_settings(config)?;
    validate_auth_required(config.auth_required, &config.access_token)?;
    Ok(())
}

/// Collaborator endpoints are plain HTTP(S) services
pub fn validate_collaborator_url(name: &str, url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if url.trim().is_empty() {
        return Err(format!("{name} cannot be empty").into());
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(format!("{name} must start with http:// or https://, got '{url}'").into());
    }
    Ok(())
}

fn validate_timeouts(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.stt_timeout_seconds == 0 {
        return Err("STT_TIMEOUT_SECONDS must be greater than zero".into());
    }
    if config.tts_sentence_timeout_ms == 0 {
        return Err("TTS_SENTENCE_TIMEOUT_MS must be greater than zero".into());
    }
    if config.tts_filler_timeout_ms == 0 {
        return Err("TTS_FILLER_TIMEOUT_MS must be greater than zero".into());
    }
    Ok(())
}

fn validate_turn_settings(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.latency_mask_ms == 0 {
        return Err("LATENCY_MASK_MS must be greater than zero".into());
    }
    if config.filler_phrase.trim().is_empty() {
        return Err("FILLER_PHRASE cannot be empty".into());
    }
    if config.assistant_name.trim().is_empty() {
        return Err("ASSISTANT_NAME cannot be empty".into());
    }
    Ok(())
}

/// Validate that when auth is required, an access token is configured
pub fn validate_auth_required(
    auth_required: bool,
    access_token: &Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !auth_required {
        return Ok(());
    }

    if access_token.as_deref().is_none_or(str::is_empty) {
        return Err("When AUTH_REQUIRED=true, AUTH_ACCESS_TOKEN must be configured".into());
    }

    Ok(())
}
