use super::ServerConfig;
use super::merge::merge_config;
use super::validation::validate_config;

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Reads configuration from environment variables, with sensible defaults.
    /// Also loads from .env file if present using dotenvy.
    ///
    /// # Returns
    /// * `Result<Self, Box<dyn std::error::Error>>` - The loaded configuration or an error
    ///
    /// # Errors
    /// Returns an error if:
    /// - Environment variables are malformed
    /// - Configuration validation fails
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let config = merge_config(None)?;
        validate_config(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn cleanup_env_vars() {
        for key in [
            "HOST",
            "PORT",
            "AUTH_ACCESS_TOKEN",
            "AUTH_REQUIRED",
            "STT_URL",
            "FILLER_PHRASE",
            "ASSISTANT_NAME",
        ] {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    #[test]
    #[serial]
    fn test_from_env_values() {
        cleanup_env_vars();
        unsafe {
            env::set_var("HOST", "127.0.0.1");
            env::set_var("PORT", "8123");
            env::set_var("AUTH_ACCESS_TOKEN", "neural_link_secret");
            env::set_var("ASSISTANT_NAME", "Aria");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.address(), "127.0.0.1:8123");
        assert!(config.has_access_token());
        assert_eq!(config.turn_settings().assistant_name, "Aria");

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_auth_required_without_token() {
        cleanup_env_vars();
        unsafe {
            env::set_var("AUTH_REQUIRED", "true");
        }

        let err = ServerConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("AUTH_ACCESS_TOKEN"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_url() {
        cleanup_env_vars();
        unsafe {
            env::set_var("STT_URL", "localhost:9870");
        }

        assert!(ServerConfig::from_env().is_err());

        cleanup_env_vars();
    }
}
