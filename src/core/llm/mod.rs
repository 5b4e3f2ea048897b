mod base;
pub mod gemini;
pub mod openai;
pub mod prompt;
pub mod sse;

pub use base::{BaseLLM, LLMConfig, LLMError, LLMResult, TokenStream};
pub use gemini::GeminiLLM;
pub use openai::OpenAiLLM;
pub use prompt::{ChatTurn, build_prompt};

/// Factory function to create a text-generation provider.
///
/// # Supported Providers
///
/// - `"openai"` - Any OpenAI-compatible chat completions endpoint
/// - `"gemini"` - Google Gemini `streamGenerateContent`
pub fn create_llm_provider(provider_type: &str, config: LLMConfig) -> LLMResult<Box<dyn BaseLLM>> {
    match provider_type.to_lowercase().as_str() {
        "openai" => Ok(Box::new(OpenAiLLM::new(config)?)),
        "gemini" => Ok(Box::new(GeminiLLM::new(config)?)),
        _ => Err(LLMError::InvalidConfiguration(format!(
            "Unsupported LLM provider: {provider_type}. Supported providers: openai, gemini"
        ))),
    }
}
