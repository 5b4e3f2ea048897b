pub mod audio;
pub mod dispatch;
pub mod events;
pub mod extractor;
pub mod generation;
pub mod ingest;
pub mod llm;
pub mod mood;
pub mod segmenter;
pub mod state;
pub mod stt;
pub mod tts;
pub mod turn;
pub mod watchdog;

// Re-export commonly used types for convenience
pub use stt::{BaseSTT, STTConfig, STTError, STTProvider, create_stt_provider};

pub use tts::{BaseTTS, BoxedTTS, TTSConfig, TTSError, TTSResult, create_tts_provider};

pub use llm::{BaseLLM, LLMConfig, LLMError, LLMResult, TokenStream, create_llm_provider};

pub use events::{AudioFragment, TurnEvent, TurnEventSink};
pub use generation::{Generation, GenerationGuard, GenerationRegistry};
pub use turn::{TurnOutcome, TurnRequest, TurnSettings, run_turn};

// Re-export CoreState for external use
pub use state::CoreState;
