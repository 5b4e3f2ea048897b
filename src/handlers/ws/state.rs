//! WebSocket connection state management
//!
//! One [`ConnectionState`] per socket. All fields use interior mutability so
//! the state can be shared by the read loop and the tasks it spawns without an
//! outer lock.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::core::generation::{GenerationGuard, GenerationRegistry};
use crate::core::ingest::AudioIngestBuffer;

pub struct ConnectionState {
    /// Unique identifier for this WebSocket session, used in logs
    pub session_id: String,
    authenticated: AtomicBool,
    generations: Arc<GenerationRegistry>,
    /// Never held across an await point
    audio: Mutex<AudioIngestBuffer>,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionState {
    pub fn new() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            authenticated: AtomicBool::new(false),
            generations: Arc::new(GenerationRegistry::new()),
            audio: Mutex::new(AudioIngestBuffer::new()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Acquire)
    }

    pub fn set_authenticated(&self) {
        self.authenticated.store(true, Ordering::Release);
    }

    pub fn generations(&self) -> &Arc<GenerationRegistry> {
        &self.generations
    }

    /// Start a new unit of work, invalidating everything in flight.
    pub fn begin_generation(&self) -> GenerationGuard {
        self.generations.begin()
    }

    /// Invalidate everything in flight without starting new work.
    pub fn invalidate(&self) {
        self.generations.begin_new_generation();
    }

    /// Run `f` with exclusive access to the utterance buffer.
    pub fn with_audio<R>(&self, f: impl FnOnce(&mut AudioIngestBuffer) -> R) -> R {
        f(&mut self.audio.lock())
    }
}
