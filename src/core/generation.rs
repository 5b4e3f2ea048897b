//! Turn generation registry
//!
//! Every connection owns one [`GenerationRegistry`]. Minting a new generation is
//! the only cancellation mechanism in the pipeline: in-flight recognition,
//! generation and synthesis calls are never aborted, they simply discover on
//! their next check that the generation they captured is no longer current and
//! drop their results.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque, strictly increasing identifier of one unit of work on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// Holds the current generation for a connection.
///
/// Reads and writes are single atomic operations, so the registry can be shared
/// by the connection loop, the turn producer, the synthesis worker and the
/// watchdog without any lock.
#[derive(Debug, Default)]
pub struct GenerationRegistry {
    current: AtomicU64,
}

impl GenerationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replaces the current generation with a fresh, greater one.
    pub fn begin_new_generation(&self) -> Generation {
        Generation(self.current.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Mints a new generation and binds it to this registry.
    pub fn begin(self: &Arc<Self>) -> GenerationGuard {
        let generation = self.begin_new_generation();
        GenerationGuard {
            registry: Arc::clone(self),
            generation,
        }
    }

    pub fn current(&self) -> Generation {
        Generation(self.current.load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_current(&self, generation: Generation) -> bool {
        self.current.load(Ordering::Acquire) == generation.0
    }
}

/// A generation captured at the start of a unit of work.
///
/// Once [`GenerationGuard::is_current`] returns `false` it never returns `true`
/// again, because generations are never reused.
#[derive(Debug, Clone)]
pub struct GenerationGuard {
    registry: Arc<GenerationRegistry>,
    generation: Generation,
}

impl GenerationGuard {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    #[inline]
    pub fn is_current(&self) -> bool {
        self.registry.is_current(self.generation)
    }
}

impl PartialEq for GenerationGuard {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.registry, &other.registry) && self.generation == other.generation
    }
}
