//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `speak` - One-shot synthesis REST API
//! - `ws` - WebSocket conversation sessions

pub mod api;
pub mod speak;
pub mod ws;

// Re-export commonly used handlers for convenient access
pub use ws::ws_voice_handler;
