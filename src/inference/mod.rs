//! Generative-inference collaborator
//!
//! The gateway forwards prompt-shaped payloads to the hosted
//! generative-language service and relays the textual or lightly-structured
//! result without interpretation.

pub mod gemini;

pub use gemini::GeminiClient;
