//! MindMate - HTTP gateway for the MindMate mental wellness API
//!
//! A thin gateway fronting a hosted relational store with built-in auth
//! (Supabase) and a generative-language service (Gemini). The gateway
//! maps REST routes onto those collaborators and applies a uniform
//! error envelope and CORS policy; it holds no state of its own.

pub mod config;
pub mod inference;
pub mod routes;
pub mod server;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{GatewayError, Result};
